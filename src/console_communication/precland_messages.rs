use super::settings_store::{CameraConfig, SettingsDocument};
use crate::imaging::Observation;
use crate::landing_control::{ControllerState, CycleError, CycleReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `?type=<camera>&rtsp=<locator>`
#[derive(Debug, Deserialize)]
pub(crate) struct CameraQuery {
    #[serde(rename = "type")]
    pub camera_type: String,
    #[serde(default)]
    pub rtsp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnabledQuery {
    pub enabled: bool,
}

/// Query of `save-settings`. The detection tunables are optional so older
/// consoles that only know the first six keep working.
#[derive(Debug, Deserialize)]
pub(crate) struct SaveSettingsQuery {
    #[serde(rename = "type")]
    pub camera_type: String,
    pub rtsp: String,
    pub fov: f64,
    pub apriltag_family: String,
    pub tag_id: i64,
    pub flight_controller_sysid: i64,
    #[serde(default)]
    pub detection_quality: Option<String>,
    #[serde(default)]
    pub undistort: Option<bool>,
    #[serde(default)]
    pub attitude_gating: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BasicResponse {
    pub success: bool,
    pub message: String,
}

impl BasicResponse {
    pub(crate) fn ok(message: impl Into<String>) -> Self { Self { success: true, message: message.into() } }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EnabledResponse {
    pub success: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StatusResponse {
    pub success: bool,
    pub running: bool,
    pub state: ControllerState,
    pub message: String,
    pub last_error: Option<CycleError>,
    pub frames: u64,
    pub emitted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetectionEntry {
    pub tag_id: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub relative_size: f64,
}

impl From<&Observation> for DetectionEntry {
    fn from(obs: &Observation) -> Self {
        Self {
            tag_id: obs.marker_id(),
            center_x: obs.center_x(),
            center_y: obs.center_y(),
            relative_size: obs.relative_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetectionSummary {
    pub success: bool,
    pub detections: Vec<DetectionEntry>,
}

/// Angles of the selected target, degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TargetSummary {
    pub tag_id: u32,
    pub angle_x_deg: f64,
    pub angle_y_deg: f64,
}

/// Result of a single detection cycle run from the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TestResponse {
    pub success: bool,
    pub message: String,
    pub camera_type: String,
    pub rtsp_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub april_tag_detection: DetectionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSummary>,
}

impl TestResponse {
    pub(crate) fn from_report(camera_type: &str, rtsp_url: &str, report: &CycleReport) -> Self {
        let resolution = report.frame().resolution();
        let target = report.target().zip(report.angles()).map(|(obs, angles)| TargetSummary {
            tag_id: obs.marker_id(),
            angle_x_deg: angles.angle_x_deg(),
            angle_y_deg: angles.angle_y_deg(),
        });
        Self {
            success: true,
            message: format!("Stream connection successful ({resolution}). Method: {rtsp_url}"),
            camera_type: camera_type.to_string(),
            rtsp_url: rtsp_url.to_string(),
            image_base64: report.frame().encode_jpeg_base64().ok(),
            april_tag_detection: DetectionSummary {
                success: true,
                detections: report.observations().iter().map(DetectionEntry::from).collect(),
            },
            resolution: Some(resolution),
            target,
        }
    }

    pub(crate) fn failed(camera_type: &str, rtsp_url: &str, message: String) -> Self {
        Self {
            success: false,
            message,
            camera_type: camera_type.to_string(),
            rtsp_url: rtsp_url.to_string(),
            image_base64: None,
            april_tag_detection: DetectionSummary { success: false, detections: Vec::new() },
            resolution: None,
            target: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MavlinkTestResponse {
    pub success: bool,
    pub message: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SettingsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub document: SettingsDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CameraConfigsResponse {
    pub success: bool,
    pub cameras: BTreeMap<String, CameraConfig>,
}
