use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Fiducial families the detector can be asked to decode.
#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum MarkerFamily {
    #[strum(serialize = "tag36h11")]
    #[serde(rename = "tag36h11")]
    Tag36h11,
    #[strum(serialize = "tag25h9")]
    #[serde(rename = "tag25h9")]
    Tag25h9,
    #[strum(serialize = "tag16h5")]
    #[serde(rename = "tag16h5")]
    Tag16h5,
    #[strum(serialize = "tagCircle21h7")]
    #[serde(rename = "tagCircle21h7")]
    TagCircle21h7,
    #[strum(serialize = "tagStandard41h12")]
    #[serde(rename = "tagStandard41h12")]
    TagStandard41h12,
}

/// Speed/precision trade-off of the detector, expressed as quad decimation.
#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DetectionQuality {
    Low,
    Medium,
    High,
}

impl DetectionQuality {
    pub fn quad_decimate(self) -> f32 {
        match self {
            DetectionQuality::Low => 4.0,
            DetectionQuality::Medium => 2.0,
            DetectionQuality::High => 1.0,
        }
    }
}

/// Which markers are eligible as landing target.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TargetFilter {
    Any,
    Id(u32),
}

impl TargetFilter {
    /// Sentinel used by the persisted settings and the console for "any id".
    pub const ANY_SENTINEL: i64 = -1;

    pub fn accepts(self, marker_id: u32) -> bool {
        match self {
            TargetFilter::Any => true,
            TargetFilter::Id(id) => id == marker_id,
        }
    }

    pub fn raw(self) -> i64 {
        match self {
            TargetFilter::Any => Self::ANY_SENTINEL,
            TargetFilter::Id(id) => i64::from(id),
        }
    }
}

impl TryFrom<i64> for TargetFilter {
    type Error = SettingsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == Self::ANY_SENTINEL {
            return Ok(TargetFilter::Any);
        }
        u32::try_from(value).map(TargetFilter::Id).map_err(|_| SettingsError::InvalidTargetId(value))
    }
}

impl fmt::Display for TargetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFilter::Any => write!(f, "any"),
            TargetFilter::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Reasons a settings bundle is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    MissingCameraType,
    InvalidLocator(String),
    InvalidFieldOfView(f64),
    UnknownMarkerFamily(String),
    InvalidTargetId(i64),
    UnknownDetectionQuality(String),
    InvalidSystemId(i64),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::MissingCameraType => write!(f, "camera type must not be empty"),
            SettingsError::InvalidLocator(loc) => write!(f, "invalid stream locator {loc:?}"),
            SettingsError::InvalidFieldOfView(fov) => {
                write!(f, "horizontal field of view {fov} must lie in (0, 180) degrees")
            }
            SettingsError::UnknownMarkerFamily(fam) => write!(f, "unknown marker family {fam:?}"),
            SettingsError::InvalidTargetId(id) => {
                write!(f, "target id {id} must be -1 (any) or a non-negative marker id")
            }
            SettingsError::UnknownDetectionQuality(q) => {
                write!(f, "unknown detection quality {q:?}")
            }
            SettingsError::InvalidSystemId(id) => {
                write!(f, "flight controller system id {id} must lie in 1..=255")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Unvalidated settings as they arrive from the console or the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDraft {
    pub camera_type: String,
    pub stream_locator: String,
    pub horizontal_fov_deg: f64,
    pub marker_family: String,
    pub target_id: i64,
    pub detection_quality: String,
    pub undistort: bool,
    pub flight_controller_sysid: i64,
    pub attitude_gating: bool,
    pub enabled: bool,
}

/// Validated, immutable parameter bundle for one run of the landing loop.
///
/// Values of this type can only be obtained through [`Settings::validate`],
/// so every field downstream is known to be usable.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    camera_type: String,
    stream_locator: String,
    horizontal_fov_deg: f64,
    marker_family: MarkerFamily,
    target: TargetFilter,
    detection_quality: DetectionQuality,
    undistort: bool,
    sysid: u8,
    attitude_gating: bool,
    enabled: bool,
}

impl Settings {
    pub fn validate(draft: &SettingsDraft) -> Result<Settings, SettingsError> {
        let camera_type = draft.camera_type.trim();
        if camera_type.is_empty() {
            return Err(SettingsError::MissingCameraType);
        }
        let locator = draft.stream_locator.trim();
        if locator.is_empty() || locator.chars().any(char::is_whitespace) {
            return Err(SettingsError::InvalidLocator(draft.stream_locator.clone()));
        }
        let fov = draft.horizontal_fov_deg;
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            return Err(SettingsError::InvalidFieldOfView(fov));
        }
        let marker_family = MarkerFamily::from_str(draft.marker_family.trim())
            .map_err(|_| SettingsError::UnknownMarkerFamily(draft.marker_family.clone()))?;
        let target = TargetFilter::try_from(draft.target_id)?;
        let detection_quality = DetectionQuality::from_str(draft.detection_quality.trim())
            .map_err(|_| SettingsError::UnknownDetectionQuality(draft.detection_quality.clone()))?;
        let sysid = u8::try_from(draft.flight_controller_sysid)
            .ok()
            .filter(|id| *id != 0)
            .ok_or(SettingsError::InvalidSystemId(draft.flight_controller_sysid))?;

        Ok(Settings {
            camera_type: camera_type.to_string(),
            stream_locator: locator.to_string(),
            horizontal_fov_deg: fov,
            marker_family,
            target,
            detection_quality,
            undistort: draft.undistort,
            sysid,
            attitude_gating: draft.attitude_gating,
            enabled: draft.enabled,
        })
    }

    pub fn camera_type(&self) -> &str { &self.camera_type }
    pub fn stream_locator(&self) -> &str { &self.stream_locator }
    pub fn horizontal_fov_deg(&self) -> f64 { self.horizontal_fov_deg }
    pub fn marker_family(&self) -> MarkerFamily { self.marker_family }
    pub fn target(&self) -> TargetFilter { self.target }
    pub fn detection_quality(&self) -> DetectionQuality { self.detection_quality }
    pub fn undistort(&self) -> bool { self.undistort }
    pub fn sysid(&self) -> u8 { self.sysid }
    pub fn attitude_gating(&self) -> bool { self.attitude_gating }
    pub fn enabled(&self) -> bool { self.enabled }
}

impl From<&Settings> for SettingsDraft {
    fn from(value: &Settings) -> Self {
        SettingsDraft {
            camera_type: value.camera_type.clone(),
            stream_locator: value.stream_locator.clone(),
            horizontal_fov_deg: value.horizontal_fov_deg,
            marker_family: value.marker_family.to_string(),
            target_id: value.target.raw(),
            detection_quality: value.detection_quality.to_string(),
            undistort: value.undistort,
            flight_controller_sysid: i64::from(value.sysid),
            attitude_gating: value.attitude_gating,
            enabled: value.enabled,
        }
    }
}
