use crate::http_handler::http_response::response_common::SerdeJSONBodyHTTPResponseType;
use chrono::{DateTime, Utc};

#[derive(serde::Deserialize, Debug)]
pub struct MountOrientationResponse {
    message: MountOrientation,
    #[serde(default)]
    status: Option<MessageStatus>,
}

impl SerdeJSONBodyHTTPResponseType for MountOrientationResponse {}

impl MountOrientationResponse {
    pub fn roll(&self) -> f64 { f64::from(self.message.roll) }
    pub fn pitch(&self) -> f64 { f64::from(self.message.pitch) }
    pub fn yaw(&self) -> f64 { f64::from(self.message.yaw) }
    /// Time mav2rest last refreshed this message, if reported.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.status.as_ref().and_then(|s| s.time.last_update)
    }
}

/// Gimbal attitude, all angles in degrees.
#[derive(serde::Deserialize, Debug)]
struct MountOrientation {
    roll: f32,
    pitch: f32,
    yaw: f32,
}

#[derive(serde::Deserialize, Debug)]
struct MessageStatus {
    time: MessageTime,
}

#[derive(serde::Deserialize, Debug)]
struct MessageTime {
    #[serde(default)]
    last_update: Option<DateTime<Utc>>,
}
