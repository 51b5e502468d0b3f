use super::mount_orientation::MountOrientationResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};
use std::time::Duration;

/// Latest `MOUNT_ORIENTATION` message seen by mav2rest for one vehicle component.
#[derive(Debug)]
pub struct MountOrientationRequest {
    pub system_id: u8,
    pub component_id: u8,
    pub timeout: Duration,
}

impl NoBodyHTTPRequestType for MountOrientationRequest {}

impl HTTPRequestType for MountOrientationRequest {
    type Response = MountOrientationResponse;
    fn endpoint(&self) -> String {
        format!(
            "/mavlink/vehicles/{}/components/{}/messages/MOUNT_ORIENTATION",
            self.system_id, self.component_id
        )
    }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
    fn timeout(&self) -> Option<Duration> { Some(self.timeout) }
}
