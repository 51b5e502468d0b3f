use super::common::HTTPError;
use super::http_client::HTTPClient;
use super::http_request::landing_target_post::LandingTargetRequest;
use super::http_request::mount_orientation_get::MountOrientationRequest;
use super::http_request::request_common::{JSONBodyHTTPRequestType, NoBodyHTTPRequestType};
use super::http_response::response_common::ResponseError;
use crate::landing_control::{
    Attitude, AttitudeError, AttitudeSource, EmitError, LandingTargetMessage, TargetSink,
};
use crate::event;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Flight controller access through the mav2rest gateway.
///
/// Sends landing targets and reads the gimbal attitude of a vehicle.
pub(crate) struct MavlinkGateway {
    client: Arc<HTTPClient>,
    attitude_timeout: Duration,
}

impl MavlinkGateway {
    /// Component that publishes `MOUNT_ORIENTATION` (the autopilot).
    const MOUNT_COMPONENT_ID: u8 = 1;
    /// Attitude reports older than this no longer describe the gimbal.
    const MAX_ATTITUDE_AGE: TimeDelta = TimeDelta::seconds(1);

    pub(crate) fn new(client: Arc<HTTPClient>, attitude_timeout: Duration) -> Self {
        Self { client, attitude_timeout }
    }

    pub(crate) fn base_url(&self) -> &str { self.client.url() }
}

#[async_trait]
impl TargetSink for MavlinkGateway {
    async fn send_landing_target(
        &self,
        msg: &LandingTargetMessage,
        timeout: Duration,
    ) -> Result<(), EmitError> {
        let request = LandingTargetRequest::new(msg, Some(timeout));
        let reply = request.send_request(&self.client).await.map_err(emit_error)?;
        event!("mav2rest accepted LANDING_TARGET: {}", reply.trim());
        Ok(())
    }
}

#[async_trait]
impl AttitudeSource for MavlinkGateway {
    async fn attitude(&self, sysid: u8) -> Result<Attitude, AttitudeError> {
        let request = MountOrientationRequest {
            system_id: sysid,
            component_id: Self::MOUNT_COMPONENT_ID,
            timeout: self.attitude_timeout,
        };
        let orientation = request
            .send_request(&self.client)
            .await
            .map_err(|e| AttitudeError::Unavailable(e.to_string()))?;
        check_fresh(orientation.last_update(), Utc::now(), Self::MAX_ATTITUDE_AGE)?;
        Ok(Attitude {
            roll_deg: orientation.roll(),
            pitch_deg: orientation.pitch(),
            yaw_deg: orientation.yaw(),
        })
    }
}

/// Reports without a timestamp are taken as fresh.
pub(super) fn check_fresh(
    last_update: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age: TimeDelta,
) -> Result<(), AttitudeError> {
    match last_update {
        Some(stamp) if now - stamp > max_age => Err(AttitudeError::Stale),
        _ => Ok(()),
    }
}

pub(super) fn emit_error(err: HTTPError) -> EmitError {
    match err {
        HTTPError::HTTPResponseError(ResponseError::Timeout) => EmitError::Timeout,
        HTTPError::HTTPResponseError(ResponseError::BadRequest(reason)) => {
            EmitError::Rejected(reason)
        }
        HTTPError::HTTPResponseError(ResponseError::InternalServer) => {
            EmitError::Rejected(ResponseError::InternalServer.to_string())
        }
        other => EmitError::Unreachable(other.to_string()),
    }
}
