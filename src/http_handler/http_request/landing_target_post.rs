use super::landing_target::LandingTargetResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};
use crate::landing_control::LandingTargetMessage;
use std::time::Duration;

/// MAVLink component id of an onboard companion computer.
pub(crate) const MAV_COMP_ID_ONBOARD_COMPUTER: u8 = 191;

/// A `LANDING_TARGET` message as expected by the `/mavlink` endpoint of mav2rest.
#[derive(serde::Serialize, Debug)]
pub(crate) struct LandingTargetRequest {
    header: MavlinkHeader,
    message: LandingTargetBody,
    #[serde(skip)]
    timeout: Option<Duration>,
}

#[derive(serde::Serialize, Debug)]
struct MavlinkHeader {
    system_id: u8,
    component_id: u8,
    sequence: u8,
}

/// mav2rest wraps every MAVLink enum value as `{"type": "<NAME>"}`.
#[derive(serde::Serialize, Debug)]
struct MavEnum {
    #[serde(rename = "type")]
    name: &'static str,
}

#[derive(serde::Serialize, Debug)]
struct LandingTargetBody {
    #[serde(rename = "type")]
    msg_type: &'static str,
    time_usec: u64,
    target_num: u8,
    frame: MavEnum,
    angle_x: f32,
    angle_y: f32,
    distance: f32,
    size_x: f32,
    size_y: f32,
    x: f32,
    y: f32,
    z: f32,
    q: [f32; 4],
    position_type: MavEnum,
}

impl LandingTargetRequest {
    pub(crate) fn new(msg: &LandingTargetMessage, timeout: Option<Duration>) -> Self {
        Self {
            header: MavlinkHeader {
                system_id: msg.sysid(),
                component_id: MAV_COMP_ID_ONBOARD_COMPUTER,
                sequence: 0,
            },
            message: LandingTargetBody {
                msg_type: "LANDING_TARGET",
                time_usec: msg.time_usec(),
                // target_num is a single byte on the wire
                target_num: u8::try_from(msg.target_num()).unwrap_or(u8::MAX),
                frame: MavEnum { name: "MAV_FRAME_LOCAL_FRD" },
                angle_x: msg.angle_x(),
                angle_y: msg.angle_y(),
                distance: msg.distance().unwrap_or(0.0),
                size_x: msg.size_x(),
                size_y: msg.size_y(),
                x: 0.0,
                y: 0.0,
                z: 0.0,
                q: [1.0, 0.0, 0.0, 0.0],
                position_type: MavEnum { name: "LANDING_TARGET_TYPE_VISION_FIDUCIAL" },
            },
            timeout,
        }
    }
}

impl JSONBodyHTTPRequestType for LandingTargetRequest {
    type Body = LandingTargetRequest;
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for LandingTargetRequest {
    type Response = LandingTargetResponse;
    fn endpoint(&self) -> String { String::from("/mavlink") }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
    fn timeout(&self) -> Option<Duration> { self.timeout }
}
