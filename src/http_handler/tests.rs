use super::common::HTTPError;
use super::http_client::HTTPClient;
use super::http_request::landing_target_post::LandingTargetRequest;
use super::http_request::mount_orientation_get::MountOrientationRequest;
use super::http_request::request_common::{HTTPRequestMethod, HTTPRequestType};
use super::http_response::mount_orientation::MountOrientationResponse;
use super::http_response::response_common::ResponseError;
use super::mavlink_gateway::{check_fresh, emit_error};
use crate::landing_control::{AngleConverter, AttitudeError, EmitError, LandingTargetMessage};
use crate::imaging::Observation;
use chrono::{TimeDelta, Utc};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

fn sample_message(target_num: u32) -> LandingTargetMessage {
    let angles = AngleConverter::new(90.0).convert(
        640,
        480,
        &Observation::new(target_num, (480.0, 240.0), 0.2),
        Instant::now(),
    );
    LandingTargetMessage::new(1_500_000, target_num, &angles, (0.05, 0.04), 1)
}

#[test]
fn test_landing_target_body() {
    let request = LandingTargetRequest::new(&sample_message(5), Some(Duration::from_secs(1)));
    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(body["header"], json!({"system_id": 1, "component_id": 191, "sequence": 0}));
    let message = &body["message"];
    assert_eq!(message["type"], "LANDING_TARGET");
    assert_eq!(message["time_usec"], 1_500_000);
    assert_eq!(message["target_num"], 5);
    assert_eq!(message["frame"], json!({"type": "MAV_FRAME_LOCAL_FRD"}));
    assert_eq!(message["position_type"], json!({"type": "LANDING_TARGET_TYPE_VISION_FIDUCIAL"}));
    assert!((message["angle_x"].as_f64().unwrap() - 0.3927).abs() < 1e-4);
    assert_eq!(message["angle_y"], 0.0);
    assert_eq!(message["distance"], 0.0);
    assert_eq!(message["q"], json!([1.0, 0.0, 0.0, 0.0]));
    assert!(body.get("timeout").is_none());

    assert_eq!(request.endpoint(), "/mavlink");
    assert_eq!(request.request_method(), HTTPRequestMethod::Post);
}

#[test]
fn test_large_marker_id_saturates() {
    let request = LandingTargetRequest::new(&sample_message(4000), None);
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["message"]["target_num"], 255);
}

#[test]
fn test_mount_orientation_request() {
    let client = HTTPClient::new("http://host.docker.internal:6040/").unwrap();
    let request =
        MountOrientationRequest { system_id: 1, component_id: 1, timeout: Duration::from_millis(500) };
    assert_eq!(client.url(), "http://host.docker.internal:6040");
    let built = request.request_builder(&client).build().unwrap();
    assert_eq!(
        built.url().as_str(),
        "http://host.docker.internal:6040/mavlink/vehicles/1/components/1/messages/MOUNT_ORIENTATION"
    );
    assert_eq!(built.method(), &reqwest::Method::GET);
    assert_eq!(built.timeout(), Some(&Duration::from_millis(500)));
}

#[test]
fn test_mount_orientation_parsing() {
    let raw = json!({
        "message": {
            "type": "MOUNT_ORIENTATION",
            "time_boot_ms": 81_234,
            "roll": 0.4,
            "pitch": -88.5,
            "yaw": 12.0,
            "yaw_absolute": 0.0
        },
        "status": {
            "time": {
                "first_update": "2026-10-17T09:00:00.000Z",
                "last_update": "2026-10-17T09:12:30.250Z",
                "counter": 4711,
                "frequency": 10.0
            }
        }
    });
    let parsed: MountOrientationResponse = serde_json::from_value(raw).unwrap();
    assert!((parsed.pitch() + 88.5).abs() < 1e-6);
    assert!((parsed.yaw() - 12.0).abs() < 1e-6);
    assert!(parsed.last_update().is_some());

    let bare: MountOrientationResponse =
        serde_json::from_value(json!({"message": {"roll": 0.0, "pitch": -90.0, "yaw": 0.0}}))
            .unwrap();
    assert!(bare.last_update().is_none());
}

#[test]
fn test_attitude_staleness() {
    let now = Utc::now();
    let max_age = TimeDelta::seconds(1);
    assert_eq!(check_fresh(None, now, max_age), Ok(()));
    assert_eq!(check_fresh(Some(now - TimeDelta::milliseconds(300)), now, max_age), Ok(()));
    assert_eq!(
        check_fresh(Some(now - TimeDelta::seconds(3)), now, max_age),
        Err(AttitudeError::Stale)
    );
}

#[test]
fn test_emit_error_mapping() {
    assert_eq!(emit_error(HTTPError::from(ResponseError::Timeout)), EmitError::Timeout);
    assert_eq!(
        emit_error(HTTPError::from(ResponseError::BadRequest(String::from("unknown message")))),
        EmitError::Rejected(String::from("unknown message"))
    );
    assert!(matches!(
        emit_error(HTTPError::from(ResponseError::NoConnection)),
        EmitError::Unreachable(_)
    ));
}
