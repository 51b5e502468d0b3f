use super::console_endpoint::ConsoleEndpoint;
use super::console_messenger::ConsoleMessenger;
use super::precland_messages::{BasicResponse, EnabledResponse, MavlinkTestResponse, TestResponse};
use super::settings_store::{SettingsDocument, SettingsStore};
use crate::imaging::{
    DetectionError, DetectionParams, Frame, FrameError, FrameSource, FrameStream, MarkerDetector,
    Observation,
};
use crate::landing_control::{
    Attitude, AttitudeError, AttitudeSource, Collaborators, ControllerState, EmitError,
    LandingController, LandingTargetMessage, LoopConfig, Settings, TargetSink,
};
use async_trait::async_trait;
use image::RgbImage;
use rand::{Rng, rng};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

struct StillSource;

struct StillStream;

#[async_trait]
impl FrameSource for StillSource {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameStream>, FrameError> {
        if locator.contains("offline") {
            return Err(FrameError::OpenFailed(format!("{locator} unreachable")));
        }
        Ok(Box::new(StillStream))
    }
}

#[async_trait]
impl FrameStream for StillStream {
    async fn next_frame(&mut self, _timeout: Duration) -> Result<Frame, FrameError> {
        Ok(Frame::new(RgbImage::new(320, 240), Instant::now()))
    }

    async fn close(self: Box<Self>) {}
}

struct OneMarker;

#[async_trait]
impl MarkerDetector for OneMarker {
    async fn detect(
        &self,
        _frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Observation>, DetectionError> {
        let marker = Observation::new(0, (240.0, 120.0), 0.3);
        Ok(if params.target.accepts(marker.marker_id()) { vec![marker] } else { Vec::new() })
    }
}

struct Level;

#[async_trait]
impl AttitudeSource for Level {
    async fn attitude(&self, _sysid: u8) -> Result<Attitude, AttitudeError> {
        Ok(Attitude { roll_deg: 0.0, pitch_deg: -90.0, yaw_deg: 0.0 })
    }
}

#[derive(Default)]
struct Outbox(Mutex<Vec<LandingTargetMessage>>);

#[async_trait]
impl TargetSink for Outbox {
    async fn send_landing_target(
        &self,
        msg: &LandingTargetMessage,
        _timeout: Duration,
    ) -> Result<(), EmitError> {
        self.0.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

fn scratch_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("precland-test-{:016x}", rng().random::<u64>()))
        .join("precision-landing-settings.json")
}

async fn messenger(path: &PathBuf) -> (Arc<ConsoleMessenger>, Arc<Outbox>) {
    let outbox = Arc::new(Outbox::default());
    let controller = Arc::new(LandingController::new(
        Collaborators {
            frames: Arc::new(StillSource),
            detector: Arc::new(OneMarker),
            attitude: Arc::new(Level),
            sink: Arc::clone(&outbox) as Arc<dyn TargetSink>,
        },
        LoopConfig { open_retry_delay: Duration::from_millis(5), ..LoopConfig::default() },
    ));
    let store = Arc::new(SettingsStore::load(path).await);
    let sink = Arc::clone(&outbox) as Arc<dyn TargetSink>;
    let messenger = ConsoleMessenger::new(controller, store, sink, "http://mav2rest.test/mavlink");
    (Arc::new(messenger), outbox)
}

#[test]
fn test_default_cameras_resolve_to_valid_settings() {
    let document = SettingsDocument::default();
    for camera_type in ["siyi-a8", "siyi-zr10", "siyi-zt6-ir", "siyi-zt6-rgb"] {
        let draft = document.draft(camera_type, None);
        let settings = Settings::validate(&draft).unwrap();
        assert_eq!(settings.camera_type(), camera_type);
        assert!(settings.stream_locator().starts_with("rtsp://"));
    }
}

#[test]
fn test_stream_override_and_unknown_camera() {
    let mut document = SettingsDocument::default();
    let draft = document.draft("siyi-zt6-ir", Some(" rtsp://10.0.0.9:8554/ir "));
    assert_eq!(draft.stream_locator, "rtsp://10.0.0.9:8554/ir");
    assert!((draft.horizontal_fov_deg - 32.0).abs() < f64::EPSILON);
    assert_eq!(document.draft("siyi-zt6-ir", Some("")).stream_locator, "rtsp://192.168.87.200:8554/video1");

    let custom = document.draft("usb-cam", None);
    assert!((custom.horizontal_fov_deg - 81.0).abs() < f64::EPSILON);

    document.remember_camera("usb-cam", "/dev/video0");
    assert_eq!(document.cameras["usb-cam"].rtsp, "/dev/video0");
    assert_eq!(document.last_used.camera_type, "usb-cam");
    assert_eq!(document.draft("usb-cam", None).stream_locator, "/dev/video0");
}

#[tokio::test]
async fn test_store_creates_defaults_and_persists_updates() {
    let path = scratch_file();
    let store = SettingsStore::load(&path).await;
    assert_eq!(store.document().await, SettingsDocument::default());
    assert!(path.exists());

    store.update(|doc| doc.precision_landing.enabled = true).await.unwrap();
    let reloaded = SettingsStore::load(&path).await;
    assert!(reloaded.document().await.precision_landing.enabled);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_store_reads_legacy_and_broken_files() {
    let path = scratch_file();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let legacy = json!({
        "cameras": {
            "siyi-a8": {"rtsp": "rtsp://192.168.144.25:8554/main.264"},
            "siyi-zt6-ir": {"rtsp": "rtsp://192.168.144.25:8554/video1"}
        },
        "last_used": {"camera_type": "siyi-zt6-ir", "rtsp": "rtsp://192.168.144.25:8554/video1"},
        "precision_landing": {"enabled": true}
    });
    std::fs::write(&path, legacy.to_string()).unwrap();

    let document = SettingsStore::load(&path).await.document().await;
    assert!(document.precision_landing.enabled);
    assert_eq!(document.last_used.camera_type, "siyi-zt6-ir");
    assert!((document.cameras["siyi-zt6-ir"].horizontal_fov - 32.0).abs() < f64::EPSILON);
    assert_eq!(document.apriltag.target_id, -1);
    assert_eq!(document.mavlink.flight_controller_sysid, 1);

    std::fs::write(&path, "{ not json").unwrap();
    let document = SettingsStore::load(&path).await.document().await;
    assert_eq!(document, SettingsDocument::default());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_start_stop_toggle_enabled_flag() {
    let path = scratch_file();
    let (messenger, _) = messenger(&path).await;

    let started = messenger.start("siyi-zr10", Some("rtsp://10.1.1.1:8554/main.264")).await;
    assert!(started.success, "{}", started.message);
    assert!(messenger.status().running);
    let again = messenger.start("siyi-zr10", None).await;
    assert_eq!(again, BasicResponse::failed("Precision landing is already running"));

    let stored = SettingsStore::load(&path).await.document().await;
    assert!(stored.precision_landing.enabled);
    assert_eq!(stored.last_used.rtsp, "rtsp://10.1.1.1:8554/main.264");

    assert!(messenger.stop().await.success);
    assert!(!messenger.enabled_state().await.enabled);

    let failed = messenger.start("siyi-a8", Some("rtsp://offline/stream")).await;
    assert!(!failed.success);
    assert_eq!(messenger.status().state, ControllerState::Faulted);
    assert!(messenger.status().message.starts_with("Faulted"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_auto_start_when_enabled() {
    let path = scratch_file();
    {
        let store = SettingsStore::load(&path).await;
        store.update(|doc| doc.precision_landing.enabled = true).await.unwrap();
    }
    let (messenger, outbox) = messenger(&path).await;
    messenger.auto_start().await;

    tokio::time::timeout(Duration::from_secs(10), async {
        while !messenger.status().running {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!outbox.0.lock().unwrap().is_empty());

    messenger.stop().await;
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_save_settings_validates_first() {
    let path = scratch_file();
    let (messenger, outbox) = messenger(&path).await;
    let endpoint = ConsoleEndpoint::start("127.0.0.1:0", Arc::clone(&messenger)).await.unwrap();
    let base = format!("http://{}/precision-landing", endpoint.local_addr());
    let client = reqwest::Client::new();

    let rejected: BasicResponse = client
        .post(format!("{base}/save-settings"))
        .query(&[
            ("type", "siyi-a8"),
            ("rtsp", "rtsp://10.0.0.2:8554/main.264"),
            ("fov", "190"),
            ("apriltag_family", "tag36h11"),
            ("tag_id", "3"),
            ("flight_controller_sysid", "1"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!rejected.success);

    let saved: BasicResponse = client
        .post(format!("{base}/save-settings"))
        .query(&[
            ("type", "siyi-a8"),
            ("rtsp", "rtsp://10.0.0.2:8554/main.264"),
            ("fov", "75.5"),
            ("apriltag_family", "tag25h9"),
            ("tag_id", "3"),
            ("flight_controller_sysid", "2"),
            ("detection_quality", "high"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved, BasicResponse::ok("Settings saved for siyi-a8"));

    let settings: Value =
        client.post(format!("{base}/get-settings")).send().await.unwrap().json().await.unwrap();
    assert_eq!(settings["success"], true);
    assert_eq!(settings["cameras"]["siyi-a8"]["horizontal_fov"], 75.5);
    assert_eq!(settings["apriltag"], json!({"family": "tag25h9", "target_id": 3}));
    assert_eq!(settings["mavlink"]["flight_controller_sysid"], 2);
    assert_eq!(settings["detection"]["quality"], "high");

    let configs: Value =
        client.get(format!("{base}/camera-configs")).send().await.unwrap().json().await.unwrap();
    assert_eq!(configs["cameras"].as_object().map(serde_json::Map::len), Some(4));

    let probe: MavlinkTestResponse =
        client.post(format!("{base}/test-mavlink")).send().await.unwrap().json().await.unwrap();
    assert!(probe.success);
    assert_eq!(outbox.0.lock().unwrap().last().map(LandingTargetMessage::sysid), Some(2));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_console_routes_drive_the_controller() {
    let path = scratch_file();
    let (messenger, _) = messenger(&path).await;
    let endpoint = ConsoleEndpoint::start("127.0.0.1:0", Arc::clone(&messenger)).await.unwrap();
    let base = format!("http://{}/precision-landing", endpoint.local_addr());
    let client = reqwest::Client::new();

    let test: TestResponse = client
        .post(format!("{base}/test"))
        .query(&[("type", "siyi-a8"), ("rtsp", "rtsp://10.0.0.5:8554/main.264")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(test.success);
    assert_eq!(test.resolution.as_deref(), Some("320x240"));
    assert!(test.image_base64.is_some());
    assert_eq!(test.april_tag_detection.detections.len(), 1);
    assert_eq!(test.april_tag_detection.detections[0].tag_id, 0);
    assert!(test.target.is_some());

    let status: Value =
        client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(status["running"], false);
    assert_eq!(status["state"], "idle");

    let started: BasicResponse = client
        .post(format!("{base}/start"))
        .query(&[("type", "siyi-a8")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(started.success, "{}", started.message);

    let status: Value =
        client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(status["running"], true);
    assert_eq!(status["message"], "Running");

    let enabled: EnabledResponse = client
        .get(format!("{base}/get-enabled-state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(enabled.enabled);

    let stopped: BasicResponse =
        client.post(format!("{base}/stop")).send().await.unwrap().json().await.unwrap();
    assert!(stopped.success);

    let saved: BasicResponse = client
        .post(format!("{base}/save-enabled-state"))
        .query(&[("enabled", "true")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved, BasicResponse::ok("Enabled state saved: true"));

    drop(endpoint);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
