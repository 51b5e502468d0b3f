use super::precland_messages::{
    BasicResponse, CameraConfigsResponse, EnabledResponse, MavlinkTestResponse, SaveSettingsQuery,
    SettingsResponse, StatusResponse, TestResponse,
};
use super::settings_store::{SettingsDocument, SettingsStore};
use crate::landing_control::{
    ControllerState, LandingController, LandingTargetMessage, Settings, StartError, TargetSink,
};
use crate::{info, log, warn};
use std::sync::Arc;
use std::time::Duration;

/// Console facing operations of the service, independent of the transport.
pub(crate) struct ConsoleMessenger {
    controller: Arc<LandingController>,
    store: Arc<SettingsStore>,
    sink: Arc<dyn TargetSink>,
    mavlink_endpoint: String,
}

impl ConsoleMessenger {
    /// Upper bound for a console triggered test cycle.
    const TEST_TIMEOUT: Duration = Duration::from_secs(60);
    const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    pub(crate) fn new(
        controller: Arc<LandingController>,
        store: Arc<SettingsStore>,
        sink: Arc<dyn TargetSink>,
        mavlink_endpoint: &str,
    ) -> Self {
        Self { controller, store, sink, mavlink_endpoint: mavlink_endpoint.to_string() }
    }

    /// Resumes landing with the last used camera if it was enabled before shutdown.
    pub(crate) async fn auto_start(self: &Arc<Self>) {
        let document = self.store.document().await;
        if !document.precision_landing.enabled {
            return;
        }
        info!(
            "Precision landing was enabled, restarting with {} ({})",
            document.last_used.camera_type, document.last_used.rtsp
        );
        let messenger = Arc::clone(self);
        tokio::spawn(async move {
            let last = document.last_used;
            let response = messenger.start(&last.camera_type, Some(&last.rtsp)).await;
            if !response.success {
                warn!("Auto restart failed: {}", response.message);
            }
        });
    }

    pub(crate) async fn start(&self, camera_type: &str, rtsp: Option<&str>) -> BasicResponse {
        log!("Start requested for {camera_type} ({})", rtsp.unwrap_or("cataloged stream"));
        let draft = self.store.resolve(camera_type, rtsp).await;
        match self.controller.start(&draft).await {
            Ok(ack) => {
                let saved = self
                    .store
                    .update(|doc| {
                        doc.remember_camera(&ack.camera_type, &ack.stream_locator);
                        doc.precision_landing.enabled = true;
                    })
                    .await;
                if let Err(err) = saved {
                    warn!("Could not persist enabled state: {err}");
                }
                BasicResponse::ok(format!(
                    "Precision landing started successfully with {} camera",
                    ack.camera_type
                ))
            }
            Err(StartError::AlreadyRunning) => {
                BasicResponse::failed("Precision landing is already running")
            }
            Err(err) => BasicResponse::failed(format!("Failed to start: {err}")),
        }
    }

    pub(crate) async fn stop(&self) -> BasicResponse {
        let ack = self.controller.stop().await;
        if let Err(err) = self.store.update(|doc| doc.precision_landing.enabled = false).await {
            warn!("Could not persist enabled state: {err}");
        }
        if ack.was_active {
            BasicResponse::ok("Precision landing stopped successfully")
        } else {
            BasicResponse::ok("Precision landing was not running")
        }
    }

    pub(crate) fn status(&self) -> StatusResponse {
        let snapshot = self.controller.status();
        let message = match (snapshot.state, &snapshot.last_error) {
            (ControllerState::Running, _) => String::from("Running"),
            (ControllerState::Faulted, Some(err)) => format!("Faulted: {err}"),
            (ControllerState::Idle, _) => String::from("Stopped"),
            (state, _) => state.to_string(),
        };
        StatusResponse {
            success: true,
            running: snapshot.state.is_running(),
            state: snapshot.state,
            message,
            last_error: snapshot.last_error,
            frames: snapshot.frames,
            emitted: snapshot.emitted,
        }
    }

    pub(crate) async fn enabled_state(&self) -> EnabledResponse {
        let enabled = self.store.document().await.precision_landing.enabled;
        EnabledResponse { success: true, enabled }
    }

    pub(crate) async fn save_enabled_state(&self, enabled: bool) -> BasicResponse {
        match self.store.update(|doc| doc.precision_landing.enabled = enabled).await {
            Ok(()) => BasicResponse::ok(format!("Enabled state saved: {enabled}")),
            Err(err) => BasicResponse::failed(format!("Failed to save enabled state: {err}")),
        }
    }

    /// One detection cycle on the given camera, including a preview image.
    pub(crate) async fn test(&self, camera_type: &str, rtsp: Option<&str>) -> TestResponse {
        let draft = self.store.resolve(camera_type, rtsp).await;
        let locator = draft.stream_locator.clone();
        let outcome = tokio::time::timeout(Self::TEST_TIMEOUT, self.controller.run_once(&draft)).await;
        match outcome {
            Ok(Ok(report)) => {
                info!(
                    "Test on {camera_type} found {} marker(s) in {}",
                    report.observations().len(),
                    report.frame().resolution()
                );
                TestResponse::from_report(camera_type, &locator, &report)
            }
            Ok(Err(err)) => {
                warn!("Test on {camera_type} failed: {err}");
                TestResponse::failed(camera_type, &locator, format!("Test failed: {err}"))
            }
            Err(_) => TestResponse::failed(
                camera_type,
                &locator,
                format!(
                    "Test timed out - unable to connect to camera within {} seconds",
                    Self::TEST_TIMEOUT.as_secs()
                ),
            ),
        }
    }

    /// Sends a centered zero size landing target to the configured flight controller.
    pub(crate) async fn test_mavlink(&self) -> MavlinkTestResponse {
        let raw_sysid = self.store.document().await.mavlink.flight_controller_sysid;
        let Some(sysid) = u8::try_from(raw_sysid).ok().filter(|id| *id != 0) else {
            return MavlinkTestResponse {
                success: false,
                message: format!("Configured system id {raw_sysid} is invalid"),
                endpoint: self.mavlink_endpoint.clone(),
            };
        };
        let probe = LandingTargetMessage::probe(0, sysid);
        match self.sink.send_landing_target(&probe, Self::PROBE_TIMEOUT).await {
            Ok(()) => MavlinkTestResponse {
                success: true,
                message: format!(
                    "MAV2Rest API connection successful, test LANDING_TARGET sent to SysID {sysid}"
                ),
                endpoint: self.mavlink_endpoint.clone(),
            },
            Err(err) => {
                warn!("MAV2Rest connection test failed: {err}");
                MavlinkTestResponse {
                    success: false,
                    message: format!("MAV2Rest connected but test message failed: {err}"),
                    endpoint: self.mavlink_endpoint.clone(),
                }
            }
        }
    }

    pub(crate) async fn settings(&self) -> SettingsResponse {
        SettingsResponse { success: true, document: self.store.document().await }
    }

    /// Validates the new values as a complete settings bundle before storing them.
    pub(crate) async fn save_settings(&self, query: &SaveSettingsQuery) -> BasicResponse {
        let mut candidate = self.store.document().await;
        apply_query(&mut candidate, query);
        let draft = candidate.draft(&query.camera_type, None);
        if let Err(err) = Settings::validate(&draft) {
            return BasicResponse::failed(format!("Invalid settings: {err}"));
        }
        match self.store.update(|doc| apply_query(doc, query)).await {
            Ok(()) => BasicResponse::ok(format!("Settings saved for {}", query.camera_type)),
            Err(err) => BasicResponse::failed(format!("Failed to save some settings: {err}")),
        }
    }

    pub(crate) async fn camera_configs(&self) -> CameraConfigsResponse {
        CameraConfigsResponse { success: true, cameras: self.store.document().await.cameras }
    }
}

fn apply_query(doc: &mut SettingsDocument, query: &SaveSettingsQuery) {
    doc.remember_camera(&query.camera_type, &query.rtsp);
    if let Some(camera) = doc.cameras.get_mut(&query.camera_type) {
        camera.horizontal_fov = query.fov;
    }
    doc.apriltag.family = query.apriltag_family.clone();
    doc.apriltag.target_id = query.tag_id;
    doc.mavlink.flight_controller_sysid = query.flight_controller_sysid;
    if let Some(quality) = &query.detection_quality {
        doc.detection.quality = quality.clone();
    }
    if let Some(undistort) = query.undistort {
        doc.detection.undistort = undistort;
    }
    if let Some(gating) = query.attitude_gating {
        doc.detection.attitude_gating = gating;
    }
}
