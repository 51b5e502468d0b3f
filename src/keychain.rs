use crate::config::ServiceConfig;
use crate::console_communication::{ConsoleMessenger, SettingsStore};
use crate::http_handler::MavlinkGateway;
use crate::http_handler::http_client::HTTPClient;
use crate::imaging::{ProcessMarkerDetector, StreamFrameSource};
use crate::landing_control::{AttitudeSource, Collaborators, LandingController, TargetSink};
use std::sync::Arc;

/// The long lived components of the service, wired together once at boot.
#[derive(Clone)]
pub struct Keychain {
    controller: Arc<LandingController>,
    con: Arc<ConsoleMessenger>,
}

impl Keychain {
    /// Builds every subsystem from `config`.
    ///
    /// # Errors
    /// Fails if the HTTP client for the gateway cannot be initialised.
    pub async fn new(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = Arc::new(HTTPClient::new(&config.mav2rest_url)?);
        let store = Arc::new(SettingsStore::load(&config.settings_path).await);
        let gateway =
            Arc::new(MavlinkGateway::new(Arc::clone(&client), config.loop_config.attitude_timeout));
        let collaborators = Collaborators {
            frames: Arc::new(StreamFrameSource::new(
                &config.ffmpeg,
                config.loop_config.frame_timeout,
            )),
            detector: Arc::new(ProcessMarkerDetector::new(
                &config.detector_cmd,
                ServiceConfig::DETECTOR_TIMEOUT,
            )),
            attitude: Arc::clone(&gateway) as Arc<dyn AttitudeSource>,
            sink: Arc::clone(&gateway) as Arc<dyn TargetSink>,
        };
        let controller = Arc::new(LandingController::new(collaborators, config.loop_config));
        let con = Arc::new(ConsoleMessenger::new(
            Arc::clone(&controller),
            store,
            Arc::clone(&gateway) as Arc<dyn TargetSink>,
            gateway.base_url(),
        ));
        Ok(Self { controller, con })
    }

    pub fn controller(&self) -> Arc<LandingController> { Arc::clone(&self.controller) }

    /// Provides a cloned reference to the console messenger.
    pub(crate) fn con(&self) -> Arc<ConsoleMessenger> { Arc::clone(&self.con) }
}
