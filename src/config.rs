use crate::landing_control::LoopConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process level configuration, read from the environment at boot.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the MAV2Rest gateway.
    pub mav2rest_url: String,
    /// Listen address of the console endpoint.
    pub bind: String,
    pub settings_path: PathBuf,
    /// Marker detector executable, see `ProcessMarkerDetector`.
    pub detector_cmd: String,
    pub ffmpeg: String,
    pub loop_config: LoopConfig,
}

impl ServiceConfig {
    const DEFAULT_MAV2REST_URL: &'static str = "http://host.docker.internal:6040";
    const DEFAULT_BIND: &'static str = "0.0.0.0:8000";
    const DEFAULT_SETTINGS_PATH: &'static str = "/app/settings/precision-landing-settings.json";
    const DEFAULT_DETECTOR_CMD: &'static str = "apriltag-detect";
    const DEFAULT_FFMPEG: &'static str = "ffmpeg";
    /// Upper bound for the detector process on a single frame.
    pub const DETECTOR_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn from_env() -> Self {
        Self {
            mav2rest_url: var_or("MAV2REST_URL", Self::DEFAULT_MAV2REST_URL),
            bind: var_or("PRECLAND_BIND", Self::DEFAULT_BIND),
            settings_path: PathBuf::from(var_or("PRECLAND_SETTINGS_PATH", Self::DEFAULT_SETTINGS_PATH)),
            detector_cmd: var_or("PRECLAND_DETECTOR_CMD", Self::DEFAULT_DETECTOR_CMD),
            ffmpeg: var_or("PRECLAND_FFMPEG", Self::DEFAULT_FFMPEG),
            loop_config: LoopConfig::default(),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}
