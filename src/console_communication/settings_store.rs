use crate::landing_control::{DetectionQuality, MarkerFamily, SettingsDraft, TargetFilter};
use crate::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Stream and optics of one camera type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CameraConfig {
    pub rtsp: String,
    #[serde(default)]
    pub horizontal_fov: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LastUsed {
    pub camera_type: String,
    pub rtsp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AprilTagSection {
    pub family: String,
    pub target_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MavlinkSection {
    pub flight_controller_sysid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetectionSection {
    pub quality: String,
    pub undistort: bool,
    pub attitude_gating: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct PrecisionLandingSection {
    pub enabled: bool,
}

/// Persisted form of the service settings.
///
/// Every section falls back to its default so files written by older
/// versions (cameras and enabled flag only) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SettingsDocument {
    #[serde(default = "default_cameras")]
    pub cameras: BTreeMap<String, CameraConfig>,
    #[serde(default)]
    pub last_used: LastUsed,
    #[serde(default)]
    pub apriltag: AprilTagSection,
    #[serde(default)]
    pub mavlink: MavlinkSection,
    #[serde(default)]
    pub detection: DetectionSection,
    #[serde(default)]
    pub precision_landing: PrecisionLandingSection,
}

const DEFAULT_CAMERA: &str = "siyi-a8";

fn default_cameras() -> BTreeMap<String, CameraConfig> {
    [
        ("siyi-a8", "rtsp://192.168.87.200:8554/main.264", 81.0),
        ("siyi-zr10", "rtsp://192.168.87.200:8554/main.264", 62.0),
        ("siyi-zt6-ir", "rtsp://192.168.87.200:8554/video1", 32.0),
        ("siyi-zt6-rgb", "rtsp://192.168.87.200:8554/video2", 85.0),
    ]
    .into_iter()
    .map(|(name, rtsp, horizontal_fov)| {
        (name.to_string(), CameraConfig { rtsp: rtsp.to_string(), horizontal_fov })
    })
    .collect()
}

impl Default for LastUsed {
    fn default() -> Self {
        Self {
            camera_type: DEFAULT_CAMERA.to_string(),
            rtsp: String::from("rtsp://192.168.87.200:8554/main.264"),
        }
    }
}

impl Default for AprilTagSection {
    fn default() -> Self {
        Self { family: MarkerFamily::Tag36h11.to_string(), target_id: TargetFilter::ANY_SENTINEL }
    }
}

impl Default for MavlinkSection {
    fn default() -> Self { Self { flight_controller_sysid: 1 } }
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            quality: DetectionQuality::Medium.to_string(),
            undistort: false,
            attitude_gating: false,
        }
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            cameras: default_cameras(),
            last_used: LastUsed::default(),
            apriltag: AprilTagSection::default(),
            mavlink: MavlinkSection::default(),
            detection: DetectionSection::default(),
            precision_landing: PrecisionLandingSection::default(),
        }
    }
}

impl SettingsDocument {
    /// Catalog entry of `camera_type`. Unknown types fall back to the default camera.
    pub(crate) fn camera(&self, camera_type: &str) -> CameraConfig {
        self.cameras
            .get(camera_type)
            .or_else(|| self.cameras.get(DEFAULT_CAMERA))
            .cloned()
            .or_else(|| default_cameras().remove(DEFAULT_CAMERA))
            .unwrap_or(CameraConfig { rtsp: String::new(), horizontal_fov: 0.0 })
    }

    /// Gives cameras stored without a usable field of view the cataloged one.
    fn fill_missing_fov(&mut self) {
        let catalog = default_cameras();
        let fallback = catalog.get(DEFAULT_CAMERA).map_or(0.0, |c| c.horizontal_fov);
        for (name, camera) in &mut self.cameras {
            if camera.horizontal_fov <= 0.0 {
                camera.horizontal_fov = catalog.get(name).map_or(fallback, |c| c.horizontal_fov);
            }
        }
    }

    /// Stores `rtsp` for `camera_type` and marks the camera as last used.
    pub(crate) fn remember_camera(&mut self, camera_type: &str, rtsp: &str) {
        let fov = self.camera(camera_type).horizontal_fov;
        self.cameras
            .entry(camera_type.to_string())
            .or_insert_with(|| CameraConfig { rtsp: String::new(), horizontal_fov: fov })
            .rtsp = rtsp.to_string();
        self.last_used = LastUsed { camera_type: camera_type.to_string(), rtsp: rtsp.to_string() };
    }

    /// Builds the unvalidated settings for a run with `camera_type`. A
    /// non-empty `rtsp` overrides the cataloged stream.
    pub(crate) fn draft(&self, camera_type: &str, rtsp: Option<&str>) -> SettingsDraft {
        let camera = self.camera(camera_type);
        let stream_locator = match rtsp.map(str::trim) {
            Some(locator) if !locator.is_empty() => locator.to_string(),
            _ => camera.rtsp,
        };
        SettingsDraft {
            camera_type: camera_type.to_string(),
            stream_locator,
            horizontal_fov_deg: camera.horizontal_fov,
            marker_family: self.apriltag.family.clone(),
            target_id: self.apriltag.target_id,
            detection_quality: self.detection.quality.clone(),
            undistort: self.detection.undistort,
            flight_controller_sysid: self.mavlink.flight_controller_sysid,
            attitude_gating: self.detection.attitude_gating,
            enabled: self.precision_landing.enabled,
        }
    }
}

#[derive(Debug)]
pub(crate) enum StoreError {
    Io(std::io::Error),
    Encode(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "settings file not writable: {err}"),
            StoreError::Encode(err) => write!(f, "settings not encodable: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self { StoreError::Io(value) }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self { StoreError::Encode(value) }
}

/// Json file backed settings, cached in memory.
pub(crate) struct SettingsStore {
    path: PathBuf,
    document: RwLock<SettingsDocument>,
}

impl SettingsStore {
    /// Reads `path`. A missing or unreadable file is replaced by the defaults.
    pub(crate) async fn load(path: &Path) -> Self {
        let document = match tokio::fs::read(path).await {
            Ok(raw) => match serde_json::from_slice::<SettingsDocument>(&raw) {
                Ok(mut document) => {
                    document.fill_missing_fov();
                    document
                }
                Err(err) => {
                    warn!("Settings file {} is unreadable ({err}), using defaults", path.display());
                    SettingsDocument::default()
                }
            },
            Err(err) => {
                info!("No settings at {} ({err}), creating defaults", path.display());
                SettingsDocument::default()
            }
        };
        if let Err(err) = Self::persist(path, &document).await {
            warn!("Could not write settings to {}: {err}", path.display());
        }
        Self { path: path.to_path_buf(), document: RwLock::new(document) }
    }

    async fn persist(path: &Path, document: &SettingsDocument) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(document)?).await?;
        Ok(())
    }

    pub(crate) async fn document(&self) -> SettingsDocument { self.document.read().await.clone() }

    /// Applies `change` and writes the result. The cached copy is updated even
    /// if writing fails.
    pub(crate) async fn update(
        &self,
        change: impl FnOnce(&mut SettingsDocument),
    ) -> Result<(), StoreError> {
        let mut document = self.document.write().await;
        change(&mut document);
        Self::persist(&self.path, &document).await
    }

    pub(crate) async fn resolve(&self, camera_type: &str, rtsp: Option<&str>) -> SettingsDraft {
        self.document.read().await.draft(camera_type, rtsp)
    }
}
