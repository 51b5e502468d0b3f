use super::settings::SettingsError;
use crate::imaging::{DetectionError, FrameError};
use serde::Serialize;
use std::fmt;

/// Acknowledgment of a successful start: the stream is open and the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StartAck {
    pub camera_type: String,
    pub stream_locator: String,
}

/// Acknowledgment of a stop request. Stopping never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopAck {
    /// `false` if nothing was active when the request arrived.
    pub was_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartError {
    AlreadyRunning,
    InvalidSettings(SettingsError),
    SourceUnavailable(FrameError),
    /// A stop request arrived while the stream was still being opened.
    Aborted,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::AlreadyRunning => write!(f, "precision landing is already running"),
            StartError::InvalidSettings(err) => write!(f, "invalid settings: {err}"),
            StartError::SourceUnavailable(err) => write!(f, "video source unavailable: {err}"),
            StartError::Aborted => write!(f, "start aborted by stop request"),
        }
    }
}

impl std::error::Error for StartError {}

impl From<SettingsError> for StartError {
    fn from(value: SettingsError) -> Self { StartError::InvalidSettings(value) }
}

/// Faults of the synchronous single cycle path, surfaced as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOnceError {
    InvalidSettings(SettingsError),
    Frame(FrameError),
    Detection(DetectionError),
}

impl fmt::Display for RunOnceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOnceError::InvalidSettings(err) => write!(f, "invalid settings: {err}"),
            RunOnceError::Frame(err) => write!(f, "frame capture failed: {err}"),
            RunOnceError::Detection(err) => write!(f, "marker detection failed: {err}"),
        }
    }
}

impl std::error::Error for RunOnceError {}

impl From<SettingsError> for RunOnceError {
    fn from(value: SettingsError) -> Self { RunOnceError::InvalidSettings(value) }
}

impl From<FrameError> for RunOnceError {
    fn from(value: FrameError) -> Self { RunOnceError::Frame(value) }
}

impl From<DetectionError> for RunOnceError {
    fn from(value: DetectionError) -> Self { RunOnceError::Detection(value) }
}

/// Per cycle faults absorbed by the loop and reported through the status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CycleError {
    CycleTimeout,
    SourceLost(String),
    SourceUnavailable(String),
    DetectionFailure(String),
    AttitudeUnavailable(String),
    EmitFailure(String),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::CycleTimeout => write!(f, "frame acquisition timed out"),
            CycleError::SourceLost(reason) => write!(f, "video source lost: {reason}"),
            CycleError::SourceUnavailable(reason) => write!(f, "video source unavailable: {reason}"),
            CycleError::DetectionFailure(reason) => write!(f, "marker detection failed: {reason}"),
            CycleError::AttitudeUnavailable(reason) => write!(f, "attitude unavailable: {reason}"),
            CycleError::EmitFailure(reason) => write!(f, "landing target not sent: {reason}"),
        }
    }
}

impl From<&FrameError> for CycleError {
    fn from(value: &FrameError) -> Self {
        match value {
            FrameError::Timeout => CycleError::CycleTimeout,
            FrameError::OpenFailed(reason) => CycleError::SourceUnavailable(reason.clone()),
            other => CycleError::SourceLost(other.to_string()),
        }
    }
}
