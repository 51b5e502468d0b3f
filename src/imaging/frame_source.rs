use super::frame::Frame;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No frame arrived within the requested timeout.
    Timeout,
    /// The stream broke down after it was opened.
    SourceLost(String),
    /// The stream could not be opened at all.
    OpenFailed(String),
    /// Bytes arrived but did not form a usable image.
    Decode(String),
    /// The wait was abandoned because the loop is shutting down.
    Cancelled,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Timeout => write!(f, "timed out waiting for a frame"),
            FrameError::SourceLost(reason) => write!(f, "stream lost: {reason}"),
            FrameError::OpenFailed(reason) => write!(f, "failed to open stream: {reason}"),
            FrameError::Decode(reason) => write!(f, "undecodable frame: {reason}"),
            FrameError::Cancelled => write!(f, "frame acquisition cancelled"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Opens video streams by locator.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameStream>, FrameError>;
}

/// An open stream. Owned by exactly one caller until closed.
#[async_trait]
pub trait FrameStream: Send {
    /// Pulls the next frame, waiting at most `timeout`.
    async fn next_frame(&mut self, timeout: Duration) -> Result<Frame, FrameError>;
    async fn close(self: Box<Self>);
}
