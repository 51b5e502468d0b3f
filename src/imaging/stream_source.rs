use super::frame::Frame;
use super::frame_source::{FrameError, FrameSource, FrameStream};
use crate::{event, info, warn};
use async_trait::async_trait;
use futures::StreamExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;

/// Opens camera streams by locator.
///
/// `http(s)://` locators are treated as snapshot endpoints and polled with a
/// GET per frame. Everything else (`rtsp://`, files, devices) is handed to
/// `ffmpeg`, which grabs exactly one frame per call and exits.
pub struct StreamFrameSource {
    http: reqwest::Client,
    ffmpeg: String,
    probe_timeout: Duration,
}

impl StreamFrameSource {
    pub fn new(ffmpeg: &str, probe_timeout: Duration) -> Self {
        Self { http: reqwest::Client::new(), ffmpeg: ffmpeg.to_string(), probe_timeout }
    }

    pub(super) fn is_snapshot_locator(locator: &str) -> bool {
        locator.starts_with("http://") || locator.starts_with("https://")
    }
}

#[async_trait]
impl FrameSource for StreamFrameSource {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameStream>, FrameError> {
        if locator.trim().is_empty() {
            return Err(FrameError::OpenFailed(String::from("empty locator")));
        }
        let mut stream: Box<dyn FrameStream> = if Self::is_snapshot_locator(locator) {
            Box::new(SnapshotStream { http: self.http.clone(), url: locator.to_string() })
        } else {
            Box::new(FfmpegStream::new(&self.ffmpeg, locator))
        };
        // an open stream has to deliver at least one picture
        match stream.next_frame(self.probe_timeout).await {
            Ok(frame) => {
                info!("Opened {locator} ({})", frame.resolution());
                Ok(stream)
            }
            Err(err) => {
                stream.close().await;
                Err(FrameError::OpenFailed(err.to_string()))
            }
        }
    }
}

/// Polls a still image endpoint.
struct SnapshotStream {
    http: reqwest::Client,
    url: String,
}

impl SnapshotStream {
    async fn fetch(&self, timeout: Duration) -> Result<Vec<u8>, FrameError> {
        let response = self
            .http
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_reqwest(&e))?
            .error_for_status()
            .map_err(|e| FrameError::SourceLost(e.to_string()))?;

        let mut collected: Vec<u8> = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Self::map_reqwest(&e))?;
            collected.extend_from_slice(&chunk[..]);
        }
        Ok(collected)
    }

    fn map_reqwest(err: &reqwest::Error) -> FrameError {
        if err.is_timeout() { FrameError::Timeout } else { FrameError::SourceLost(err.to_string()) }
    }
}

#[async_trait]
impl FrameStream for SnapshotStream {
    async fn next_frame(&mut self, timeout: Duration) -> Result<Frame, FrameError> {
        let encoded = self.fetch(timeout).await?;
        Frame::decode(&encoded, Instant::now())
    }

    async fn close(self: Box<Self>) {}
}

/// Grabs single frames through an `ffmpeg` child process.
pub(super) struct FfmpegStream {
    ffmpeg: String,
    locator: String,
}

impl FfmpegStream {
    pub(super) fn new(ffmpeg: &str, locator: &str) -> Self {
        Self { ffmpeg: ffmpeg.to_string(), locator: locator.to_string() }
    }

    pub(super) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        if self.locator.starts_with("rtsp://") {
            cmd.args(["-rtsp_transport", "tcp"]);
        }
        cmd.args(["-i", &self.locator, "-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl FrameStream for FfmpegStream {
    async fn next_frame(&mut self, timeout: Duration) -> Result<Frame, FrameError> {
        let child = self.command().spawn().map_err(|e| {
            warn!("Could not launch {}: {e}", self.ffmpeg);
            FrameError::SourceLost(e.to_string())
        })?;
        // dropping the future on timeout kills the child
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| FrameError::Timeout)?
            .map_err(|e| FrameError::SourceLost(e.to_string()))?;
        let captured_at = Instant::now();

        if !output.status.success() || output.stdout.is_empty() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            event!("ffmpeg grab from {} failed: {reason}", self.locator);
            return Err(FrameError::SourceLost(if reason.is_empty() {
                format!("ffmpeg exited with {}", output.status)
            } else {
                reason
            }));
        }
        Frame::decode(&output.stdout, captured_at)
    }

    async fn close(self: Box<Self>) {}
}
