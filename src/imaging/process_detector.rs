use super::frame::Frame;
use super::marker_detector::{DetectionError, DetectionParams, MarkerDetector, Observation};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Delegates marker detection to an external executable.
///
/// The frame is written to the child's stdin as PNG. Parameters are passed as
/// arguments:
///
/// ```text
/// <program> --family tag36h11 --target-id -1 --decimate 2 [--undistort]
/// ```
///
/// The child answers on stdout with a json array of
/// `{"tag_id": 3, "center": [x, y], "corners": [[x, y], [x, y], [x, y], [x, y]]}`.
pub struct ProcessMarkerDetector {
    program: String,
    timeout: Duration,
}

#[derive(serde::Deserialize, Debug)]
struct RawDetection {
    tag_id: u32,
    center: [f64; 2],
    #[serde(default)]
    corners: Option<[[f64; 2]; 4]>,
}

impl ProcessMarkerDetector {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self { program: program.to_string(), timeout }
    }

    pub(super) fn command(&self, params: &DetectionParams) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--family")
            .arg(params.family.to_string())
            .arg("--target-id")
            .arg(params.target.raw().to_string())
            .arg("--decimate")
            .arg(params.quad_decimate.to_string());
        if params.undistort {
            cmd.arg("--undistort");
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        cmd
    }

    /// Parses the detector answer into observations scaled to `frame`.
    pub(super) fn parse(stdout: &[u8], frame: &Frame) -> Result<Vec<Observation>, DetectionError> {
        let raw: Vec<RawDetection> =
            serde_json::from_slice(stdout).map_err(|e| DetectionError::Malformed(e.to_string()))?;
        Ok(raw
            .into_iter()
            .map(|det| {
                let center = (det.center[0], det.center[1]);
                match det.corners {
                    Some(c) => Observation::from_corners(
                        det.tag_id,
                        center,
                        [(c[0][0], c[0][1]), (c[1][0], c[1][1]), (c[2][0], c[2][1]), (c[3][0], c[3][1])],
                        frame.width(),
                        frame.height(),
                    ),
                    None => Observation::new(det.tag_id, center, 0.0),
                }
            })
            .collect())
    }
}

#[async_trait]
impl MarkerDetector for ProcessMarkerDetector {
    async fn detect(
        &self,
        frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Observation>, DetectionError> {
        let png = frame.encode_png().map_err(|e| DetectionError::Failed(e.to_string()))?;
        let mut child = self
            .command(params)
            .spawn()
            .map_err(|e| DetectionError::Unavailable(format!("{}: {e}", self.program)))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DetectionError::Unavailable(String::from("no stdin pipe")))?;

        let exchange = async move {
            let feed = async move {
                stdin.write_all(&png).await?;
                stdin.shutdown().await
            };
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed.and(output)
        };
        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| DetectionError::Failed(String::from("detector timed out")))?
            .map_err(|e| DetectionError::Failed(e.to_string()))?;

        if !output.status.success() {
            return Err(DetectionError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Self::parse(&output.stdout, frame)
    }
}
