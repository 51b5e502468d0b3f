use super::attitude_gate::GateVerdict;
use super::errors::CycleError;
use super::pipeline::Pipeline;
use super::target_emitter::{EmitCounters, EmitOutcome, TargetEmitter};
use crate::imaging::{Frame, FrameError, FrameSource, FrameStream};
use crate::{event, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) enum CycleOutcome {
    /// A frame was processed. Carries a recoverable fault, if any occurred.
    Completed(Option<CycleError>),
    FrameFailed(FrameError),
    Cancelled,
}

/// State carried from one cycle of a run to the next. Owns the stream.
pub(crate) struct CycleRunner {
    frames: Arc<dyn FrameSource>,
    locator: String,
    stream: Option<Box<dyn FrameStream>>,
    pipeline: Pipeline,
    emitter: TargetEmitter,
    frame_timeout: Duration,
    frame_count: u64,
    delivery_warned: bool,
}

impl CycleRunner {
    /// Frames without a target between two "no marker" log lines.
    const NO_TARGET_LOG_EVERY: u64 = 10;

    pub(crate) fn new(
        frames: Arc<dyn FrameSource>,
        locator: &str,
        stream: Box<dyn FrameStream>,
        pipeline: Pipeline,
        emitter: TargetEmitter,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            frames,
            locator: locator.to_string(),
            stream: Some(stream),
            pipeline,
            emitter,
            frame_timeout,
            frame_count: 0,
            delivery_warned: false,
        }
    }

    pub(crate) fn frame_count(&self) -> u64 { self.frame_count }
    pub(crate) fn emit_counters(&self) -> EmitCounters { self.emitter.counters() }

    /// Waits for the next frame. Gives up with [`FrameError::Cancelled`] as
    /// soon as `token` fires.
    async fn acquire(&mut self, token: &CancellationToken) -> Result<Frame, FrameError> {
        let stream = match &mut self.stream {
            Some(stream) => stream,
            None => {
                let reopened = self.frames.open(&self.locator).await?;
                info!("Reopened video stream {}", self.locator);
                self.stream.insert(reopened)
            }
        };
        let timeout = self.frame_timeout;
        let result = tokio::select! {
            () = token.cancelled() => Err(FrameError::Cancelled),
            res = tokio::time::timeout(timeout, stream.next_frame(timeout)) => {
                res.unwrap_or(Err(FrameError::Timeout))
            }
        };
        if let Err(FrameError::SourceLost(reason)) = &result {
            warn!("Video stream {} lost ({reason}), reopening on next cycle", self.locator);
            self.close().await;
        }
        result
    }

    pub(crate) async fn run_cycle(&mut self, token: &CancellationToken) -> CycleOutcome {
        if token.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        let frame = match self.acquire(token).await {
            Ok(frame) => frame,
            Err(FrameError::Cancelled) => return CycleOutcome::Cancelled,
            Err(err) => return CycleOutcome::FrameFailed(err),
        };
        self.frame_count += 1;

        let mut fault = None;
        let observations = match self.pipeline.detect(&frame).await {
            Ok(observations) => observations,
            Err(err) => {
                warn!("Frame {}: detection failed, treating as empty: {err}", self.frame_count);
                fault = Some(CycleError::DetectionFailure(err.to_string()));
                Vec::new()
            }
        };

        let evaluation = self.pipeline.evaluate(&frame, observations).await;
        let Some(target) = &evaluation.target else {
            if self.frame_count % Self::NO_TARGET_LOG_EVERY == 0 {
                event!("Frame {}: no eligible marker detected", self.frame_count);
            }
            return CycleOutcome::Completed(fault);
        };

        if let Some(angles) = &evaluation.angles {
            // detection and gating may outlast a stop request
            if token.is_cancelled() {
                return CycleOutcome::Cancelled;
            }
            let size = self.pipeline.converter().angular_size(frame.width(), frame.height(), target);
            if let EmitOutcome::Failed(err) =
                self.emitter.emit(angles, target.marker_id(), size).await
            {
                if !self.delivery_warned {
                    warn!(
                        "LANDING_TARGET delivery failed ({err}), check the MAV2Rest connection to the flight controller"
                    );
                    self.delivery_warned = true;
                }
                fault = Some(CycleError::EmitFailure(err.to_string()));
            }
            return CycleOutcome::Completed(fault);
        }

        match evaluation.verdict {
            Some(GateVerdict::Unavailable(err)) => {
                event!("Frame {}: attitude unavailable, output suppressed", self.frame_count);
                CycleOutcome::Completed(Some(CycleError::AttitudeUnavailable(err.to_string())))
            }
            Some(GateVerdict::Denied(attitude)) => {
                event!(
                    "Frame {}: camera pitch {:.1}° not facing down, output suppressed",
                    self.frame_count,
                    attitude.pitch_deg
                );
                CycleOutcome::Completed(fault)
            }
            _ => CycleOutcome::Completed(fault),
        }
    }

    pub(crate) async fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.close().await;
        }
    }
}
