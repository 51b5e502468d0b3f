use super::attitude_gate::AttitudeSource;
use super::controller_state::ControllerState;
use super::cycle_runner::{CycleOutcome, CycleRunner};
use super::errors::{CycleError, RunOnceError, StartAck, StartError, StopAck};
use super::failure_backoff::{BackoffDecision, FailureBackoff};
use super::loop_config::LoopConfig;
use super::pipeline::{CycleReport, Pipeline};
use super::settings::{Settings, SettingsDraft};
use super::target_emitter::{EmitCounters, TargetEmitter, TargetSink};
use crate::imaging::{FrameError, FrameSource, FrameStream, MarkerDetector};
use crate::{error, info, warn};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// External capabilities the landing loop is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub frames: Arc<dyn FrameSource>,
    pub detector: Arc<dyn MarkerDetector>,
    pub attitude: Arc<dyn AttitudeSource>,
    pub sink: Arc<dyn TargetSink>,
}

/// Consistent copy of the controller's externally visible state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: ControllerState,
    pub camera_type: Option<String>,
    pub last_cycle: Option<DateTime<Utc>>,
    pub last_error: Option<CycleError>,
    pub frames: u64,
    pub consecutive_failures: u32,
    pub emitted: u64,
    pub emit_failures: u64,
    pub emit_dropped: u64,
}

impl StatusSnapshot {
    fn idle() -> Self {
        Self {
            state: ControllerState::Idle,
            camera_type: None,
            last_cycle: None,
            last_error: None,
            frames: 0,
            consecutive_failures: 0,
            emitted: 0,
            emit_failures: 0,
            emit_dropped: 0,
        }
    }
}

enum Command {
    Start { settings: Settings, ack: oneshot::Sender<Result<StartAck, StartError>> },
    Stop,
}

enum LoopExit {
    Stopped,
    Faulted,
}

/// Handle to the precision landing loop.
///
/// All lifecycle changes are serialized through one control task, which is
/// the only writer of the state. Dropping the handle stops the loop.
pub struct LandingController {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<StatusSnapshot>,
    run_token: Arc<Mutex<CancellationToken>>,
    collaborators: Collaborators,
    config: LoopConfig,
}

impl LandingController {
    /// Spawns the control task. Must be called within a tokio runtime.
    pub fn new(collaborators: Collaborators, config: LoopConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::idle());
        let run_token = Arc::new(Mutex::new(CancellationToken::new()));
        let task = ControlTask {
            commands: cmd_rx,
            commands_open: true,
            status: status_tx,
            run_token: Arc::clone(&run_token),
            collaborators: collaborators.clone(),
            config,
            boot: Instant::now(),
        };
        tokio::spawn(task.run());
        Self { commands: cmd_tx, status: status_rx, run_token, collaborators, config }
    }

    /// Validates `draft`, opens the stream and starts the loop.
    ///
    /// Resolves once the loop is running or the start has failed.
    pub async fn start(&self, draft: &SettingsDraft) -> Result<StartAck, StartError> {
        let settings = Settings::validate(draft)?;
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(Command::Start { settings, ack: ack_tx })
            .map_err(|_| StartError::Aborted)?;
        ack_rx.await.unwrap_or(Err(StartError::Aborted))
    }

    /// Requests shutdown of the current run and returns without waiting for it.
    ///
    /// Idempotent. Use [`Self::subscribe`] to observe when `Idle` is reached.
    pub async fn stop(&self) -> StopAck {
        let was_active = self.status.borrow().state != ControllerState::Idle;
        self.run_token.lock().await.cancel();
        // a closed channel means the control task is gone and nothing runs
        let _ = self.commands.send(Command::Stop);
        StopAck { was_active }
    }

    pub fn status(&self) -> StatusSnapshot { self.status.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> { self.status.clone() }

    /// Runs a single detection cycle outside of the loop.
    ///
    /// Opens its own stream, never emits and leaves the controller state alone.
    pub async fn run_once(&self, draft: &SettingsDraft) -> Result<CycleReport, RunOnceError> {
        let settings = Settings::validate(draft)?;
        let timeout = self.config.frame_timeout;
        let mut stream = self.collaborators.frames.open(settings.stream_locator()).await?;
        let frame = tokio::time::timeout(timeout, stream.next_frame(timeout))
            .await
            .unwrap_or(Err(FrameError::Timeout));
        stream.close().await;
        let frame = frame?;

        let pipeline = Pipeline::new(
            &settings,
            Arc::clone(&self.collaborators.detector),
            Arc::clone(&self.collaborators.attitude),
        );
        let observations = pipeline.detect(&frame).await?;
        let evaluation = pipeline.evaluate(&frame, observations).await;
        info!(
            "Single cycle on {}: {} marker(s), target {:?}",
            settings.stream_locator(),
            evaluation.observations.len(),
            evaluation.target.as_ref().map(|t| t.marker_id())
        );
        Ok(CycleReport::new(frame, evaluation))
    }
}

struct ControlTask {
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    status: watch::Sender<StatusSnapshot>,
    run_token: Arc<Mutex<CancellationToken>>,
    collaborators: Collaborators,
    config: LoopConfig,
    boot: Instant,
}

impl ControlTask {
    async fn run(mut self) {
        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                Command::Start { settings, ack } => self.start_run(settings, ack).await,
                Command::Stop => self.settle_stop(),
            }
            if !self.commands_open {
                break;
            }
        }
        info!("Landing controller handle dropped, control task exits");
    }

    fn state(&self) -> ControllerState { self.status.borrow().state }

    fn transition(&self, next: ControllerState) {
        let current = self.state();
        if !current.can_transition_to(next) {
            error!("Rejected landing controller transition {current} -> {next}");
            return;
        }
        info!("Landing controller {current} -> {next}");
        self.status.send_modify(|s| s.state = next);
    }

    /// Stop while resting: only a faulted controller has anything to settle.
    fn settle_stop(&self) {
        if self.state() == ControllerState::Faulted {
            self.transition(ControllerState::Stopping);
            self.transition(ControllerState::Idle);
        }
    }

    async fn start_run(
        &mut self,
        settings: Settings,
        ack: oneshot::Sender<Result<StartAck, StartError>>,
    ) {
        if !self.state().accepts_start() {
            let _ = ack.send(Err(StartError::AlreadyRunning));
            return;
        }
        let token = CancellationToken::new();
        *self.run_token.lock().await = token.clone();
        self.status.send_modify(|s| {
            s.camera_type = Some(settings.camera_type().to_string());
            s.last_error = None;
            s.consecutive_failures = 0;
            s.frames = 0;
        });
        self.transition(ControllerState::Starting);
        info!(
            "Starting precision landing: camera {}, stream {}, marker {} {}",
            settings.camera_type(),
            settings.stream_locator(),
            settings.marker_family(),
            settings.target()
        );

        let open = open_with_retry(
            &self.collaborators.frames,
            settings.stream_locator(),
            &self.config,
            &token,
        );
        let opened = drive(open, &mut self.commands, &mut self.commands_open, &token).await;
        let stream = match opened {
            Ok(stream) if token.is_cancelled() => {
                stream.close().await;
                self.transition(ControllerState::Stopping);
                self.transition(ControllerState::Idle);
                let _ = ack.send(Err(StartError::Aborted));
                return;
            }
            Ok(stream) => stream,
            Err(FrameError::Cancelled) => {
                self.transition(ControllerState::Stopping);
                self.transition(ControllerState::Idle);
                let _ = ack.send(Err(StartError::Aborted));
                return;
            }
            Err(err) => {
                error!("Precision landing start failed: {err}");
                self.status.send_modify(|s| s.last_error = Some(CycleError::from(&err)));
                self.transition(ControllerState::Faulted);
                let _ = ack.send(Err(StartError::SourceUnavailable(err)));
                return;
            }
        };

        let pipeline = Pipeline::new(
            &settings,
            Arc::clone(&self.collaborators.detector),
            Arc::clone(&self.collaborators.attitude),
        );
        let emitter = TargetEmitter::new(
            Arc::clone(&self.collaborators.sink),
            settings.sysid(),
            self.config.emit_interval.max(self.config.cycle_period),
            self.config.emit_timeout,
            self.boot,
        );
        let mut runner = CycleRunner::new(
            Arc::clone(&self.collaborators.frames),
            settings.stream_locator(),
            stream,
            pipeline,
            emitter,
            self.config.frame_timeout,
        );
        self.transition(ControllerState::Running);
        let _ = ack.send(Ok(StartAck {
            camera_type: settings.camera_type().to_string(),
            stream_locator: settings.stream_locator().to_string(),
        }));

        match self.run_cycles(&mut runner, &token).await {
            LoopExit::Stopped => {
                self.transition(ControllerState::Stopping);
                runner.close().await;
                self.transition(ControllerState::Idle);
            }
            LoopExit::Faulted => {
                self.transition(ControllerState::Faulted);
                runner.close().await;
            }
        }
    }

    async fn run_cycles(&mut self, runner: &mut CycleRunner, token: &CancellationToken) -> LoopExit {
        let period = self.config.cycle_period;
        let mut backoff =
            FailureBackoff::new(period, self.config.max_backoff, self.config.max_consecutive_failures);
        let mut next_start = Instant::now();
        loop {
            if token.is_cancelled() {
                return LoopExit::Stopped;
            }
            let cycle = runner.run_cycle(token);
            let outcome = drive(cycle, &mut self.commands, &mut self.commands_open, token).await;
            match outcome {
                CycleOutcome::Cancelled => return LoopExit::Stopped,
                CycleOutcome::Completed(fault) => {
                    backoff.on_success();
                    self.publish_cycle(runner, fault, 0);
                    // an overrunning cycle starts its successor right away
                    next_start = (next_start + period).max(Instant::now());
                }
                CycleOutcome::FrameFailed(err) => {
                    let fault = CycleError::from(&err);
                    match backoff.on_failure() {
                        BackoffDecision::Exhausted => {
                            error!(
                                "{} consecutive frame failures, last: {err}",
                                backoff.consecutive()
                            );
                            self.publish_cycle(runner, Some(fault), backoff.consecutive());
                            return LoopExit::Faulted;
                        }
                        BackoffDecision::Retry(delay) => {
                            warn!(
                                "Frame failure {}/{}: {err}, retrying in {}ms",
                                backoff.consecutive(),
                                self.config.max_consecutive_failures,
                                delay.as_millis()
                            );
                            self.publish_cycle(runner, Some(fault), backoff.consecutive());
                            next_start = Instant::now() + delay;
                        }
                    }
                }
            }
            let pause = pause_until(next_start, token);
            drive(pause, &mut self.commands, &mut self.commands_open, token).await;
        }
    }

    fn publish_cycle(&self, runner: &CycleRunner, fault: Option<CycleError>, failures: u32) {
        let EmitCounters { sent, failed, dropped } = runner.emit_counters();
        self.status.send_modify(|s| {
            s.last_cycle = Some(Utc::now());
            if fault.is_some() {
                s.last_error = fault;
            }
            s.frames = runner.frame_count();
            s.consecutive_failures = failures;
            s.emitted = sent;
            s.emit_failures = failed;
            s.emit_dropped = dropped;
        });
    }
}

/// Polls `fut` to completion while answering lifecycle commands.
///
/// A competing start is refused and a stop cancels `token`. A closed command
/// channel is treated like a stop. Once `token` is cancelled commands stay
/// queued until the run has settled.
async fn drive<F: Future>(
    fut: F,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    commands_open: &mut bool,
    token: &CancellationToken,
) -> F::Output {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            biased;
            out = &mut fut => return out,
            cmd = commands.recv(), if *commands_open && !token.is_cancelled() => match cmd {
                Some(Command::Start { ack, .. }) => {
                    let _ = ack.send(Err(StartError::AlreadyRunning));
                }
                Some(Command::Stop) => token.cancel(),
                None => {
                    *commands_open = false;
                    token.cancel();
                }
            },
        }
    }
}

async fn pause_until(deadline: Instant, token: &CancellationToken) {
    tokio::select! {
        () = token.cancelled() => {},
        () = tokio::time::sleep_until(deadline) => {},
    }
}

async fn open_with_retry(
    frames: &Arc<dyn FrameSource>,
    locator: &str,
    config: &LoopConfig,
    token: &CancellationToken,
) -> Result<Box<dyn FrameStream>, FrameError> {
    let attempts = config.open_attempts.max(1);
    let mut last_err = FrameError::OpenFailed(format!("no attempt to open {locator}"));
    for attempt in 1..=attempts {
        if token.is_cancelled() {
            return Err(FrameError::Cancelled);
        }
        match frames.open(locator).await {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                warn!("Opening {locator} failed ({attempt}/{attempts}): {err}");
                last_err = err;
            }
        }
        if attempt < attempts {
            tokio::select! {
                () = token.cancelled() => return Err(FrameError::Cancelled),
                () = tokio::time::sleep(config.open_retry_delay) => {},
            }
        }
    }
    if token.is_cancelled() {
        return Err(FrameError::Cancelled);
    }
    Err(last_err)
}
