use super::angle_converter::GuidanceAngles;
use crate::{event, tgt, warn};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Content of one `LANDING_TARGET` message, independent of its wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingTargetMessage {
    time_usec: u64,
    target_num: u32,
    angle_x: f32,
    angle_y: f32,
    distance: Option<f32>,
    size_x: f32,
    size_y: f32,
    sysid: u8,
}

impl LandingTargetMessage {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        time_usec: u64,
        target_num: u32,
        angles: &GuidanceAngles,
        size: (f64, f64),
        sysid: u8,
    ) -> Self {
        Self {
            time_usec,
            target_num,
            angle_x: angles.angle_x() as f32,
            angle_y: angles.angle_y() as f32,
            distance: None,
            size_x: size.0 as f32,
            size_y: size.1 as f32,
            sysid,
        }
    }

    /// Probe message with a centered, zero sized target.
    pub fn probe(time_usec: u64, sysid: u8) -> Self {
        Self {
            time_usec,
            target_num: 0,
            angle_x: 0.0,
            angle_y: 0.0,
            distance: None,
            size_x: 0.0,
            size_y: 0.0,
            sysid,
        }
    }

    pub fn time_usec(&self) -> u64 { self.time_usec }
    pub fn target_num(&self) -> u32 { self.target_num }
    pub fn angle_x(&self) -> f32 { self.angle_x }
    pub fn angle_y(&self) -> f32 { self.angle_y }
    /// Range to the target, `None` when vision alone cannot tell.
    pub fn distance(&self) -> Option<f32> { self.distance }
    pub fn size_x(&self) -> f32 { self.size_x }
    pub fn size_y(&self) -> f32 { self.size_y }
    pub fn sysid(&self) -> u8 { self.sysid }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    Timeout,
    Rejected(String),
    Unreachable(String),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::Timeout => write!(f, "flight controller channel timed out"),
            EmitError::Rejected(reason) => write!(f, "message rejected: {reason}"),
            EmitError::Unreachable(reason) => write!(f, "channel unreachable: {reason}"),
        }
    }
}

impl std::error::Error for EmitError {}

/// Channel to the flight controller.
#[async_trait]
pub trait TargetSink: Send + Sync {
    async fn send_landing_target(
        &self,
        msg: &LandingTargetMessage,
        timeout: Duration,
    ) -> Result<(), EmitError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Sent,
    /// Dropped because the previous send is younger than the minimum interval.
    RateLimited,
    Failed(EmitError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitCounters {
    pub sent: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Formats guidance into landing target messages and sends them, rate limited.
pub struct TargetEmitter {
    sink: Arc<dyn TargetSink>,
    sysid: u8,
    min_interval: Duration,
    timeout: Duration,
    boot: Instant,
    last_attempt: Option<Instant>,
    counters: EmitCounters,
}

impl TargetEmitter {
    pub fn new(
        sink: Arc<dyn TargetSink>,
        sysid: u8,
        min_interval: Duration,
        timeout: Duration,
        boot: Instant,
    ) -> Self {
        Self { sink, sysid, min_interval, timeout, boot, last_attempt: None, counters: EmitCounters::default() }
    }

    pub fn counters(&self) -> EmitCounters { self.counters }

    /// Microseconds between service boot and `at`.
    pub fn time_since_boot_usec(boot: Instant, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(boot).as_micros()).unwrap_or(u64::MAX)
    }

    pub async fn emit(
        &mut self,
        angles: &GuidanceAngles,
        target_num: u32,
        size: (f64, f64),
    ) -> EmitOutcome {
        let now = Instant::now();
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.min_interval {
                self.counters.dropped += 1;
                event!("Landing target for marker {target_num} dropped by rate limit");
                return EmitOutcome::RateLimited;
            }
        }
        self.last_attempt = Some(now);

        let msg = LandingTargetMessage::new(
            Self::time_since_boot_usec(self.boot, angles.captured_at()),
            target_num,
            angles,
            size,
            self.sysid,
        );
        match self.sink.send_landing_target(&msg, self.timeout).await {
            Ok(()) => {
                self.counters.sent += 1;
                tgt!(
                    "LANDING_TARGET marker {target_num} -> sysid {}: angle_x={:.2}°, angle_y={:.2}°",
                    self.sysid,
                    angles.angle_x_deg(),
                    angles.angle_y_deg()
                );
                EmitOutcome::Sent
            }
            Err(err) => {
                self.counters.failed += 1;
                warn!("Failed to send LANDING_TARGET: {err}");
                EmitOutcome::Failed(err)
            }
        }
    }
}
