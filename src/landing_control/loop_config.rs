use std::time::Duration;

/// Timing and retry tunables of the landing loop.
///
/// Kept apart from [`super::Settings`]: these belong to the service, not to a
/// camera, and a run captures them once at construction of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    /// Fixed period between cycle starts.
    pub cycle_period: Duration,
    /// Upper bound for a single frame acquisition.
    pub frame_timeout: Duration,
    /// How often opening the stream is attempted before a start fails.
    pub open_attempts: u32,
    /// Pause between two failed open attempts.
    pub open_retry_delay: Duration,
    /// Minimum spacing of two landing target messages.
    pub emit_interval: Duration,
    /// Request timeout for one landing target message.
    pub emit_timeout: Duration,
    /// Request timeout for the gimbal attitude query.
    pub attitude_timeout: Duration,
    /// Cap of the exponential frame failure backoff.
    pub max_backoff: Duration,
    /// Consecutive frame failures after which the loop faults.
    pub max_consecutive_failures: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_millis(100),
            frame_timeout: Duration::from_secs(5),
            open_attempts: 3,
            open_retry_delay: Duration::from_secs(1),
            emit_interval: Duration::from_millis(100),
            emit_timeout: Duration::from_secs(5),
            attitude_timeout: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            max_consecutive_failures: 10,
        }
    }
}
