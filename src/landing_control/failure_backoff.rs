use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackoffDecision {
    /// Wait this long, then try again.
    Retry(Duration),
    /// The consecutive failure budget is used up.
    Exhausted,
}

/// Exponential backoff for frame acquisition failures.
///
/// The first delay equals `base` and doubles with every further failure up to
/// `max`. Any success resets both the delay and the failure count.
#[derive(Debug, Clone)]
pub(crate) struct FailureBackoff {
    base: Duration,
    max: Duration,
    next_delay: Duration,
    consecutive: u32,
    budget: u32,
}

impl FailureBackoff {
    pub(crate) fn new(base: Duration, max: Duration, budget: u32) -> Self {
        Self { base, max: max.max(base), next_delay: base, consecutive: 0, budget: budget.max(1) }
    }

    pub(crate) fn on_failure(&mut self) -> BackoffDecision {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= self.budget {
            return BackoffDecision::Exhausted;
        }
        let delay = self.next_delay;
        self.next_delay = self.next_delay.saturating_mul(2).min(self.max);
        BackoffDecision::Retry(delay)
    }

    pub(crate) fn on_success(&mut self) {
        self.consecutive = 0;
        self.next_delay = self.base;
    }

    pub(crate) fn consecutive(&self) -> u32 { self.consecutive }
}
