//! Reconnect delay policy.

use std::time::Duration;

/// Exponential backoff: `delay = min(base * 2^attempt, cap)`.
///
/// `attempt` is zero-based: the first retry after a drop waits `base`.
/// Once `attempt` reaches `max_attempts` no further retry is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound for any single delay
    pub cap: Duration,
    /// Number of retries allowed before giving up
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { base: Duration::from_secs(1), cap: Duration::from_secs(30), max_attempts: 10 }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.cap, |delay| delay.min(self.cap))
    }

    /// Whether retry number `attempt` may still be scheduled.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
