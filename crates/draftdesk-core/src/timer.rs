//! Cancellable deadline timers.
//!
//! A [`Timer`] is the scheduled-task handle owned by a state machine. It holds
//! at most one deadline; the owner decides what firing means. Cancelling is
//! synchronous, so a cancelled timer can never fire later.

use std::time::{Duration, Instant};

/// Deadline used when `now + after` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// One-shot timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// Create a disarmed timer.
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm (or re-arm) the timer to fire `after` from `now`.
    ///
    /// Durations too large for the clock are clamped to a year. If even that
    /// overflows the timer is left disarmed.
    pub fn arm_after(&mut self, now: Instant, after: Duration) {
        self.deadline = now.checked_add(after.min(FAR_FUTURE));
    }

    /// Disarm the timer. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Whether the timer is armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and return `true` if the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            },
            _ => false,
        }
    }
}

/// Earliest deadline among the armed timers.
pub fn earliest<'a>(timers: impl IntoIterator<Item = &'a Timer>) -> Option<Instant> {
    timers.into_iter().filter_map(Timer::deadline).min()
}
