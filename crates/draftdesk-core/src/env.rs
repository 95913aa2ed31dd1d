//! Environment abstraction.
//!
//! The runtime reads time through [`Environment`] so the same orchestration
//! code can run against the wall clock or a virtual clock in simulation.

use std::time::{Instant, SystemTime};

/// Source of time for drivers and runtimes.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic time used for every timer and deadline.
    fn now(&self) -> Instant;

    /// Wall-clock time, only used for human-facing timestamps.
    fn wall_clock(&self) -> SystemTime;
}

/// Production environment backed by the operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> SystemTime {
        SystemTime::now()
    }
}
