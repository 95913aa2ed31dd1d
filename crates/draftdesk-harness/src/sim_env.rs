//! Virtual clock and seeded randomness.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant, SystemTime},
};

use draftdesk_core::Environment;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall clock at simulation start (2023-11-14T22:13:20Z).
const WALL_START_SECS: u64 = 1_700_000_000;

struct Clock {
    start: Instant,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

/// Simulation environment.
///
/// Time only moves when a test advances it. Clones share the same clock.
#[derive(Clone)]
pub struct SimEnv {
    clock: Arc<Mutex<Clock>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Environment with a fixed seed of 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment whose randomness derives from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let clock = Clock {
            start: Instant::now(),
            elapsed: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        Self { clock: Arc::new(Mutex::new(clock)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.with_clock(|clock| clock.elapsed += by);
    }

    /// Move the clock to `at`. Never moves backwards.
    pub fn advance_to(&self, at: Instant) {
        self.with_clock(|clock| {
            let target = at.saturating_duration_since(clock.start);
            clock.elapsed = clock.elapsed.max(target);
        });
    }

    /// Time since the simulation started.
    pub fn elapsed(&self) -> Duration {
        self.with_clock(|clock| clock.elapsed)
    }

    /// Seeded coin flip that comes up `true` with probability `p`.
    pub fn chance(&self, p: f64) -> bool {
        self.with_clock(|clock| clock.rng.gen_bool(p.clamp(0.0, 1.0)))
    }

    fn with_clock<T>(&self, f: impl FnOnce(&mut Clock) -> T) -> T {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut clock)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.with_clock(|clock| clock.start + clock.elapsed)
    }

    fn wall_clock(&self) -> SystemTime {
        let elapsed = self.elapsed();
        SystemTime::UNIX_EPOCH + Duration::from_secs(WALL_START_SECS) + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_only_moves_when_advanced() {
        let env = SimEnv::new();
        let t0 = env.now();
        assert_eq!(env.now(), t0);

        env.advance(Duration::from_secs(5));
        assert_eq!(env.now() - t0, Duration::from_secs(5));

        env.advance_to(t0);
        assert_eq!(env.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();
        env.advance(Duration::from_secs(1));
        assert_eq!(other.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn same_seed_same_coin_flips() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        let flips_a: Vec<bool> = (0..32).map(|_| a.chance(0.5)).collect();
        let flips_b: Vec<bool> = (0..32).map(|_| b.chance(0.5)).collect();
        assert_eq!(flips_a, flips_b);
    }
}
