//! Uniformly random back-off.

use super::{clamp_interval, BackOffPolicy};
use crate::context::RetryStatus;
use crate::sleeper::{Sleeper, ThreadSleeper};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Pauses for a random period drawn uniformly from `[min, max]`.
#[derive(Debug)]
pub struct UniformRandomBackOffPolicy {
    min_back_off_period: u64,
    max_back_off_period: u64,
    sleeper: Arc<dyn Sleeper>,
    rng: Mutex<StdRng>,
}

impl UniformRandomBackOffPolicy {
    /// Default minimum back-off period in milliseconds.
    pub const DEFAULT_BACK_OFF_MIN_PERIOD: u64 = 500;
    /// Default maximum back-off period in milliseconds.
    pub const DEFAULT_BACK_OFF_MAX_PERIOD: u64 = 1500;

    /// Create a policy pausing between `min` and `max` milliseconds.
    #[must_use]
    pub fn new(min: u64, max: u64) -> Self {
        Self {
            min_back_off_period: clamp_interval(min),
            max_back_off_period: clamp_interval(max),
            sleeper: Arc::new(ThreadSleeper),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use the given sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Use the given random source.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// The minimum back-off period in milliseconds.
    pub fn min_back_off_period(&self) -> u64 {
        self.min_back_off_period
    }

    /// Set the minimum back-off period. Values below 1 are raised to 1.
    pub fn set_min_back_off_period(&mut self, period: u64) {
        self.min_back_off_period = clamp_interval(period);
    }

    /// The maximum back-off period in milliseconds.
    pub fn max_back_off_period(&self) -> u64 {
        self.max_back_off_period
    }

    /// Set the maximum back-off period. Values below 1 are raised to 1.
    pub fn set_max_back_off_period(&mut self, period: u64) {
        self.max_back_off_period = clamp_interval(period);
    }

    /// Replace the sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    /// Pick the next pause.
    ///
    /// A maximum at or below the minimum always yields the minimum.
    fn next_period(&self) -> u64 {
        if self.max_back_off_period <= self.min_back_off_period {
            return self.min_back_off_period;
        }
        let spread = self.max_back_off_period - self.min_back_off_period;
        self.min_back_off_period + self.rng.lock().gen_range(0..=spread)
    }
}

impl Default for UniformRandomBackOffPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BACK_OFF_MIN_PERIOD,
            Self::DEFAULT_BACK_OFF_MAX_PERIOD,
        )
    }
}

impl BackOffPolicy for UniformRandomBackOffPolicy {
    type Context = ();

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {}

    fn back_off(&self, _context: &mut Self::Context) {
        self.sleeper.sleep(self.next_period());
    }
}
