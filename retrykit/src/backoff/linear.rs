//! Linearly growing back-off.

use super::{clamp_interval, BackOffPolicy};
use crate::context::RetryStatus;
use crate::sleeper::{Sleeper, ThreadSleeper};
use std::sync::Arc;

/// Progression state of one linear back-off sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearBackOffContext {
    seed: u64,
    delta: u64,
    max: u64,
    interval: u64,
}

impl LinearBackOffContext {
    /// Create a context starting at `seed`.
    pub fn new(seed: u64, delta: u64, max: u64) -> Self {
        let seed = clamp_interval(seed);
        Self {
            seed,
            delta: clamp_interval(delta),
            max: clamp_interval(max),
            interval: seed,
        }
    }

    /// Return the pause to use now and advance the progression.
    pub fn interval_and_increment(&mut self) -> u64 {
        if self.interval > self.max {
            return self.max;
        }
        let interval = self.interval;
        self.interval = self.interval.saturating_add(self.delta);
        interval
    }

    /// The current interval.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Restart the progression from the seed.
    pub fn reset_interval(&mut self) {
        self.interval = self.seed;
    }

    /// The increment added after each back-off.
    pub fn delta(&self) -> u64 {
        self.delta
    }
}

/// Adds a fixed delta to the pause after every retry, up to a cap.
#[derive(Debug, Clone)]
pub struct LinearBackOffPolicy {
    initial_interval: u64,
    delta_interval: u64,
    max_interval: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl LinearBackOffPolicy {
    /// Default initial interval in milliseconds.
    pub const DEFAULT_INITIAL_INTERVAL: u64 = 1000;
    /// Default delta in milliseconds.
    pub const DEFAULT_DELTA_INTERVAL: u64 = 1000;
    /// Default maximum interval in milliseconds.
    pub const DEFAULT_MAX_INTERVAL: u64 = 30_000;

    /// Create a policy with the given progression.
    #[must_use]
    pub fn new(initial_interval: u64, delta_interval: u64, max_interval: u64) -> Self {
        Self {
            initial_interval: clamp_interval(initial_interval),
            delta_interval: clamp_interval(delta_interval),
            max_interval: clamp_interval(max_interval),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Use the given sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The first pause.
    pub fn initial_interval(&self) -> u64 {
        self.initial_interval
    }

    /// Set the first pause. Values below 1 are raised to 1.
    pub fn set_initial_interval(&mut self, initial_interval: u64) {
        self.initial_interval = clamp_interval(initial_interval);
    }

    /// The increment added after each back-off.
    pub fn delta_interval(&self) -> u64 {
        self.delta_interval
    }

    /// Set the increment. Values below 1 are raised to 1.
    pub fn set_delta_interval(&mut self, delta_interval: u64) {
        self.delta_interval = clamp_interval(delta_interval);
    }

    /// The longest pause.
    pub fn max_interval(&self) -> u64 {
        self.max_interval
    }

    /// Set the longest pause. Values below 1 are raised to 1.
    pub fn set_max_interval(&mut self, max_interval: u64) {
        self.max_interval = clamp_interval(max_interval);
    }

    /// Replace the sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }
}

impl Default for LinearBackOffPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_INITIAL_INTERVAL,
            Self::DEFAULT_DELTA_INTERVAL,
            Self::DEFAULT_MAX_INTERVAL,
        )
    }
}

impl BackOffPolicy for LinearBackOffPolicy {
    type Context = LinearBackOffContext;

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {
        LinearBackOffContext::new(self.initial_interval, self.delta_interval, self.max_interval)
    }

    fn back_off(&self, context: &mut Self::Context) {
        self.sleeper.sleep(context.interval_and_increment());
    }
}
