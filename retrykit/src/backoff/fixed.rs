//! Constant back-off.

use super::{clamp_interval, BackOffPolicy};
use crate::context::RetryStatus;
use crate::sleeper::{Sleeper, ThreadSleeper};
use std::sync::Arc;

/// Pauses for the same period before every retry.
#[derive(Debug, Clone)]
pub struct FixedBackOffPolicy {
    back_off_period: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl FixedBackOffPolicy {
    /// Default back-off period in milliseconds.
    pub const DEFAULT_BACK_OFF_PERIOD: u64 = 1000;

    /// Create a policy pausing `back_off_period` milliseconds.
    #[must_use]
    pub fn new(back_off_period: u64) -> Self {
        Self {
            back_off_period: clamp_interval(back_off_period),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Use the given sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The back-off period in milliseconds.
    pub fn back_off_period(&self) -> u64 {
        self.back_off_period
    }

    /// Set the back-off period. Values below 1 are raised to 1.
    pub fn set_back_off_period(&mut self, back_off_period: u64) {
        self.back_off_period = clamp_interval(back_off_period);
    }

    /// Replace the sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }
}

impl Default for FixedBackOffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BACK_OFF_PERIOD)
    }
}

impl BackOffPolicy for FixedBackOffPolicy {
    type Context = ();

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {}

    fn back_off(&self, _context: &mut Self::Context) {
        self.sleeper.sleep(self.back_off_period);
    }
}
