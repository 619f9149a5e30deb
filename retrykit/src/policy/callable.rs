//! Retry policy driven by a predicate.

use super::RetryPolicy;
use crate::context::{RetryContext, RetryStatus, SimpleRetryContext};
use std::fmt;

/// Retries a fixed number of times, asking a predicate whether each failure
/// is retryable.
///
/// The number of attempts includes the initial try.
#[derive(Clone)]
pub struct CallableRetryPolicy<F> {
    max_attempts: u32,
    should_retry: F,
}

impl<F> CallableRetryPolicy<F> {
    /// Default limit on the number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Create a policy with the default attempt limit.
    #[must_use]
    pub fn new(should_retry: F) -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            should_retry,
        }
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Set the maximum number of attempts.
    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.max_attempts = max_attempts;
    }

    /// Replace the predicate.
    pub fn set_should_retry(&mut self, should_retry: F) {
        self.should_retry = should_retry;
    }
}

impl<E> CallableRetryPolicy<fn(&E) -> bool> {
    /// Create a policy that retries every failure up to the default limit.
    #[must_use]
    pub fn retry_all() -> Self {
        Self::new(|_| true)
    }
}

impl<E> Default for CallableRetryPolicy<fn(&E) -> bool> {
    fn default() -> Self {
        Self::retry_all()
    }
}

impl<F> fmt::Debug for CallableRetryPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableRetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<E, F> RetryPolicy<E> for CallableRetryPolicy<F>
where
    F: Fn(&E) -> bool,
{
    type Context = SimpleRetryContext<E>;

    fn open(&self) -> Self::Context {
        SimpleRetryContext::new()
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        if context.retry_count() >= self.max_attempts {
            return false;
        }
        context
            .last_failure()
            .map_or(true, |failure| (self.should_retry)(failure))
    }
}
