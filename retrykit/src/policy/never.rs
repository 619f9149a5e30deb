//! Retry policy that allows a single attempt.

use super::RetryPolicy;
use crate::context::NeverRetryContext;

/// Allows the first attempt but never a retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetryPolicy;

impl NeverRetryPolicy {
    /// Create a new never-retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<E> RetryPolicy<E> for NeverRetryPolicy {
    type Context = NeverRetryContext<E>;

    fn open(&self) -> Self::Context {
        NeverRetryContext::new()
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        !context.is_finished()
    }
}
