//! Unbounded retry policy.

use super::RetryPolicy;
use crate::context::SimpleRetryContext;

/// Allows every attempt, for any failure, without limit.
///
/// Mostly useful as a building block for [`CompositeRetryPolicy`](super::CompositeRetryPolicy),
/// e.g. combined with a [`TimeoutRetryPolicy`](super::TimeoutRetryPolicy).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetryPolicy;

impl AlwaysRetryPolicy {
    /// Create a new always-retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<E> RetryPolicy<E> for AlwaysRetryPolicy {
    type Context = SimpleRetryContext<E>;

    fn open(&self) -> Self::Context {
        SimpleRetryContext::new()
    }

    fn can_retry(&self, _context: &Self::Context) -> bool {
        true
    }
}
