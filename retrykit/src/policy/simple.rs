//! Attempt-limited retry policy with a failure-kind allow-list.

use super::RetryPolicy;
use crate::context::{RetryContext, RetryStatus, SimpleRetryContext};
use crate::kind::{Classify, ANY_KIND};

/// Retries a fixed number of times for an allow-list of failure kinds.
///
/// The number of attempts includes the initial try. A failure is retryable
/// when its kind, or any ancestor of its kind, is in the allow-list. An
/// `"any"` entry matches every failure, including kinds declared with
/// [`FailureKind::root`](crate::kind::FailureKind::root).
#[derive(Debug, Clone)]
pub struct SimpleRetryPolicy {
    max_attempts: u32,
    retryable_kinds: Vec<String>,
}

impl SimpleRetryPolicy {
    /// Default limit on the number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Create a policy allowing `max_attempts` attempts for any failure.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retryable_kinds: vec![ANY_KIND.to_string()],
        }
    }

    /// Create a policy allowing `max_attempts` attempts for the given kinds.
    #[must_use]
    pub fn with_kinds<I, S>(max_attempts: u32, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::new(max_attempts);
        policy.set_retryable_kinds(kinds);
        policy
    }

    /// The maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Set the maximum number of attempts.
    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.max_attempts = max_attempts;
    }

    /// The retryable kind identifiers.
    pub fn retryable_kinds(&self) -> &[String] {
        &self.retryable_kinds
    }

    /// Replace the retryable kinds.
    ///
    /// An empty list keeps the current kinds.
    pub fn set_retryable_kinds<I, S>(&mut self, kinds: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kinds: Vec<String> = kinds.into_iter().map(Into::into).collect();
        if !kinds.is_empty() {
            self.retryable_kinds = kinds;
        }
    }

    fn should_retry_for<E: Classify>(&self, failure: &E) -> bool {
        let kind = failure.kind();
        self.retryable_kinds
            .iter()
            .any(|name| name == ANY_KIND || kind.is_a(name))
    }
}

impl Default for SimpleRetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

impl<E: Classify> RetryPolicy<E> for SimpleRetryPolicy {
    type Context = SimpleRetryContext<E>;

    fn open(&self) -> Self::Context {
        SimpleRetryContext::new()
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        let allowed = context
            .last_failure()
            .map_or(true, |failure| self.should_retry_for(failure));
        allowed && context.retry_count() < self.max_attempts
    }
}
