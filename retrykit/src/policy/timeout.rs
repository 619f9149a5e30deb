//! Retry policy bounded by elapsed time.

use super::RetryPolicy;
use crate::context::TimeoutRetryContext;
use std::time::Duration;

/// Allows attempts until a wall-clock timeout elapses.
///
/// The deadline is only checked between attempts; a running operation is
/// never interrupted.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutRetryPolicy {
    timeout: Duration,
}

impl TimeoutRetryPolicy {
    /// Default timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

    /// Create a policy with the given timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a policy with a timeout in milliseconds.
    #[must_use]
    pub fn from_millis(timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms))
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Default for TimeoutRetryPolicy {
    fn default() -> Self {
        Self::from_millis(Self::DEFAULT_TIMEOUT_MS)
    }
}

impl<E> RetryPolicy<E> for TimeoutRetryPolicy {
    type Context = TimeoutRetryContext<E>;

    fn open(&self) -> Self::Context {
        TimeoutRetryContext::new(self.timeout)
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        context.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(TimeoutRetryPolicy::default().timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_independent_of_attempt_count() {
        let policy = TimeoutRetryPolicy::new(Duration::from_secs(60));
        let mut context: TimeoutRetryContext<u32> = policy.open();

        for n in 0..100 {
            policy.register_failure(&mut context, n).unwrap();
        }
        assert!(policy.can_retry(&context));
    }

    #[test]
    fn test_expired_deadline() {
        let mut policy = TimeoutRetryPolicy::default();
        policy.set_timeout(Duration::from_millis(5));
        let context: TimeoutRetryContext<u32> = policy.open();

        std::thread::sleep(Duration::from_millis(10));
        assert!(!policy.can_retry(&context));
    }
}
