//! The retry proxy runs an operation until it succeeds or the policy gives up.

use crate::backoff::{BackOffPolicy, ExponentialBackOffPolicy};
use crate::context::{RetryContext, RetryStatus};
use crate::error::{RetryError, RetryResult};
use crate::logger::{NullLogger, RetryLogger};
use crate::policy::{RetryPolicy, SimpleRetryPolicy};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Executes operations under a retry policy and a back-off policy.
///
/// Each call opens its own retry and back-off contexts, so one proxy can
/// serve any number of calls. Back-off pauses block the calling thread.
///
/// # Example
///
/// ```ignore
/// use retrykit::{FixedBackOffPolicy, RetryProxy, SimpleRetryPolicy};
///
/// let proxy = RetryProxy::with_policies(
///     SimpleRetryPolicy::new(5),
///     FixedBackOffPolicy::new(200),
/// );
///
/// let body = proxy.call(|| std::fs::read_to_string("/var/run/app.pid"))?;
/// ```
#[derive(Debug)]
pub struct RetryProxy<P = SimpleRetryPolicy, B = ExponentialBackOffPolicy, L = NullLogger> {
    retry_policy: P,
    back_off_policy: B,
    logger: L,
    attempt_count: AtomicU32,
}

impl RetryProxy {
    /// Create a proxy with a [`SimpleRetryPolicy`] and an
    /// [`ExponentialBackOffPolicy`], both with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P, B> RetryProxy<P, B> {
    /// Create a proxy from a retry policy and a back-off policy.
    #[must_use]
    pub fn with_policies(retry_policy: P, back_off_policy: B) -> Self {
        Self {
            retry_policy,
            back_off_policy,
            logger: NullLogger,
            attempt_count: AtomicU32::new(0),
        }
    }
}

impl<P: Default, B: Default, L: Default> Default for RetryProxy<P, B, L> {
    fn default() -> Self {
        Self {
            retry_policy: P::default(),
            back_off_policy: B::default(),
            logger: L::default(),
            attempt_count: AtomicU32::new(0),
        }
    }
}

impl<P, B, L> RetryProxy<P, B, L> {
    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy<P2>(self, retry_policy: P2) -> RetryProxy<P2, B, L> {
        RetryProxy {
            retry_policy,
            back_off_policy: self.back_off_policy,
            logger: self.logger,
            attempt_count: self.attempt_count,
        }
    }

    /// Replace the back-off policy.
    #[must_use]
    pub fn with_back_off_policy<B2>(self, back_off_policy: B2) -> RetryProxy<P, B2, L> {
        RetryProxy {
            retry_policy: self.retry_policy,
            back_off_policy,
            logger: self.logger,
            attempt_count: self.attempt_count,
        }
    }

    /// Report retries to `logger`.
    #[must_use]
    pub fn with_logger<L2>(self, logger: L2) -> RetryProxy<P, B, L2> {
        RetryProxy {
            retry_policy: self.retry_policy,
            back_off_policy: self.back_off_policy,
            logger,
            attempt_count: self.attempt_count,
        }
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &P {
        &self.retry_policy
    }

    /// The back-off policy.
    pub fn back_off_policy(&self) -> &B {
        &self.back_off_policy
    }

    /// Number of attempts made by the most recent call.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count.load(Ordering::Relaxed)
    }

    /// Run `operation` until it succeeds or the retry policy stops it.
    ///
    /// On exhaustion the last failure is returned unchanged inside
    /// [`RetryError::Failed`]. If recording a failure fails, the call stops
    /// at once with [`RetryError::Terminated`]. If the policy denies the
    /// first attempt, [`RetryError::Exhausted`] is returned.
    pub fn call<T, E, F>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        B: BackOffPolicy,
        L: RetryLogger,
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut context = self.retry_policy.open();
        let mut back_off = self
            .back_off_policy
            .start(Some(&context as &dyn RetryStatus));
        let mut attempt: u32 = 0;
        self.attempt_count.store(0, Ordering::Relaxed);

        while self.retry_policy.can_retry(&context) {
            attempt = attempt.saturating_add(1);
            self.attempt_count.store(attempt, Ordering::Relaxed);

            debug!(
                attempt,
                retry_count = context.retry_count(),
                "Executing retry attempt"
            );

            let failure = match operation() {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            if let Err(source) = self.retry_policy.register_failure(&mut context, failure) {
                warn!(attempt, error = %source, "Retry terminated by policy error");
                return Err(RetryError::Terminated { source });
            }

            if self.retry_policy.can_retry(&context) {
                if let Some(failure) = context.last_failure() {
                    self.logger.info(&format!(
                        "{}. Retrying... [{}x]",
                        failure,
                        context.retry_count()
                    ));
                }
                self.back_off_policy.back_off(&mut back_off);
            }
        }

        match context.take_last_failure() {
            Some(failure) => {
                warn!(attempt, error = %failure, "Retry exhausted");
                Err(RetryError::Failed(failure))
            }
            None => {
                warn!("Retry exhausted with no attempts made");
                Err(RetryError::Exhausted)
            }
        }
    }

    /// Run `operation` with `args` on every attempt.
    pub fn call_with<A, T, E, F>(&self, args: A, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        B: BackOffPolicy,
        L: RetryLogger,
        E: fmt::Display,
        F: FnMut(&A) -> Result<T, E>,
    {
        self.call(|| operation(&args))
    }
}
