//! Retry contexts.
//!
//! A context is opened by a [`RetryPolicy`](crate::RetryPolicy) at the start
//! of one proxied call and tracks how many failures have been registered and
//! which one came last. Policies that need more state wrap
//! [`SimpleRetryContext`] in their own context type.

use crate::error::PolicyError;
use std::time::{Duration, Instant};

/// Read-only view of a retry in progress.
pub trait RetryStatus {
    /// Number of failures registered so far.
    fn retry_count(&self) -> u32;
}

/// Mutable state of one retry operation.
pub trait RetryContext<E>: RetryStatus {
    /// The failure registered most recently.
    fn last_failure(&self) -> Option<&E>;

    /// Record a failure and increment the retry count.
    ///
    /// Must be called exactly once per failed attempt.
    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError>;

    /// Remove and return the last failure.
    fn take_last_failure(&mut self) -> Option<E>;
}

/// Context holding only the retry count and the last failure.
#[derive(Debug)]
pub struct SimpleRetryContext<E> {
    retry_count: u32,
    last_failure: Option<E>,
}

impl<E> SimpleRetryContext<E> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            retry_count: 0,
            last_failure: None,
        }
    }
}

impl<E> Default for SimpleRetryContext<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryStatus for SimpleRetryContext<E> {
    fn retry_count(&self) -> u32 {
        self.retry_count
    }
}

impl<E> RetryContext<E> for SimpleRetryContext<E> {
    fn last_failure(&self) -> Option<&E> {
        self.last_failure.as_ref()
    }

    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError> {
        self.retry_count = self
            .retry_count
            .checked_add(1)
            .ok_or(PolicyError::CountOverflow)?;
        self.last_failure = Some(failure);
        Ok(())
    }

    fn take_last_failure(&mut self) -> Option<E> {
        self.last_failure.take()
    }
}

/// Context that finishes as soon as one failure is registered.
#[derive(Debug)]
pub struct NeverRetryContext<E> {
    inner: SimpleRetryContext<E>,
    finished: bool,
}

impl<E> NeverRetryContext<E> {
    /// Create an unfinished context.
    pub fn new() -> Self {
        Self {
            inner: SimpleRetryContext::new(),
            finished: false,
        }
    }

    /// Whether a failure has been registered.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Mark the context as finished.
    pub fn set_finished(&mut self) {
        self.finished = true;
    }
}

impl<E> Default for NeverRetryContext<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryStatus for NeverRetryContext<E> {
    fn retry_count(&self) -> u32 {
        self.inner.retry_count()
    }
}

impl<E> RetryContext<E> for NeverRetryContext<E> {
    fn last_failure(&self) -> Option<&E> {
        self.inner.last_failure()
    }

    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError> {
        self.set_finished();
        self.inner.register_failure(failure)
    }

    fn take_last_failure(&mut self) -> Option<E> {
        self.inner.take_last_failure()
    }
}

/// Context that stays alive until a deadline.
#[derive(Debug)]
pub struct TimeoutRetryContext<E> {
    inner: SimpleRetryContext<E>,
    deadline: Option<Instant>,
}

impl<E> TimeoutRetryContext<E> {
    /// Create a context expiring `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: SimpleRetryContext::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// The instant after which no more attempts are allowed.
    ///
    /// `None` when the timeout is too large to represent.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has not yet passed.
    pub fn is_alive(&self) -> bool {
        self.deadline.map_or(true, |deadline| Instant::now() < deadline)
    }
}

impl<E> RetryStatus for TimeoutRetryContext<E> {
    fn retry_count(&self) -> u32 {
        self.inner.retry_count()
    }
}

impl<E> RetryContext<E> for TimeoutRetryContext<E> {
    fn last_failure(&self) -> Option<&E> {
        self.inner.last_failure()
    }

    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError> {
        self.inner.register_failure(failure)
    }

    fn take_last_failure(&mut self) -> Option<E> {
        self.inner.take_last_failure()
    }
}
