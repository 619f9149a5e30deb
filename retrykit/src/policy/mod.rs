//! Retry policies decide whether another attempt is permitted.
//!
//! Every policy owns a concrete context type. The proxy opens one context
//! per call, registers each failure through the policy and asks the policy
//! whether to continue.

mod always;
mod callable;
mod composite;
mod never;
mod simple;
mod timeout;

pub use always::AlwaysRetryPolicy;
pub use callable::CallableRetryPolicy;
pub use composite::{CompositeRetryContext, CompositeRetryPolicy};
pub use never::NeverRetryPolicy;
pub use simple::SimpleRetryPolicy;
pub use timeout::TimeoutRetryPolicy;

use crate::context::RetryContext;
use crate::error::PolicyError;

/// Policy for deciding whether an operation may be attempted again.
pub trait RetryPolicy<E> {
    /// Context type created by [`open`](RetryPolicy::open).
    type Context: RetryContext<E>;

    /// Create the context for a new retry operation.
    fn open(&self) -> Self::Context;

    /// Check whether another attempt is allowed.
    ///
    /// Must not mutate the context.
    fn can_retry(&self, context: &Self::Context) -> bool;

    /// Record a failed attempt.
    fn register_failure(&self, context: &mut Self::Context, failure: E) -> Result<(), PolicyError> {
        context.register_failure(failure)
    }
}

impl<E, P: RetryPolicy<E> + ?Sized> RetryPolicy<E> for &P {
    type Context = P::Context;

    fn open(&self) -> Self::Context {
        (**self).open()
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        (**self).can_retry(context)
    }

    fn register_failure(&self, context: &mut Self::Context, failure: E) -> Result<(), PolicyError> {
        (**self).register_failure(context, failure)
    }
}
