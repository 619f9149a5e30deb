//! Combining two retry policies.

use super::RetryPolicy;
use crate::context::{RetryContext, RetryStatus};
use crate::error::PolicyError;

/// Combines two policies.
///
/// A pessimistic composite (the default) allows an attempt only when both
/// policies allow it; an optimistic one allows it when either does.
/// Failures are registered with the first policy before the second, and a
/// registration error from the first leaves the second context untouched.
/// Composites nest, so any number of policies can be combined.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRetryPolicy<A, B> {
    first: A,
    second: B,
    optimistic: bool,
}

impl<A, B> CompositeRetryPolicy<A, B> {
    /// Combine two policies; both must allow each attempt.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            optimistic: false,
        }
    }

    /// Combine two policies; either one allowing is enough.
    #[must_use]
    pub fn optimistic(first: A, second: B) -> Self {
        Self {
            first,
            second,
            optimistic: true,
        }
    }

    /// Whether either policy is enough to allow an attempt.
    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }
}

/// Context pairing the contexts of both composed policies.
#[derive(Debug)]
pub struct CompositeRetryContext<A, B> {
    first: A,
    second: B,
}

impl<A, B> CompositeRetryContext<A, B> {
    /// Context of the first policy.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Context of the second policy.
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: RetryStatus, B> RetryStatus for CompositeRetryContext<A, B> {
    fn retry_count(&self) -> u32 {
        self.first.retry_count()
    }
}

impl<E, A, B> RetryContext<E> for CompositeRetryContext<A, B>
where
    E: Clone,
    A: RetryContext<E>,
    B: RetryContext<E>,
{
    fn last_failure(&self) -> Option<&E> {
        self.first.last_failure()
    }

    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError> {
        self.first.register_failure(failure.clone())?;
        self.second.register_failure(failure)
    }

    fn take_last_failure(&mut self) -> Option<E> {
        self.second.take_last_failure();
        self.first.take_last_failure()
    }
}

impl<E, A, B> RetryPolicy<E> for CompositeRetryPolicy<A, B>
where
    E: Clone,
    A: RetryPolicy<E>,
    B: RetryPolicy<E>,
{
    type Context = CompositeRetryContext<A::Context, B::Context>;

    fn open(&self) -> Self::Context {
        CompositeRetryContext {
            first: self.first.open(),
            second: self.second.open(),
        }
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        let first = self.first.can_retry(&context.first);
        let second = self.second.can_retry(&context.second);
        if self.optimistic {
            first || second
        } else {
            first && second
        }
    }

    fn register_failure(&self, context: &mut Self::Context, failure: E) -> Result<(), PolicyError> {
        self.first.register_failure(&mut context.first, failure.clone())?;
        self.second.register_failure(&mut context.second, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleRetryContext;
    use crate::policy::{
        AlwaysRetryPolicy, CallableRetryPolicy, NeverRetryPolicy, TimeoutRetryPolicy,
    };
    use std::time::Duration;

    #[test]
    fn test_pessimistic_needs_both() {
        let policy = CompositeRetryPolicy::new(
            AlwaysRetryPolicy::new(),
            CallableRetryPolicy::new(|_: &String| true).with_max_attempts(2),
        );
        let mut context = RetryPolicy::<String>::open(&policy);

        assert!(policy.can_retry(&context));
        policy.register_failure(&mut context, "a".to_string()).unwrap();
        assert!(policy.can_retry(&context));
        policy.register_failure(&mut context, "b".to_string()).unwrap();
        assert!(!policy.can_retry(&context));
        assert_eq!(context.retry_count(), 2);
        assert_eq!(
            RetryContext::<String>::last_failure(&context).map(String::as_str),
            Some("b")
        );
    }

    #[test]
    fn test_optimistic_needs_either() {
        let policy = CompositeRetryPolicy::optimistic(
            NeverRetryPolicy::new(),
            TimeoutRetryPolicy::new(Duration::from_secs(60)),
        );
        assert!(policy.is_optimistic());

        let mut context = RetryPolicy::<String>::open(&policy);
        policy.register_failure(&mut context, "boom".to_string()).unwrap();

        assert!(context.first().is_finished());
        assert!(policy.can_retry(&context));
    }

    #[derive(Debug)]
    struct RejectingPolicy;

    impl RetryPolicy<String> for RejectingPolicy {
        type Context = SimpleRetryContext<String>;

        fn open(&self) -> Self::Context {
            SimpleRetryContext::new()
        }

        fn can_retry(&self, _context: &Self::Context) -> bool {
            true
        }

        fn register_failure(
            &self,
            _context: &mut Self::Context,
            _failure: String,
        ) -> Result<(), PolicyError> {
            Err(PolicyError::msg("rejected"))
        }
    }

    #[test]
    fn test_first_registration_error_leaves_second_untouched() {
        let policy = CompositeRetryPolicy::new(RejectingPolicy, AlwaysRetryPolicy::new());
        let mut context = RetryPolicy::<String>::open(&policy);

        let err = policy
            .register_failure(&mut context, "boom".to_string())
            .unwrap_err();

        assert_eq!(err.to_string(), "rejected");
        assert_eq!(context.first().retry_count(), 0);
        assert_eq!(context.second().retry_count(), 0);
        assert!(context.second().last_failure().is_none());
    }

    #[test]
    fn test_take_clears_both_contexts() {
        let policy = CompositeRetryPolicy::new(AlwaysRetryPolicy::new(), NeverRetryPolicy::new());
        let mut context = RetryPolicy::<u8>::open(&policy);
        policy.register_failure(&mut context, 9).unwrap();

        assert_eq!(RetryContext::<u8>::take_last_failure(&mut context), Some(9));
        assert!(context.second().last_failure().is_none());
    }
}
