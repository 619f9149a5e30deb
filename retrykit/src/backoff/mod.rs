//! Back-off policies decide how long to pause between attempts.
//!
//! For each proxied call the proxy calls [`BackOffPolicy::start`] once and
//! then [`BackOffPolicy::back_off`] before every retry. Stateful policies
//! keep their progression in the context returned by `start`; stateless
//! ones use `()`.
//!
//! All intervals are whole milliseconds and never smaller than 1.

mod exponential;
mod fixed;
mod linear;
mod uniform;

pub use exponential::{
    ExponentialBackOffContext, ExponentialBackOffPolicy, ExponentialRandomBackOffPolicy,
};
pub use fixed::FixedBackOffPolicy;
pub use linear::{LinearBackOffContext, LinearBackOffPolicy};
pub use uniform::UniformRandomBackOffPolicy;

use crate::context::RetryStatus;

/// Strategy for pausing between attempts of one retry operation.
pub trait BackOffPolicy {
    /// Per-operation state.
    type Context;

    /// Start a new sequence of back-offs.
    ///
    /// The retry context of the operation is passed when available.
    fn start(&self, retry: Option<&dyn RetryStatus>) -> Self::Context;

    /// Pause once and advance the context.
    fn back_off(&self, context: &mut Self::Context);
}

impl<P: BackOffPolicy + ?Sized> BackOffPolicy for &P {
    type Context = P::Context;

    fn start(&self, retry: Option<&dyn RetryStatus>) -> Self::Context {
        (**self).start(retry)
    }

    fn back_off(&self, context: &mut Self::Context) {
        (**self).back_off(context)
    }
}

/// Back-off policy that never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackOffPolicy;

impl NoBackOffPolicy {
    /// Create a new no-op back-off policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BackOffPolicy for NoBackOffPolicy {
    type Context = ();

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {}

    fn back_off(&self, _context: &mut Self::Context) {}
}

/// Clamp an interval to at least one millisecond.
pub(crate) fn clamp_interval(millis: u64) -> u64 {
    millis.max(1)
}

/// Clamp a multiplier to at least 1.0.
///
/// NaN becomes 1.0.
pub(crate) fn clamp_multiplier(multiplier: f64) -> f64 {
    multiplier.max(1.0)
}
