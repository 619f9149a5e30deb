//! # retrykit
//!
//! Policy-driven retry orchestration for synchronous operations.
//!
//! An operation is attempted through a [`RetryProxy`]. After every failure a
//! [`RetryPolicy`] decides whether another attempt is allowed, and a
//! [`BackOffPolicy`] pauses before it runs.
//!
//! ## Core Concepts
//!
//! - **[`RetryPolicy`]**: Decide whether to try again
//! - **[`RetryContext`]**: Per-call state (retry count, last failure)
//! - **[`BackOffPolicy`]**: Decide how long to wait between attempts
//! - **[`RetryProxy`]**: Run an operation under both policies
//! - **[`RetryConfig`]**: Describe a proxy as serde data
//!
//! ## Retry Policies
//!
//! - [`SimpleRetryPolicy`]: Limited attempts for an allow-list of failure kinds
//! - [`CallableRetryPolicy`]: Limited attempts filtered by a predicate
//! - [`NeverRetryPolicy`]: A single attempt
//! - [`TimeoutRetryPolicy`]: Attempts until a deadline passes
//! - [`AlwaysRetryPolicy`]: Attempts until success
//! - [`CompositeRetryPolicy`]: Two policies combined
//!
//! ## Back-off Policies
//!
//! - [`NoBackOffPolicy`]: No pause
//! - [`FixedBackOffPolicy`]: Constant pause
//! - [`UniformRandomBackOffPolicy`]: Random pause in a range
//! - [`ExponentialBackOffPolicy`]: Exponential pause with cap
//! - [`ExponentialRandomBackOffPolicy`]: Exponential with randomization
//! - [`LinearBackOffPolicy`]: Linearly increasing pause
//!
//! ## Example
//!
//! ```
//! use retrykit::prelude::*;
//!
//! let proxy = RetryProxy::with_policies(
//!     SimpleRetryPolicy::new(3),
//!     NoBackOffPolicy::new(),
//! );
//!
//! let mut calls = 0;
//! let result = proxy.call(|| {
//!     calls += 1;
//!     if calls < 3 {
//!         Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"))
//!     } else {
//!         Ok(calls)
//!     }
//! });
//!
//! assert_eq!(result.unwrap(), 3);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backoff;
pub mod config;
pub mod context;
pub mod error;
pub mod kind;
pub mod logger;
pub mod policy;
pub mod proxy;
pub mod sleeper;

// Re-exports
pub use backoff::{
    BackOffPolicy, ExponentialBackOffContext, ExponentialBackOffPolicy,
    ExponentialRandomBackOffPolicy, FixedBackOffPolicy, LinearBackOffContext, LinearBackOffPolicy,
    NoBackOffPolicy, UniformRandomBackOffPolicy,
};
pub use config::{BackOffConfig, ConfiguredBackOff, ConfiguredPolicy, PolicyConfig, RetryConfig};
pub use context::{
    NeverRetryContext, RetryContext, RetryStatus, SimpleRetryContext, TimeoutRetryContext,
};
pub use error::{PolicyError, RetryError, RetryResult};
pub use kind::{Classify, FailureKind, ANY, ANY_KIND};
pub use logger::{NullLogger, RetryLogger, TracingLogger};
pub use policy::{
    AlwaysRetryPolicy, CallableRetryPolicy, CompositeRetryContext, CompositeRetryPolicy,
    NeverRetryPolicy, RetryPolicy, SimpleRetryPolicy, TimeoutRetryPolicy,
};
pub use proxy::RetryProxy;
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BackOffPolicy, Classify, ExponentialBackOffPolicy, FailureKind, FixedBackOffPolicy,
        NoBackOffPolicy, RetryConfig, RetryContext, RetryError, RetryPolicy, RetryProxy,
        RetryResult, SimpleRetryPolicy, TimeoutRetryPolicy,
    };
}
