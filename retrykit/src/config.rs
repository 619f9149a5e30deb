//! Retry configuration.
//!
//! [`RetryConfig`] describes a retry policy and a back-off policy as plain
//! data so they can be loaded from a configuration file:
//!
//! ```json
//! {
//!   "policy": { "type": "simple", "max_attempts": 5, "retryable": ["io"] },
//!   "back_off": { "type": "exponential", "initial_ms": 50, "multiplier": 1.5 }
//! }
//! ```
//!
//! Missing fields fall back to the defaults of the matching policy.

use crate::backoff::{
    BackOffPolicy, ExponentialBackOffContext, ExponentialBackOffPolicy,
    ExponentialRandomBackOffPolicy, FixedBackOffPolicy, LinearBackOffContext, LinearBackOffPolicy,
    NoBackOffPolicy, UniformRandomBackOffPolicy,
};
use crate::context::{
    NeverRetryContext, RetryContext, RetryStatus, SimpleRetryContext, TimeoutRetryContext,
};
use crate::error::PolicyError;
use crate::kind::{Classify, ANY_KIND};
use crate::logger::TracingLogger;
use crate::policy::{
    AlwaysRetryPolicy, NeverRetryPolicy, RetryPolicy, SimpleRetryPolicy, TimeoutRetryPolicy,
};
use crate::proxy::RetryProxy;
use crate::sleeper::{Sleeper, ThreadSleeper};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for a [`RetryProxy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Which attempts are allowed.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// How long to pause between attempts.
    #[serde(default)]
    pub back_off: BackOffConfig,
}

impl RetryConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry policy.
    pub fn policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Set the back-off policy.
    pub fn back_off(mut self, back_off: BackOffConfig) -> Self {
        self.back_off = back_off;
        self
    }

    /// Config that makes a single attempt and never pauses.
    pub fn no_retry() -> Self {
        Self::new()
            .policy(PolicyConfig::Never)
            .back_off(BackOffConfig::None)
    }

    /// Build a proxy that pauses on the calling thread and logs through `tracing`.
    pub fn build(&self) -> RetryProxy<ConfiguredPolicy, ConfiguredBackOff, TracingLogger> {
        self.build_with_sleeper(Arc::new(ThreadSleeper))
    }

    /// Build a proxy whose back-off policy uses `sleeper`.
    pub fn build_with_sleeper(
        &self,
        sleeper: Arc<dyn Sleeper>,
    ) -> RetryProxy<ConfiguredPolicy, ConfiguredBackOff, TracingLogger> {
        RetryProxy::with_policies(self.policy.build(), self.back_off.build(sleeper))
            .with_logger(TracingLogger)
    }
}

/// Retry policy description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Limited attempts for an allow-list of failure kinds.
    Simple {
        /// Maximum number of attempts, including the first.
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
        /// Kind identifiers to retry on.
        #[serde(default = "default_retryable")]
        retryable: Vec<String>,
    },
    /// A single attempt.
    Never,
    /// Attempts until a timeout elapses.
    Timeout {
        /// Timeout in milliseconds.
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Unlimited attempts.
    Always,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::Simple {
            max_attempts: default_max_attempts(),
            retryable: default_retryable(),
        }
    }
}

impl PolicyConfig {
    /// Create the described policy.
    pub fn build(&self) -> ConfiguredPolicy {
        match self {
            Self::Simple {
                max_attempts,
                retryable,
            } => ConfiguredPolicy::Simple(SimpleRetryPolicy::with_kinds(
                *max_attempts,
                retryable.iter().cloned(),
            )),
            Self::Never => ConfiguredPolicy::Never(NeverRetryPolicy::new()),
            Self::Timeout { timeout_ms } => {
                ConfiguredPolicy::Timeout(TimeoutRetryPolicy::from_millis(*timeout_ms))
            }
            Self::Always => ConfiguredPolicy::Always(AlwaysRetryPolicy::new()),
        }
    }
}

/// Back-off policy description. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackOffConfig {
    /// No pause.
    None,
    /// Constant pause.
    Fixed {
        /// Pause length.
        #[serde(default = "default_fixed_period_ms")]
        period_ms: u64,
    },
    /// Random pause in `[min_ms, max_ms]`.
    UniformRandom {
        /// Shortest pause.
        #[serde(default = "default_uniform_min_ms")]
        min_ms: u64,
        /// Longest pause.
        #[serde(default = "default_uniform_max_ms")]
        max_ms: u64,
    },
    /// Exponentially growing pause.
    Exponential {
        /// First pause.
        #[serde(default = "default_exponential_initial_ms")]
        initial_ms: u64,
        /// Growth factor.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        /// Longest pause.
        #[serde(default = "default_max_interval_ms")]
        max_ms: u64,
    },
    /// Exponentially growing pause with randomization.
    ExponentialRandom {
        /// First base interval.
        #[serde(default = "default_exponential_initial_ms")]
        initial_ms: u64,
        /// Growth factor.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        /// Largest base interval.
        #[serde(default = "default_max_interval_ms")]
        max_ms: u64,
    },
    /// Linearly growing pause.
    Linear {
        /// First pause.
        #[serde(default = "default_linear_initial_ms")]
        initial_ms: u64,
        /// Increment per retry.
        #[serde(default = "default_linear_delta_ms")]
        delta_ms: u64,
        /// Longest pause.
        #[serde(default = "default_max_interval_ms")]
        max_ms: u64,
    },
}

impl Default for BackOffConfig {
    fn default() -> Self {
        Self::Exponential {
            initial_ms: default_exponential_initial_ms(),
            multiplier: default_multiplier(),
            max_ms: default_max_interval_ms(),
        }
    }
}

impl BackOffConfig {
    /// Create the described policy using `sleeper`.
    pub fn build(&self, sleeper: Arc<dyn Sleeper>) -> ConfiguredBackOff {
        match *self {
            Self::None => ConfiguredBackOff::None(NoBackOffPolicy::new()),
            Self::Fixed { period_ms } => {
                ConfiguredBackOff::Fixed(FixedBackOffPolicy::new(period_ms).with_sleeper(sleeper))
            }
            Self::UniformRandom { min_ms, max_ms } => ConfiguredBackOff::UniformRandom(
                UniformRandomBackOffPolicy::new(min_ms, max_ms).with_sleeper(sleeper),
            ),
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => ConfiguredBackOff::Exponential(
                ExponentialBackOffPolicy::new(initial_ms, multiplier, max_ms).with_sleeper(sleeper),
            ),
            Self::ExponentialRandom {
                initial_ms,
                multiplier,
                max_ms,
            } => ConfiguredBackOff::ExponentialRandom(
                ExponentialRandomBackOffPolicy::new(initial_ms, multiplier, max_ms)
                    .with_sleeper(sleeper),
            ),
            Self::Linear {
                initial_ms,
                delta_ms,
                max_ms,
            } => ConfiguredBackOff::Linear(
                LinearBackOffPolicy::new(initial_ms, delta_ms, max_ms).with_sleeper(sleeper),
            ),
        }
    }
}

fn default_max_attempts() -> u32 {
    SimpleRetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_retryable() -> Vec<String> {
    vec![ANY_KIND.to_string()]
}

fn default_timeout_ms() -> u64 {
    TimeoutRetryPolicy::DEFAULT_TIMEOUT_MS
}

fn default_fixed_period_ms() -> u64 {
    FixedBackOffPolicy::DEFAULT_BACK_OFF_PERIOD
}

fn default_uniform_min_ms() -> u64 {
    UniformRandomBackOffPolicy::DEFAULT_BACK_OFF_MIN_PERIOD
}

fn default_uniform_max_ms() -> u64 {
    UniformRandomBackOffPolicy::DEFAULT_BACK_OFF_MAX_PERIOD
}

fn default_exponential_initial_ms() -> u64 {
    ExponentialBackOffPolicy::DEFAULT_INITIAL_INTERVAL
}

fn default_multiplier() -> f64 {
    ExponentialBackOffPolicy::DEFAULT_MULTIPLIER
}

fn default_max_interval_ms() -> u64 {
    ExponentialBackOffPolicy::DEFAULT_MAX_INTERVAL
}

fn default_linear_initial_ms() -> u64 {
    LinearBackOffPolicy::DEFAULT_INITIAL_INTERVAL
}

fn default_linear_delta_ms() -> u64 {
    LinearBackOffPolicy::DEFAULT_DELTA_INTERVAL
}

/// A retry policy chosen at runtime.
#[derive(Debug, Clone)]
pub enum ConfiguredPolicy {
    /// See [`SimpleRetryPolicy`].
    Simple(SimpleRetryPolicy),
    /// See [`NeverRetryPolicy`].
    Never(NeverRetryPolicy),
    /// See [`TimeoutRetryPolicy`].
    Timeout(TimeoutRetryPolicy),
    /// See [`AlwaysRetryPolicy`].
    Always(AlwaysRetryPolicy),
}

/// Context of a [`ConfiguredPolicy`].
#[derive(Debug)]
pub enum ConfiguredRetryContext<E> {
    /// Context of the simple and always policies.
    Simple(SimpleRetryContext<E>),
    /// Context of the never policy.
    Never(NeverRetryContext<E>),
    /// Context of the timeout policy.
    Timeout(TimeoutRetryContext<E>),
}

impl<E> RetryStatus for ConfiguredRetryContext<E> {
    fn retry_count(&self) -> u32 {
        match self {
            Self::Simple(c) => c.retry_count(),
            Self::Never(c) => c.retry_count(),
            Self::Timeout(c) => c.retry_count(),
        }
    }
}

impl<E> RetryContext<E> for ConfiguredRetryContext<E> {
    fn last_failure(&self) -> Option<&E> {
        match self {
            Self::Simple(c) => c.last_failure(),
            Self::Never(c) => c.last_failure(),
            Self::Timeout(c) => c.last_failure(),
        }
    }

    fn register_failure(&mut self, failure: E) -> Result<(), PolicyError> {
        match self {
            Self::Simple(c) => c.register_failure(failure),
            Self::Never(c) => c.register_failure(failure),
            Self::Timeout(c) => c.register_failure(failure),
        }
    }

    fn take_last_failure(&mut self) -> Option<E> {
        match self {
            Self::Simple(c) => c.take_last_failure(),
            Self::Never(c) => c.take_last_failure(),
            Self::Timeout(c) => c.take_last_failure(),
        }
    }
}

impl<E: Classify> RetryPolicy<E> for ConfiguredPolicy {
    type Context = ConfiguredRetryContext<E>;

    fn open(&self) -> Self::Context {
        match self {
            Self::Simple(p) => ConfiguredRetryContext::Simple(RetryPolicy::<E>::open(p)),
            Self::Never(p) => ConfiguredRetryContext::Never(RetryPolicy::<E>::open(p)),
            Self::Timeout(p) => ConfiguredRetryContext::Timeout(RetryPolicy::<E>::open(p)),
            Self::Always(p) => ConfiguredRetryContext::Simple(RetryPolicy::<E>::open(p)),
        }
    }

    fn can_retry(&self, context: &Self::Context) -> bool {
        match (self, context) {
            (Self::Simple(p), ConfiguredRetryContext::Simple(c)) => {
                RetryPolicy::<E>::can_retry(p, c)
            }
            (Self::Never(p), ConfiguredRetryContext::Never(c)) => RetryPolicy::<E>::can_retry(p, c),
            (Self::Timeout(p), ConfiguredRetryContext::Timeout(c)) => {
                RetryPolicy::<E>::can_retry(p, c)
            }
            (Self::Always(p), ConfiguredRetryContext::Simple(c)) => {
                RetryPolicy::<E>::can_retry(p, c)
            }
            // Context opened by a different policy.
            _ => false,
        }
    }

    fn register_failure(&self, context: &mut Self::Context, failure: E) -> Result<(), PolicyError> {
        let opened_here = matches!(
            (self, &*context),
            (Self::Simple(_) | Self::Always(_), ConfiguredRetryContext::Simple(_))
                | (Self::Never(_), ConfiguredRetryContext::Never(_))
                | (Self::Timeout(_), ConfiguredRetryContext::Timeout(_))
        );
        if !opened_here {
            return Err(PolicyError::msg(
                "retry context was not opened by this policy",
            ));
        }
        context.register_failure(failure)
    }
}

/// A back-off policy chosen at runtime.
#[derive(Debug)]
pub enum ConfiguredBackOff {
    /// See [`NoBackOffPolicy`].
    None(NoBackOffPolicy),
    /// See [`FixedBackOffPolicy`].
    Fixed(FixedBackOffPolicy),
    /// See [`UniformRandomBackOffPolicy`].
    UniformRandom(UniformRandomBackOffPolicy),
    /// See [`ExponentialBackOffPolicy`].
    Exponential(ExponentialBackOffPolicy),
    /// See [`ExponentialRandomBackOffPolicy`].
    ExponentialRandom(ExponentialRandomBackOffPolicy),
    /// See [`LinearBackOffPolicy`].
    Linear(LinearBackOffPolicy),
}

/// Context of a [`ConfiguredBackOff`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredBackOffContext {
    /// Stateless policies.
    Stateless,
    /// Exponential progression.
    Exponential(ExponentialBackOffContext),
    /// Linear progression.
    Linear(LinearBackOffContext),
}

impl BackOffPolicy for ConfiguredBackOff {
    type Context = ConfiguredBackOffContext;

    fn start(&self, retry: Option<&dyn RetryStatus>) -> Self::Context {
        match self {
            Self::None(_) | Self::Fixed(_) | Self::UniformRandom(_) => {
                ConfiguredBackOffContext::Stateless
            }
            Self::Exponential(p) => ConfiguredBackOffContext::Exponential(p.start(retry)),
            Self::ExponentialRandom(p) => ConfiguredBackOffContext::Exponential(p.start(retry)),
            Self::Linear(p) => ConfiguredBackOffContext::Linear(p.start(retry)),
        }
    }

    fn back_off(&self, context: &mut Self::Context) {
        match (self, context) {
            (Self::None(p), _) => p.back_off(&mut ()),
            (Self::Fixed(p), _) => p.back_off(&mut ()),
            (Self::UniformRandom(p), _) => p.back_off(&mut ()),
            (Self::Exponential(p), ConfiguredBackOffContext::Exponential(c)) => p.back_off(c),
            (Self::ExponentialRandom(p), ConfiguredBackOffContext::Exponential(c)) => {
                p.back_off(c)
            }
            (Self::Linear(p), ConfiguredBackOffContext::Linear(c)) => p.back_off(c),
            // Context from another policy: restart the progression.
            (_, context) => {
                *context = self.start(None);
                self.back_off(context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::RecordingSleeper;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(
            config.policy,
            PolicyConfig::Simple {
                max_attempts: 3,
                retryable: vec!["any".to_string()],
            }
        );
        assert_eq!(
            config.back_off,
            BackOffConfig::Exponential {
                initial_ms: 100,
                multiplier: 2.0,
                max_ms: 30_000,
            }
        );
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config: RetryConfig = serde_json::from_str(
            r#"{
                "policy": { "type": "simple", "max_attempts": 5, "retryable": ["io"] },
                "back_off": { "type": "exponential", "initial_ms": 50, "multiplier": 1.5 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.policy,
            PolicyConfig::Simple {
                max_attempts: 5,
                retryable: vec!["io".to_string()],
            }
        );
        assert_eq!(
            config.back_off,
            BackOffConfig::Exponential {
                initial_ms: 50,
                multiplier: 1.5,
                max_ms: 30_000,
            }
        );
    }

    #[test]
    fn test_variant_defaults() {
        let policy: PolicyConfig = serde_json::from_str(r#"{ "type": "timeout" }"#).unwrap();
        assert_eq!(policy, PolicyConfig::Timeout { timeout_ms: 1000 });

        let back_off: BackOffConfig = serde_json::from_str(r#"{ "type": "linear" }"#).unwrap();
        assert_eq!(
            back_off,
            BackOffConfig::Linear {
                initial_ms: 1000,
                delta_ms: 1000,
                max_ms: 30_000,
            }
        );

        let back_off: BackOffConfig =
            serde_json::from_str(r#"{ "type": "uniform_random", "max_ms": 900 }"#).unwrap();
        assert_eq!(
            back_off,
            BackOffConfig::UniformRandom {
                min_ms: 500,
                max_ms: 900,
            }
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(RetryConfig::no_retry()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "policy": { "type": "never" },
                "back_off": { "type": "none" }
            })
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<PolicyConfig, _> = serde_json::from_str(r#"{ "type": "forever" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_built_proxy_runs() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let config = RetryConfig::new()
            .policy(PolicyConfig::Simple {
                max_attempts: 4,
                retryable: vec!["io".to_string()],
            })
            .back_off(BackOffConfig::Linear {
                initial_ms: 10,
                delta_ms: 5,
                max_ms: 100,
            });
        let proxy = config.build_with_sleeper(sleeper.clone());

        let mut attempts = 0;
        let result = proxy.call(|| {
            attempts += 1;
            if attempts < 4 {
                Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"))
            } else {
                Ok(attempts)
            }
        });

        assert_eq!(result.unwrap(), 4);
        assert_eq!(sleeper.back_offs(), vec![10, 15, 20]);
    }

    #[test]
    fn test_configured_never_policy() {
        let proxy = RetryConfig::no_retry().build();

        let err = proxy
            .call(|| Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "boom")))
            .unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(proxy.attempt_count(), 1);
    }

    #[test]
    fn test_configured_exponential_random() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let back_off = BackOffConfig::ExponentialRandom {
            initial_ms: 100,
            multiplier: 2.0,
            max_ms: 1000,
        }
        .build(sleeper.clone());

        let mut context = back_off.start(None);
        for _ in 0..3 {
            back_off.back_off(&mut context);
        }

        let pauses = sleeper.back_offs();
        assert_eq!(pauses.len(), 3);
        for (pause, base) in pauses.into_iter().zip([100, 200, 400]) {
            assert!(pause >= base && pause < base * 2);
        }
    }

    #[test]
    fn test_mismatched_back_off_context_restarts() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let back_off = BackOffConfig::Exponential {
            initial_ms: 20,
            multiplier: 2.0,
            max_ms: 1000,
        }
        .build(sleeper.clone());

        let mut context = ConfiguredBackOffContext::Stateless;
        back_off.back_off(&mut context);
        back_off.back_off(&mut context);

        assert_eq!(sleeper.back_offs(), vec![20, 40]);
    }

    #[test]
    fn test_mismatched_retry_context_is_rejected() {
        let policy = PolicyConfig::Never.build();
        let mut context: ConfiguredRetryContext<std::io::Error> =
            ConfiguredRetryContext::Simple(SimpleRetryContext::new());

        assert!(!RetryPolicy::<std::io::Error>::can_retry(&policy, &context));
        let err = RetryPolicy::<std::io::Error>::register_failure(
            &policy,
            &mut context,
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "retry context was not opened by this policy");
    }
}
