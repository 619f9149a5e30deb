//! Exponential back-off, with and without randomization.

use super::{clamp_interval, clamp_multiplier, BackOffPolicy};
use crate::context::RetryStatus;
use crate::sleeper::{Sleeper, ThreadSleeper};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Progression state of one exponential back-off sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackOffContext {
    seed: u64,
    multiplier: f64,
    max: u64,
    interval: u64,
}

impl ExponentialBackOffContext {
    /// Create a context starting at `seed`.
    pub fn new(seed: u64, multiplier: f64, max: u64) -> Self {
        let seed = clamp_interval(seed);
        Self {
            seed,
            multiplier: clamp_multiplier(multiplier),
            max: clamp_interval(max),
            interval: seed,
        }
    }

    /// Return the pause to use now and advance the progression.
    ///
    /// Once the interval has grown past `max`, `max` is returned and the
    /// interval stops growing.
    pub fn interval_and_increment(&mut self) -> u64 {
        if self.interval > self.max {
            return self.max;
        }
        let interval = self.interval;
        self.interval = self.next_interval();
        interval
    }

    /// The current interval.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// The interval that follows the current one.
    pub fn next_interval(&self) -> u64 {
        (self.interval as f64 * self.multiplier) as u64
    }

    /// Restart the progression from the seed.
    pub fn reset_interval(&mut self) {
        self.interval = self.seed;
    }

    /// The growth factor.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// The interval ceiling.
    pub fn max(&self) -> u64 {
        self.max
    }
}

/// Multiplies the pause by a fixed factor after every retry, up to a cap.
#[derive(Debug, Clone)]
pub struct ExponentialBackOffPolicy {
    initial_interval: u64,
    multiplier: f64,
    max_interval: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl ExponentialBackOffPolicy {
    /// Default initial interval in milliseconds.
    pub const DEFAULT_INITIAL_INTERVAL: u64 = 100;
    /// Default multiplier (100% increase per back-off).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;
    /// Default maximum interval in milliseconds.
    pub const DEFAULT_MAX_INTERVAL: u64 = 30_000;

    /// Create a policy with the given progression.
    #[must_use]
    pub fn new(initial_interval: u64, multiplier: f64, max_interval: u64) -> Self {
        Self {
            initial_interval: clamp_interval(initial_interval),
            multiplier: clamp_multiplier(multiplier),
            max_interval: clamp_interval(max_interval),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Use the given sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The first pause.
    pub fn initial_interval(&self) -> u64 {
        self.initial_interval
    }

    /// Set the first pause. Values below 1 are raised to 1.
    pub fn set_initial_interval(&mut self, initial_interval: u64) {
        self.initial_interval = clamp_interval(initial_interval);
    }

    /// The growth factor.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Set the growth factor. Values below 1.0 are raised to 1.0.
    ///
    /// Values much larger than 1.0 reach the maximum very quickly.
    pub fn set_multiplier(&mut self, multiplier: f64) {
        self.multiplier = clamp_multiplier(multiplier);
    }

    /// The longest pause.
    pub fn max_interval(&self) -> u64 {
        self.max_interval
    }

    /// Set the longest pause. Values below 1 are raised to 1.
    pub fn set_max_interval(&mut self, max_interval: u64) {
        self.max_interval = clamp_interval(max_interval);
    }

    /// Replace the sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    fn new_context(&self) -> ExponentialBackOffContext {
        ExponentialBackOffContext::new(self.initial_interval, self.multiplier, self.max_interval)
    }
}

impl Default for ExponentialBackOffPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_INITIAL_INTERVAL,
            Self::DEFAULT_MULTIPLIER,
            Self::DEFAULT_MAX_INTERVAL,
        )
    }
}

impl BackOffPolicy for ExponentialBackOffPolicy {
    type Context = ExponentialBackOffContext;

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {
        self.new_context()
    }

    fn back_off(&self, context: &mut Self::Context) {
        self.sleeper.sleep(context.interval_and_increment());
    }
}

/// Exponential back-off that pauses for a random multiple of each interval.
///
/// The pause is `interval * (1 + r * (multiplier - 1))` with `r` drawn
/// from `[0, 1)`, so it lies between the current interval and the next
/// one. The interval progression itself is the same as in
/// [`ExponentialBackOffPolicy`].
///
/// With an initial interval of 50 and a multiplier of 2.0 the plain
/// policy yields `[50, 100, 200, 400, 800]`; this one may yield
/// `[50, 150, 210, 700, 1000]`.
#[derive(Debug)]
pub struct ExponentialRandomBackOffPolicy {
    inner: ExponentialBackOffPolicy,
    rng: Mutex<StdRng>,
}

impl ExponentialRandomBackOffPolicy {
    /// Create a policy with the given progression.
    #[must_use]
    pub fn new(initial_interval: u64, multiplier: f64, max_interval: u64) -> Self {
        Self {
            inner: ExponentialBackOffPolicy::new(initial_interval, multiplier, max_interval),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use the given sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.inner.set_sleeper(sleeper);
        self
    }

    /// Use the given random source.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// The first base interval.
    pub fn initial_interval(&self) -> u64 {
        self.inner.initial_interval()
    }

    /// Set the first base interval. Values below 1 are raised to 1.
    pub fn set_initial_interval(&mut self, initial_interval: u64) {
        self.inner.set_initial_interval(initial_interval);
    }

    /// The growth factor.
    pub fn multiplier(&self) -> f64 {
        self.inner.multiplier()
    }

    /// Set the growth factor. Values below 1.0 are raised to 1.0.
    pub fn set_multiplier(&mut self, multiplier: f64) {
        self.inner.set_multiplier(multiplier);
    }

    /// The largest base interval.
    pub fn max_interval(&self) -> u64 {
        self.inner.max_interval()
    }

    /// Set the largest base interval. Values below 1 are raised to 1.
    pub fn set_max_interval(&mut self, max_interval: u64) {
        self.inner.set_max_interval(max_interval);
    }

    /// Replace the sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.inner.set_sleeper(sleeper);
    }
}

impl Default for ExponentialRandomBackOffPolicy {
    fn default() -> Self {
        Self::new(
            ExponentialBackOffPolicy::DEFAULT_INITIAL_INTERVAL,
            ExponentialBackOffPolicy::DEFAULT_MULTIPLIER,
            ExponentialBackOffPolicy::DEFAULT_MAX_INTERVAL,
        )
    }
}

impl BackOffPolicy for ExponentialRandomBackOffPolicy {
    type Context = ExponentialBackOffContext;

    fn start(&self, _retry: Option<&dyn RetryStatus>) -> Self::Context {
        self.inner.new_context()
    }

    fn back_off(&self, context: &mut Self::Context) {
        let base = context.interval_and_increment();
        let r: f64 = self.rng.lock().gen();
        let pause = (base as f64 * (1.0 + r * (context.multiplier() - 1.0))) as u64;
        self.inner.sleeper.sleep(clamp_interval(pause));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::RecordingSleeper;
    use pretty_assertions::assert_eq;

    fn recorder() -> Arc<RecordingSleeper> {
        Arc::new(RecordingSleeper::new())
    }

    #[test]
    fn test_single_back_off() {
        let sleeper = recorder();
        let policy = ExponentialBackOffPolicy::default().with_sleeper(sleeper.clone());

        let mut context = policy.start(None);
        policy.back_off(&mut context);

        assert_eq!(
            sleeper.last_back_off(),
            Some(ExponentialBackOffPolicy::DEFAULT_INITIAL_INTERVAL)
        );
    }

    #[test]
    fn test_maximum_back_off() {
        let sleeper = recorder();
        let mut policy = ExponentialBackOffPolicy::default().with_sleeper(sleeper.clone());
        policy.set_max_interval(50);

        let mut context = policy.start(None);
        policy.back_off(&mut context);

        assert_eq!(sleeper.last_back_off(), Some(50));
    }

    #[test]
    fn test_multi_back_off() {
        let sleeper = recorder();
        let mut policy = ExponentialBackOffPolicy::default().with_sleeper(sleeper.clone());
        policy.set_initial_interval(40);
        policy.set_multiplier(1.2);

        let mut context = policy.start(None);
        for _ in 0..5 {
            policy.back_off(&mut context);
        }

        assert_eq!(sleeper.back_offs(), vec![40, 48, 57, 68, 81]);
    }

    #[test]
    fn test_sequence_is_capped() {
        let sleeper = recorder();
        let policy = ExponentialBackOffPolicy::new(100, 2.0, 1000).with_sleeper(sleeper.clone());

        let mut context = policy.start(None);
        for _ in 0..8 {
            policy.back_off(&mut context);
        }

        assert_eq!(
            sleeper.back_offs(),
            vec![100, 200, 400, 800, 1000, 1000, 1000, 1000]
        );
        assert_eq!(context.interval(), 1600);
    }

    #[test]
    fn test_contexts_are_independent() {
        let sleeper = recorder();
        let policy = ExponentialBackOffPolicy::new(10, 3.0, 1000).with_sleeper(sleeper.clone());

        let mut first = policy.start(None);
        policy.back_off(&mut first);
        policy.back_off(&mut first);
        let mut second = policy.start(None);
        policy.back_off(&mut second);

        assert_eq!(sleeper.back_offs(), vec![10, 30, 10]);
    }

    #[test]
    fn test_context_reset() {
        let mut context = ExponentialBackOffContext::new(5, 2.0, 100);
        context.interval_and_increment();
        context.interval_and_increment();
        assert_eq!(context.interval(), 20);
        assert_eq!(context.next_interval(), 40);

        context.reset_interval();
        assert_eq!(context.interval(), 5);
    }

    #[test]
    fn test_context_clamps() {
        let context = ExponentialBackOffContext::new(0, 0.1, 0);
        assert_eq!(context.interval(), 1);
        assert_eq!(context.multiplier(), 1.0);
        assert_eq!(context.max(), 1);
    }

    #[test]
    fn test_policy_setters_clamp() {
        let mut policy = ExponentialBackOffPolicy::default();
        policy.set_initial_interval(0);
        policy.set_multiplier(-3.0);
        policy.set_max_interval(0);

        assert_eq!(policy.initial_interval(), 1);
        assert_eq!(policy.multiplier(), 1.0);
        assert_eq!(policy.max_interval(), 1);
    }

    fn randomize(rng: &mut StdRng, base: u64, multiplier: f64) -> u64 {
        let r: f64 = rng.gen();
        (base as f64 * (1.0 + r * (multiplier - 1.0))) as u64
    }

    #[test]
    fn test_random_single_back_off() {
        let sleeper = recorder();
        let policy = ExponentialRandomBackOffPolicy::default()
            .with_sleeper(sleeper.clone())
            .with_rng(StdRng::seed_from_u64(1));

        let mut context = policy.start(None);
        policy.back_off(&mut context);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sleeper.last_back_off(), Some(randomize(&mut rng, 100, 2.0)));
    }

    #[test]
    fn test_random_maximum_back_off() {
        let sleeper = recorder();
        let mut policy = ExponentialRandomBackOffPolicy::default()
            .with_sleeper(sleeper.clone())
            .with_rng(StdRng::seed_from_u64(1));
        policy.set_max_interval(50);

        let mut context = policy.start(None);
        policy.back_off(&mut context);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sleeper.last_back_off(), Some(randomize(&mut rng, 50, 2.0)));
    }

    #[test]
    fn test_random_multi_back_off() {
        let sleeper = recorder();
        let mut policy = ExponentialRandomBackOffPolicy::default()
            .with_sleeper(sleeper.clone())
            .with_rng(StdRng::seed_from_u64(7));
        policy.set_initial_interval(40);
        policy.set_multiplier(1.2);

        let mut context = policy.start(None);
        for _ in 0..5 {
            policy.back_off(&mut context);
        }

        let mut rng = StdRng::seed_from_u64(7);
        let expected: Vec<u64> = [40, 48, 57, 68, 81]
            .into_iter()
            .map(|base| randomize(&mut rng, base, 1.2))
            .collect();
        assert_eq!(sleeper.back_offs(), expected);
    }

    #[test]
    fn test_random_pause_between_interval_and_next() {
        let sleeper = recorder();
        let policy =
            ExponentialRandomBackOffPolicy::new(100, 2.0, 100_000).with_sleeper(sleeper.clone());

        let mut context = policy.start(None);
        for _ in 0..6 {
            policy.back_off(&mut context);
        }

        let bases = [100u64, 200, 400, 800, 1600, 3200];
        for (pause, base) in sleeper.back_offs().into_iter().zip(bases) {
            assert!(pause >= base && pause < base * 2, "{pause} not in [{base}, {})", base * 2);
        }
    }
}
