//! Retry policy for throttled provider calls
//!
//! Only throttling and temporary-unavailability outcomes are retried. The
//! delay before attempt `i + 1` is `base_delay * 2^(i-1)` capped at
//! `max_delay`, optionally replaced by a uniform draw from `[0, delay]`
//! (full jitter).

use crate::providers::error::{ProviderError, ProviderResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any computed delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Draw the actual sleep uniformly from zero to the computed delay
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_attempts() -> u32 { 6 }
fn default_base_delay_ms() -> u64 { 400 }
fn default_max_delay_ms() -> u64 { 8_000 }
fn default_jitter() -> bool { true }

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and default delays
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Reject policies that could never make an attempt
    pub fn validate(&self) -> ProviderResult<()> {
        if self.max_attempts == 0 {
            return Err(ProviderError::Configuration(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ProviderError::Configuration(
                "retry max_delay_ms must be >= base_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the outcome of attempt `attempt` (1-indexed) warrants another
    /// attempt
    pub fn should_retry<T>(&self, attempt: u32, outcome: &ProviderResult<T>) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        match outcome {
            Err(error) => error.is_transient(),
            Ok(_) => false,
        }
    }

    /// Exponential delay after attempt `attempt` (1-indexed), before jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Actual sleep after attempt `attempt`, drawing jitter from `rng`
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let computed = self.backoff_delay(attempt);
        if !self.jitter || computed.is_zero() {
            return computed;
        }

        let millis = rng.gen_range(0..=computed.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn throttled() -> ProviderResult<()> {
        Err(ProviderError::from_status(429, None, None))
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.base_delay_ms, 400);
        assert_eq!(policy.max_delay_ms, 8_000);
        assert!(policy.jitter);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let policy = RetryPolicy::new(10)
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(1000))
            .with_jitter(false);

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(policy.delay_for(1, &mut rng).as_millis(), 100);
        assert_eq!(policy.delay_for(2, &mut rng).as_millis(), 200);
        assert_eq!(policy.delay_for(3, &mut rng).as_millis(), 400);
        assert_eq!(policy.delay_for(4, &mut rng).as_millis(), 800);
        // Capped
        assert_eq!(policy.delay_for(5, &mut rng).as_millis(), 1000);
        assert_eq!(policy.delay_for(60, &mut rng).as_millis(), 1000);
    }

    #[test]
    fn test_full_jitter_stays_within_computed_delay() {
        let policy = RetryPolicy::new(5)
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(10_000));
        let mut rng = StdRng::seed_from_u64(42);

        for attempt in 1..=5 {
            let ceiling = policy.backoff_delay(attempt);
            for _ in 0..50 {
                assert!(policy.delay_for(attempt, &mut rng) <= ceiling);
            }
        }
    }

    #[test]
    fn test_jitter_is_deterministic_for_a_seed() {
        let policy = RetryPolicy::default();
        let mut a = StdRng::seed_from_u64(1234);
        let mut b = StdRng::seed_from_u64(1234);

        let first: Vec<_> = (1..=4).map(|i| policy.delay_for(i, &mut a)).collect();
        let second: Vec<_> = (1..=4).map(|i| policy.delay_for(i, &mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_should_retry_logic() {
        let policy = RetryPolicy::new(3);

        assert!(policy.should_retry(1, &throttled()));
        assert!(policy.should_retry(2, &throttled()));
        assert!(!policy.should_retry(3, &throttled())); // Budget spent

        let unavailable: ProviderResult<()> = Err(ProviderError::from_status(503, None, None));
        assert!(policy.should_retry(1, &unavailable));

        let server_error: ProviderResult<()> = Err(ProviderError::from_status(500, None, None));
        assert!(!policy.should_retry(1, &server_error));

        let network: ProviderResult<()> = Err(ProviderError::Network("reset".to_string()));
        assert!(!policy.should_retry(1, &network));

        assert!(!policy.should_retry(1, &Ok::<_, ProviderError>("done")));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        assert!(matches!(
            RetryPolicy::new(0).validate(),
            Err(ProviderError::Configuration(_))
        ));

        let inverted = RetryPolicy::new(2)
            .with_base_delay(Duration::from_secs(5))
            .with_max_delay(Duration::from_secs(1));
        assert!(inverted.validate().is_err());
    }
}
