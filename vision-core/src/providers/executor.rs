//! Execution of one logical provider request
//!
//! A logical request takes a single concurrency permit and keeps it across
//! every retry attempt. Cancellation is observed while waiting for the permit,
//! while a call is in flight, and while sleeping between attempts.

use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::limiter::ConcurrencyLimiter;
use crate::providers::retry::RetryPolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of a logical request together with retry bookkeeping
#[derive(Debug)]
pub struct RetryResult<T> {
    /// Final outcome, returned unchanged from the last attempt
    pub outcome: ProviderResult<T>,

    /// Number of attempts actually issued
    pub attempts: u32,

    /// Total time spent sleeping between attempts
    pub total_delay: Duration,
}

impl<T> RetryResult<T> {
    fn new(outcome: ProviderResult<T>, attempts: u32, total_delay: Duration) -> Self {
        Self {
            outcome,
            attempts,
            total_delay,
        }
    }
}

/// Composes a [`ConcurrencyLimiter`] and a [`RetryPolicy`]
pub struct RequestExecutor {
    limiter: Arc<ConcurrencyLimiter>,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl RequestExecutor {
    /// Create an executor sharing `limiter` with other executors
    pub fn new(limiter: Arc<ConcurrencyLimiter>, policy: RetryPolicy) -> ProviderResult<Self> {
        policy.validate()?;
        Ok(Self {
            limiter,
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Seed the jitter source, for reproducible delays
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &Arc<ConcurrencyLimiter> {
        &self.limiter
    }

    /// Run `operation` with concurrency bounding and retries
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, operation: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        self.execute_detailed(cancel, operation).await.outcome
    }

    /// Like [`execute`](Self::execute), also reporting attempts and delays
    pub async fn execute_detailed<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut attempts = 0;
        let mut total_delay = Duration::ZERO;

        let _permit = match self.limiter.acquire(cancel).await {
            Ok(permit) => permit,
            Err(error) => return RetryResult::new(Err(error), attempts, total_delay),
        };

        loop {
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                outcome = operation() => outcome,
            };

            if matches!(outcome, Err(ProviderError::Cancelled)) {
                debug!("Request cancelled during attempt {}", attempts);
                return RetryResult::new(outcome, attempts, total_delay);
            }

            if !self.policy.should_retry(attempts, &outcome) {
                if let Err(ref error) = outcome {
                    if error.is_transient() {
                        warn!(
                            "Giving up after {} attempts, provider still unavailable: {}",
                            attempts, error
                        );
                    }
                }
                return RetryResult::new(outcome, attempts, total_delay);
            }

            let delay = self.next_delay(attempts);
            if let Err(ref error) = outcome {
                warn!(
                    "Attempt {}/{} throttled ({}), retrying in {:?}",
                    attempts, self.policy.max_attempts, error, delay
                );
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Request cancelled during backoff after attempt {}", attempts);
                    return RetryResult::new(Err(ProviderError::Cancelled), attempts, total_delay);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            total_delay += delay;
        }
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.policy.delay_for(attempt, &mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor(max_attempts: u32) -> RequestExecutor {
        let limiter = Arc::new(ConcurrencyLimiter::new(1).unwrap());
        let policy = RetryPolicy::new(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_jitter(false);
        RequestExecutor::new(limiter, policy).unwrap().with_seed(1)
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1).unwrap());
        assert!(matches!(
            RequestExecutor::new(limiter, RetryPolicy::new(0)),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_returned_immediately() {
        let executor = executor(5);
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result: RetryResult<()> = executor
            .execute_detailed(&cancel, || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::from_status(400, None, Some("bad".to_string())))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.total_delay, Duration::ZERO);
        match result.outcome {
            Err(ProviderError::Status { status, body, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(body.as_deref(), Some("bad"));
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let executor = executor(3);
        let cancel = CancellationToken::new();

        let value = executor.execute(&cancel, || async { Ok("ok") }).await;
        assert_eq!(value.unwrap(), "ok");
    }
}
