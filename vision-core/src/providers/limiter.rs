//! Process-wide bound on concurrent outbound provider calls

use crate::providers::error::{ProviderError, ProviderResult};
use std::future::Future;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Counting permit pool shared by every caller of one provider
///
/// Waiters are not served in any guaranteed order; only the capacity bound
/// holds.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Semaphore,
    capacity: usize,
}

/// A held slot in the permit pool, released when dropped
#[derive(Debug)]
pub struct LimiterPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl ConcurrencyLimiter {
    /// Create a limiter allowing `capacity` concurrent calls
    pub fn new(capacity: usize) -> ProviderResult<Self> {
        if capacity == 0 {
            return Err(ProviderError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(ProviderError::Configuration(format!(
                "max_concurrency must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        })
    }

    /// Create a limiter from a signed capacity, rejecting values below 1
    pub fn with_capacity(capacity: i64) -> ProviderResult<Self> {
        if capacity <= 0 {
            return Err(ProviderError::Configuration(format!(
                "max_concurrency must be at least 1, got {}",
                capacity
            )));
        }
        let capacity = usize::try_from(capacity).map_err(|_| {
            ProviderError::Configuration(format!("max_concurrency {} is too large", capacity))
        })?;
        Self::new(capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for a permit or for `cancel` to fire
    ///
    /// If cancellation wins, no permit is taken.
    pub async fn acquire(&self, cancel: &CancellationToken) -> ProviderResult<LimiterPermit<'_>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled while waiting for a concurrency permit");
                Err(ProviderError::Cancelled)
            }
            permit = self.semaphore.acquire() => {
                let permit = permit.map_err(|_| {
                    ProviderError::Configuration("concurrency limiter is closed".to_string())
                })?;
                Ok(LimiterPermit { _permit: permit })
            }
        }
    }

    /// Run `operation` while holding one permit
    ///
    /// `operation` is never started if cancellation fires first. Once started
    /// it is dropped as soon as `cancel` fires. The permit is released on every
    /// exit path.
    pub async fn run<F, Fut, T>(&self, cancel: &CancellationToken, operation: F) -> ProviderResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let _permit = self.acquire(cancel).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = operation() => result,
        }
    }
}
