//! Tests for retry behavior of the request executor

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use vision_core::providers::{
    ConcurrencyLimiter, ProviderError, ProviderResult, RequestExecutor, RetryPolicy,
};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts)
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(4))
        .with_jitter(false)
}

fn executor(capacity: usize, policy: RetryPolicy) -> RequestExecutor {
    let limiter = Arc::new(ConcurrencyLimiter::new(capacity).unwrap());
    RequestExecutor::new(limiter, policy).unwrap().with_seed(7)
}

fn throttled() -> ProviderError {
    ProviderError::from_status(429, Some("Too Many Requests".to_string()), None)
}

#[tokio::test]
async fn test_throttled_twice_then_success() {
    let executor = executor(1, fast_policy(3));
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let result = executor
        .execute_detailed(&cancel, || {
            let calls = calls.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(throttled())
                } else {
                    Ok("analyzed")
                }
            }
        })
        .await;

    assert_eq!(result.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.outcome.unwrap(), "analyzed");
    // 1ms + 2ms without jitter
    assert_eq!(result.total_delay, Duration::from_millis(3));
}

#[tokio::test]
async fn test_always_throttled_returns_terminal_throttle() {
    for max_attempts in [1u32, 2, 4] {
        let executor = executor(1, fast_policy(max_attempts));
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result: vision_core::providers::RetryResult<()> = executor
            .execute_detailed(&cancel, || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(throttled())
                }
            })
            .await;

        assert_eq!(result.attempts, max_attempts);
        assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
        match result.outcome {
            Err(ProviderError::Transient { status, reason, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(reason.as_deref(), Some("Too Many Requests"));
            }
            other => panic!("Expected terminal throttle, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_unavailable_is_retried_like_throttling() {
    let executor = executor(1, fast_policy(3));
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let outcome: ProviderResult<u8> = executor
        .execute(&cancel, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::from_status(503, None, None))
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.unwrap_err().status(), Some(503));
}

#[tokio::test]
async fn test_transport_failures_are_not_retried() {
    let executor = executor(1, fast_policy(5));
    let cancel = CancellationToken::new();

    for error in [
        ProviderError::Timeout,
        ProviderError::Network("connection reset".to_string()),
        ProviderError::from_status(500, None, Some("boom".to_string())),
    ] {
        let calls = Arc::new(AtomicU32::new(0));
        let result: vision_core::providers::RetryResult<()> = executor
            .execute_detailed(&cancel, || {
                let calls = calls.clone();
                let error = error.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(error)
                }
            })
            .await;

        assert_eq!(result.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.outcome.is_err());
    }
}

#[tokio::test]
async fn test_cancel_during_backoff_stops_before_next_attempt() {
    let policy = RetryPolicy::new(5)
        .with_base_delay(Duration::from_secs(10))
        .with_max_delay(Duration::from_secs(10))
        .with_jitter(false);
    let executor = Arc::new(executor(1, policy));
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let attempted = Arc::new(Notify::new());

    let task = {
        let executor = executor.clone();
        let cancel = cancel.clone();
        let calls = calls.clone();
        let attempted = attempted.clone();
        tokio::spawn(async move {
            executor
                .execute_detailed(&cancel, || {
                    let calls = calls.clone();
                    let attempted = attempted.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        attempted.notify_one();
                        Err::<(), _>(throttled())
                    }
                })
                .await
        })
    };

    attempted.notified().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let started = Instant::now();
    cancel.cancel();

    let result = task.await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(result.outcome, Err(ProviderError::Cancelled)));
    assert_eq!(result.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.total_delay, Duration::ZERO);
}

#[tokio::test]
async fn test_cancel_while_waiting_for_permit_never_calls() {
    let limiter = Arc::new(ConcurrencyLimiter::new(1).unwrap());
    let executor = RequestExecutor::new(limiter.clone(), fast_policy(3)).unwrap();
    let outer = CancellationToken::new();
    let _held = limiter.acquire(&outer).await.unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let calls = AtomicU32::new(0);
    let result: vision_core::providers::RetryResult<()> = executor
        .execute_detailed(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

    assert!(matches!(result.outcome, Err(ProviderError::Cancelled)));
    assert_eq!(result.attempts, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_permit_is_held_across_retries() {
    let policy = RetryPolicy::new(3)
        .with_base_delay(Duration::from_millis(15))
        .with_max_delay(Duration::from_millis(15))
        .with_jitter(false);
    let executor = Arc::new(executor(1, policy));
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let first_started = Arc::new(Notify::new());

    let first = {
        let executor = executor.clone();
        let log = log.clone();
        let first_started = first_started.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let attempts = Arc::new(AtomicU32::new(0));
            executor
                .execute(&cancel, || {
                    let log = log.clone();
                    let attempts = attempts.clone();
                    let first_started = first_started.clone();
                    async move {
                        log.lock().unwrap().push("first");
                        first_started.notify_one();
                        if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(throttled())
                        } else {
                            Ok(())
                        }
                    }
                })
                .await
        })
    };

    first_started.notified().await;

    let second = {
        let executor = executor.clone();
        let log = log.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            executor
                .execute(&cancel, || {
                    let log = log.clone();
                    async move {
                        log.lock().unwrap().push("second");
                        Ok(())
                    }
                })
                .await
        })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let log = log.lock().unwrap().clone();
    assert_eq!(log, vec!["first", "first", "first", "second"]);
}
