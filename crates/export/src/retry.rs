//! Exponential-backoff retry for transport failures.
//!
//! Only [`TransportError`]s pass through here, and a closed client is never
//! retried. GraphQL errors are decoded from the response after the retry
//! loop has returned, so a query that the server rejects is attempted
//! exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::future::retry_notify;
use backoff::{Error as BackoffError, ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::warn;

use crate::error::{ExportError, TransportError};

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How often and how patiently to retry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    /// Sleep before the first retry.
    pub initial_backoff: Duration,
    /// Growth factor applied to the sleep after every retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(300),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Sleep schedule between attempts: 300ms, 600ms, 1.2s, ... capped at
    /// one minute. Jitter is off so the schedule is predictable.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(f64::from(self.multiplier))
            .with_randomization_factor(0.0)
            .with_max_interval(MAX_BACKOFF)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// The operation is re-invoked for every attempt, so anything it acquires
/// (such as a concurrency permit) is released before the backoff sleep.
///
/// # Errors
///
/// Returns `ExportError::Transport` carrying the last failure and the number
/// of attempts made.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    scope: &str,
    mut operation: F,
) -> Result<T, ExportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let attempts = AtomicU32::new(0);

    let result = retry_notify(
        policy.backoff(),
        || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let pending = operation();
            async move {
                pending.await.map_err(|err| {
                    if attempt < max_attempts && err.is_retryable() {
                        BackoffError::transient(err)
                    } else {
                        BackoffError::permanent(err)
                    }
                })
            }
        },
        |err: TransportError, wait: Duration| {
            let retry_after = match &err {
                TransportError::RateLimited { retry_after } => *retry_after,
                _ => None,
            };
            warn!(
                scope,
                attempt = attempts.load(Ordering::Relaxed),
                max_attempts,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                retry_after_secs = retry_after,
                error = %err,
                "Retrying request"
            );
        },
    )
    .await;

    result.map_err(|source| ExportError::Transport {
        scope: scope.to_string(),
        attempts: attempts.load(Ordering::Relaxed).max(1),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use backoff::backoff::Backoff;

    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
        }
    }

    fn unavailable() -> TransportError {
        TransportError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        }
    }

    #[test]
    fn test_default_delays_double() {
        let mut backoff = RetryPolicy::default().backoff();
        let delays: Vec<_> = (0..3).map(|_| backoff.next_backoff().unwrap()).collect();
        assert_eq!(
            delays,
            [
                Duration::from_millis(300),
                Duration::from_millis(600),
                Duration::from_millis(1200)
            ]
        );
    }

    #[test]
    fn test_delay_is_capped() {
        let mut backoff = RetryPolicy::default().backoff();
        let last = (0..40).filter_map(|_| backoff.next_backoff()).last().unwrap();
        assert_eq!(last, MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_retries_sleep_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(20),
            multiplier: 2,
        };
        let started = std::time::Instant::now();
        let _ = with_retry(&policy, "test", || async { Err::<(), _>(unavailable()) }).await;

        // 20ms + 40ms of backoff before the third attempt.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(2), "test", || {
            let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                if n == 1 {
                    Err(TransportError::RateLimited { retry_after: Some(1) })
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(3), "test", || {
            let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
            async move { if n < 3 { Err(unavailable()) } else { Ok(n) } }
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(3), "tour tour_1 shows", || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err::<(), _>(unavailable()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::Relaxed), 3);
        match err {
            ExportError::Transport { scope, attempts, source } => {
                assert_eq!(scope, "tour tour_1 shows");
                assert_eq!(attempts, 3);
                assert!(matches!(source, TransportError::Status { status: 503, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_retry_policy_attempts_once() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&RetryPolicy::no_retry(), "test", || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err::<(), _>(TransportError::RateLimited { retry_after: Some(1) }) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(matches!(err, ExportError::Transport { attempts: 1, .. }));
    }
}
