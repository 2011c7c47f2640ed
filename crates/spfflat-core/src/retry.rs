//! Retry wrapper for provider calls.
//!
//! Rate-limit and transient errors back off exponentially and retry up
//! to the attempt budget; permanent errors fail immediately. Every wait
//! (limiter and backoff alike) observes the caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CoreError;
use crate::limiter::RateLimiter;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after the `attempt`-th failure (1-based):
    /// `base_delay * multiplier^(attempt-1)`, capped at `max_delay`,
    /// with up to 10% jitter added when enabled.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32 - 1);
        let capped = exp.min(self.max_delay.as_secs_f64());
        let jittered = if self.jitter {
            capped * (1.0 + rand::thread_rng().gen_range(-0.1..0.1))
        } else {
            capped
        };
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Run `call` under the retry policy, waiting on `limiter` before every
/// attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    cancel: &CancellationToken,
    operation: &str,
    mut call: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        limiter.acquire_cancellable(cancel).await?;

        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "provider call failed, backing off"
                );
                last_error = Some(e);
                if attempt < policy.max_attempts {
                    let delay = policy.backoff_delay(attempt);
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }

    match last_error {
        Some(source) => Err(CoreError::RetriesExhausted {
            operation: operation.to_string(),
            attempts: policy.max_attempts,
            source: Box::new(source),
        }),
        None => Err(CoreError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(8),
            jitter: false,
        }
    }

    fn fast_limiter() -> RateLimiter {
        RateLimiter::new(10_000.0, 1)
    }

    fn rate_limit_error() -> CoreError {
        CoreError::Provider(spfflat_provider::Error::RateLimited {
            status: 429,
            message: "slow down".into(),
        })
    }

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let policy = RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(6), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.backoff_delay(2).as_secs_f64();
            assert!((1.8..=2.2).contains(&delay), "delay {delay} out of range");
        }
    }

    #[tokio::test]
    async fn retries_rate_limit_errors_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(
            &fast_policy(),
            &fast_limiter(),
            &CancellationToken::new(),
            "create record",
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(rate_limit_error())
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_without_retry() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(
            &fast_policy(),
            &fast_limiter(),
            &CancellationToken::new(),
            "delete record",
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(CoreError::Provider(spfflat_provider::Error::Api {
                        message: "record does not exist".into(),
                    }))
                }
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            CoreError::Provider(spfflat_provider::Error::Api { .. })
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_wrap_the_last_error() {
        let result: Result<(), _> = with_retry(
            &fast_policy(),
            &fast_limiter(),
            &CancellationToken::new(),
            "ping",
            || async { Err(rate_limit_error()) },
        )
        .await;
        match result.unwrap_err() {
            CoreError::RetriesExhausted {
                operation,
                attempts,
                source,
            } => {
                assert_eq!(operation, "ping");
                assert_eq!(attempts, 3);
                assert!(source.is_retryable());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn cancellation_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), _> = with_retry(
            &fast_policy(),
            &fast_limiter(),
            &cancel,
            "ping",
            || async { Ok(()) },
        )
        .await;
        assert!(matches!(result.unwrap_err(), CoreError::Cancelled));
    }
}
