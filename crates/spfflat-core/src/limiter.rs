//! Token-bucket rate limiter shared by all tasks of one provider group.
//!
//! The bucket refills continuously at `rate` tokens/sec up to `burst`.
//! Waiters queue on an async mutex, so concurrent acquires are safe and
//! roughly fair. The cross-component default is 2 ops/sec with burst 1.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

pub struct RateLimiter {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst: f64::from(burst.max(1)),
            state: Mutex::new(BucketState {
                tokens: f64::from(burst.max(1)),
                last_refill: Instant::now(),
            }),
        }
    }

    /// The default per-provider budget: 2 operations/sec, burst 1.
    pub fn provider_default() -> Self {
        Self::new(2.0, 1)
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// `acquire`, aborted by the cancellation token.
    pub async fn acquire_cancellable(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(CoreError::Cancelled),
            _ = self.acquire() => Ok(()),
        }
    }
}
