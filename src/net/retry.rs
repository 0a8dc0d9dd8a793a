//! Shared bounded retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::NetError;

/// Retry budget shared by key, segment and direct downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Policy without any waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before attempt `attempt + 1` (1-based `attempt`).
    ///
    /// Doubles per attempt, capped at `max_delay`, with up to 25% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exp = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        let jitter_ms = (delay.as_millis() as u64) / 4;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Transient/permanent classification consumed by [`with_retry`].
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for NetError {
    fn is_retryable(&self) -> bool {
        NetError::is_retryable(self)
    }
}

/// Run `op` until it succeeds, fails permanently or the budget runs out.
///
/// Each attempt is awaited to completion before the next one starts, so an
/// operation never has two attempts in flight.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => {
                tracing::debug!("{}: {} (not retried)", what, err);
                return Err(err);
            }
            Err(err) if attempt >= policy.max_attempts => {
                tracing::warn!("{}: giving up after {} attempts: {}", what, attempt, err);
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    what,
                    attempt,
                    policy.max_attempts,
                    err,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(300));
        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        let second = policy.delay_for(2);
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));
        let capped = policy.delay_for(10);
        assert!(capped >= Duration::from_millis(300) && capped <= Duration::from_millis(375));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(3);
        let result: Result<i32, NetError> = with_retry(&policy, "op", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(NetError::Status(503))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(4);
        let result: Result<(), NetError> = with_retry(&policy, "op", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(NetError::Timeout)
        })
        .await;

        assert_eq!(result, Err(NetError::Timeout));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_not_found_fails_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::immediate(5);
        let result: Result<(), NetError> = with_retry(&policy, "op", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(NetError::NotFound(404))
        })
        .await;

        assert_eq!(result, Err(NetError::NotFound(404)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
