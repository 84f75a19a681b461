//! Bounded retry with exponential backoff.
//!
//! A [`RetryPolicy`] is a plain value; every call to [`RetryPolicy::run`] starts its own attempt
//! counter, so one page exhausting its attempts never eats into the next page's budget.

use super::client::FetchError;
use core::time::Duration;

const LOG_TARGET: &str = "     retry";

/// Attempt ceiling used when nothing else is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles for each subsequent one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` counts every attempt including the first; it is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the 1-based `attempt`. The first attempt goes out immediately.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 2);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails fatally, or the attempt ceiling is reached.
    ///
    /// `what` only labels log output.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    attempt += 1;
                    let delay = self.delay_before(attempt);
                    log::debug!(
                        target: LOG_TARGET,
                        "retrying {what} (attempt {attempt} of {}, delay {}ms): {e}",
                        self.max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        log::debug!(target: LOG_TARGET, "giving up on {what} after {attempt} attempt(s): {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RateTelemetry;
    use core::sync::atomic::{AtomicU32, Ordering};
    use ohno::app_err;

    fn transient() -> FetchError {
        FetchError::Transient(app_err!("503"), RateTelemetry::default())
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(1));
        assert_eq!(policy.delay_before(3), Duration::from_secs(2));
        assert_eq!(policy.delay_before(4), Duration::from_secs(4));
    }

    #[test]
    fn zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_ceiling() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run("test", || async {
                let _ = calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run("test", || async {
                let _ = calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::fatal(app_err!("404")))
            })
            .await;

        assert!(!result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn each_run_has_its_own_budget() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let local = AtomicU32::new(0);
            let result = policy
                .run("page", || async {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    if local.fetch_add(1, Ordering::SeqCst) < 2 { Err(transient()) } else { Ok(()) }
                })
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }
}
