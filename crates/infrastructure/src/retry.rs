//! Retrying request execution with exponential backoff
//!
//! Every provider call runs through [`with_retry`]. The wait before attempt
//! `n` (n ≥ 2) is `base_delay * 2^(n-2)`; there is no jitter. Errors decide
//! for themselves whether another attempt is worthwhile via [`Retryable`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryPolicy, retry};
//!
//! let policy = RetryPolicy::new(3, 1000);
//! let reply = retry(&policy, || async { provider.call().await }).await?;
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Attempt ceiling and base delay shared by all attempts of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds (default: 1000ms)
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is raised to 1
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay_ms,
        }
    }

    /// Single attempt, no waiting
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, 0)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    /// Wait before the given 1-based attempt
    ///
    /// Zero for the first attempt, then `base`, `2 * base`, `4 * base` ...
    #[must_use]
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(attempt - 2).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Classification of an error as transient or terminal
pub trait Retryable {
    /// Returns true if another attempt may succeed
    fn is_retryable(&self) -> bool;
}

/// Outcome of a retried operation together with attempt metadata
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the last attempt
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries)
    pub attempts: u32,
    /// Total time spent including backoff
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the operation failed
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Execute an async operation under a retry policy
///
/// Success short-circuits. A terminal error is returned after the attempt
/// that produced it. A retryable error consumes an attempt; once
/// `max_attempts` is reached the last error is returned.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(
                        attempts,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Operation succeeded after retries"
                    );
                }
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
            Err(err) => {
                if !err.is_retryable() {
                    debug!(attempts, error = %err, "Operation failed with terminal error");
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }

                if attempts >= max_attempts {
                    warn!(
                        attempts,
                        max_attempts,
                        error = %err,
                        "Operation failed after max attempts"
                    );
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }

                let delay = policy.delay_before_attempt(attempts + 1);
                warn!(
                    attempt = attempts,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            },
        }
    }
}

/// Execute an async operation under a retry policy, returning only the Result
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    with_retry(policy, operation).await.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone)]
    struct TestError {
        message: String,
        retryable: bool,
    }

    impl TestError {
        fn transient() -> Self {
            Self {
                message: "timeout".to_string(),
                retryable: true,
            }
        }

        fn terminal() -> Self {
            Self {
                message: "bad request".to_string(),
                retryable: false,
            }
        }
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    #[test]
    fn policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn zero_attempts_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, 10).max_attempts, 1);
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let policy = RetryPolicy {
            max_attempts: 0,
            base_delay_ms: 10,
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn delay_doubles_from_second_attempt() {
        let policy = RetryPolicy::new(5, 100);
        assert_eq!(policy.delay_before_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_before_attempt(4), Duration::from_millis(400));
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(200, u64::MAX / 2);
        assert_eq!(
            policy.delay_before_attempt(100),
            Duration::from_millis(u64::MAX)
        );
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let policy = RetryPolicy::new(3, 1);
        let result = with_retry(&policy, || async { Ok::<_, TestError>(42) }).await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 1);
        assert_eq!(result.into_result().unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_exhaust_attempts_with_doubling_backoff() {
        let policy = RetryPolicy::new(3, 1000);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = with_retry(&policy, || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::transient())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1x base before attempt 2, 2x base before attempt 3
        assert_eq!(result.total_duration, Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_short_circuits() {
        let policy = RetryPolicy::new(3, 1000);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = with_retry(&policy, || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::terminal())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(result.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.total_duration, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let policy = RetryPolicy::new(3, 500);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = with_retry(&policy, || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(TestError::transient())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.attempts, 2);
        assert_eq!(result.total_duration, Duration::from_millis(500));
        assert_eq!(result.into_result().unwrap(), "done");
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_after_transient_stops_immediately() {
        let policy = RetryPolicy::new(5, 100);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = with_retry(&policy, || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err::<(), _>(TestError::transient())
                } else {
                    Err(TestError::terminal())
                }
            }
        })
        .await;

        assert_eq!(result.attempts, 2);
        assert_eq!(result.into_result().unwrap_err().message, "bad request");
    }

    #[tokio::test]
    async fn single_attempt_policy_never_waits() {
        let policy = RetryPolicy::no_retry();
        let result = retry(&policy, || async { Err::<(), _>(TestError::transient()) }).await;
        assert!(result.is_err());
    }
}
