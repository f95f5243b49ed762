//! Bounded retry with exponential backoff.
//!
//! Callers hitting a transient fault (timeout, backend unavailable) retry a
//! bounded number of times. Conflicts are deliberately not retried here: a
//! version conflict means the caller must re-read current state before trying
//! again, which no blind retry loop can do for it.

use civicwatch_domain::{CoreError, CoreResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry behavior for an operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 means try exactly once)
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Backoff multiplier (e.g., 2.0 for doubling)
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy for transient backend faults: a few quick, capped retries.
    pub fn transient() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before the given retry (1-indexed), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let millis =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(retry as i32 - 1);
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

/// Retry an async operation while `should_retry` approves the error.
///
/// The first failing attempt whose error the predicate rejects is returned
/// as-is, as is the final error once the retry budget is spent.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !should_retry(&error) || retries >= policy.max_retries {
                    return Err(error);
                }

                retries += 1;
                let delay = policy.delay_for(retries);
                tracing::debug!(retry = retries, delay_ms = delay.as_millis() as u64, "Retrying after transient error");
                sleep(delay).await;
            }
        }
    }
}

/// Retry an operation returning [`CoreResult`], honoring
/// [`CoreError::is_retryable`].
///
/// # Examples
///
/// ```no_run
/// use civicwatch_common::retry::{retry_transient, RetryPolicy};
/// use civicwatch_domain::CoreResult;
///
/// # async fn example() -> CoreResult<()> {
/// let policy = RetryPolicy::transient();
/// retry_transient(&policy, || async { Ok(()) }).await
/// # }
/// ```
pub async fn retry_transient<F, Fut, T>(policy: &RetryPolicy, operation: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    retry_if(policy, operation, CoreError::is_retryable).await
}
