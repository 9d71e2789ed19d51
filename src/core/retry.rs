//! Retry logic with configurable backoff
//!
//! Two flavours live here: [`RetryExecutor::with_retry`] wraps a single
//! publish step and reduces it to a boolean, and [`RetryExecutor::retry`]
//! propagates errors and only retries transient network failures.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Delay policy between attempts
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay after every failed attempt
    Constant(Duration),
    /// Delay per attempt; the last entry repeats
    Schedule(Vec<Duration>),
    /// Exponential growth, capped at `max`
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Backoff {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(delay) => *delay,
            Backoff::Schedule(delays) => {
                let index = (attempt.saturating_sub(1) as usize).min(delays.len().saturating_sub(1));
                delays.get(index).copied().unwrap_or(Duration::ZERO)
            }
            Backoff::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                Duration::from_secs_f64(initial.as_secs_f64() * factor).min(*max)
            }
        }
    }
}

/// Options for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Constant(Duration::from_secs(1)),
        }
    }
}

/// Executes fallible steps with bounded retries
///
/// # Examples
///
/// ```no_run
/// use platform_publisher::core::{RetryExecutor, RetryOptions};
///
/// # async fn example() {
/// let executor = RetryExecutor::new(RetryOptions::default());
///
/// let clicked = executor
///     .with_retry("发布按钮", |_attempt| async { Ok(true) })
///     .await;
/// assert!(clicked);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    options: RetryOptions,
}

impl RetryExecutor {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Run one step until it reports success or attempts run out.
    ///
    /// `Ok(false)` and `Err(_)` both count as a failed attempt. The error is
    /// logged and never escapes; the caller only sees the final boolean.
    pub async fn with_retry<F, Fut>(&self, label: &str, mut operation: F) -> bool
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let max_attempts = self.options.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation(attempt).await {
                Ok(true) => {
                    if attempt > 1 {
                        tracing::info!(step = label, attempt, "step succeeded after retry");
                    }
                    return true;
                }
                Ok(false) => {
                    tracing::warn!(step = label, attempt, max_attempts, "step attempt failed");
                }
                Err(error) => {
                    tracing::warn!(
                        step = label,
                        attempt,
                        max_attempts,
                        error = %error,
                        "step attempt raised an error"
                    );
                }
            }

            if attempt < max_attempts {
                sleep(self.options.backoff.delay_after(attempt)).await;
            }
        }

        tracing::error!(step = label, max_attempts, "step failed after all attempts");
        false
    }

    /// Execute the given async operation, retrying transient failures.
    ///
    /// Errors whose message does not look like a network or timeout problem
    /// are returned immediately.
    pub async fn retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !is_retryable_error(&error) || attempt >= max_attempts {
                        return Err(error);
                    }

                    tracing::debug!(attempt, error = %error, "transient failure, retrying");
                    sleep(self.options.backoff.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryOptions::default())
    }
}

/// Check if an error looks transient
fn is_retryable_error<E: std::fmt::Display>(error: &E) -> bool {
    let error_msg = error.to_string().to_lowercase();

    let retryable_patterns = [
        "econnrefused",
        "econnreset",
        "etimedout",
        "timeout",
        "timed out",
        "connection refused",
        "connection reset",
        "network error",
        "error sending request",
    ];

    retryable_patterns
        .iter()
        .any(|pattern| error_msg.contains(pattern))
}
