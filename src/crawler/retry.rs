//! Bounded retry combinator shared by navigation and health checks

use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Factor applied to the delay after each failed attempt (1.0 = fixed back-off)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with `retries` extra attempts and a fixed delay between them
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            initial_delay: delay,
            max_delay: delay.max(Duration::from_secs(30)),
            backoff_multiplier: 1.0,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Delay to wait after the given failed attempt (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }

    /// Delays between attempts, one per retry
    pub fn strategy(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let retries = self.max_attempts.saturating_sub(1);
        if self.backoff_multiplier > 1.0 {
            let policy = self.clone();
            Box::new((0..retries).map(move |attempt| policy.delay_for_attempt(attempt)))
        } else {
            let delay = self.initial_delay.min(self.max_delay);
            Box::new(FixedInterval::new(delay).take(retries as usize))
        }
    }
}

/// Runs an operation until it succeeds, fails terminally, or runs out of attempts
///
/// # Arguments
///
/// * `policy` - Attempt budget and back-off
/// * `is_retryable` - Decides whether an error is worth another attempt
/// * `operation` - Produces a fresh future per attempt
///
/// # Returns
///
/// The first success, the first terminal error, or the error of the last attempt
pub async fn run_with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    is_retryable: R,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut failed = 0;

    RetryIf::spawn(policy.strategy(), operation, |e: &E| {
        failed += 1;
        let retry = failed < attempts && is_retryable(e);
        if retry {
            debug!("Attempt {}/{} failed: {}. Retrying", failed, attempts, e);
        }
        retry
    })
    .await
}
