//! Bounded retry policies for outbound calls.
//!
//! A [`RetryPolicy`] is plain data. Components that talk to remote services
//! receive one at construction time and run their calls through
//! [`with_retry_if`], so the retry behaviour is decided by whoever wires the
//! component up. The default policy makes a single attempt.
//!
//! Delays grow exponentially from `initial_delay_ms` by `backoff_factor` and
//! are capped at `max_delay_ms`. A factor of `1.0` gives a fixed delay.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration for a single outbound call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Randomize each delay by a factor in `0.5..=1.5`.
    #[serde(default)]
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts in total.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum delay between attempts.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to wait after the given failed attempt (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay_ms as f64).max(0.0);

        let millis = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..=1.5)
        } else {
            capped
        };

        Duration::from_millis(millis as u64)
    }

    /// Whether another attempt is allowed after `attempts` attempts were made.
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            jitter: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

/// Run `operation` under `policy`, retrying every error.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, label: &str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, label, |_| true, operation).await
}

/// Run `operation` under `policy`, retrying only errors accepted by `retryable`.
///
/// The last error is returned once attempts are exhausted or a non-retryable
/// error is seen.
pub async fn with_retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    label: &str,
    retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(call = %label, attempts, "Retry succeeded");
                }
                return Ok(value);
            }
            Err(e) => {
                if !retryable(&e) || !policy.should_retry(attempts) {
                    if attempts > 1 {
                        warn!(call = %label, attempts, error = %e, "Giving up after retries");
                    }
                    return Err(e);
                }

                let delay = policy.calculate_delay(attempts - 1);
                warn!(
                    call = %label,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Call failed, will retry"
                );
                sleep(delay).await;
            }
        }
    }
}
