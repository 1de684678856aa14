//! Bounded retry for upstream calls.
//!
//! A [`RetryPolicy`] runs an async operation up to `max_attempts` times,
//! sleeping between attempts, and reports either the value or the last error
//! together with the number of attempts made.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound for a single exponential delay.
const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    Fixed,
    Exponential,
}

impl Backoff {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fixed" | "constant" => Some(Backoff::Fixed),
            "exponential" | "exp" => Some(Backoff::Exponential),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff,
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, Backoff::Fixed)
    }

    /// Single attempt, no retries.
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after `failed_attempt` (1-based) before the next try.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let exponent = failed_attempt.saturating_sub(1).min(16);
                self.delay
                    .checked_mul(1u32 << exponent)
                    .unwrap_or(MAX_DELAY)
                    .min(MAX_DELAY.max(self.delay))
            }
        }
    }

    /// Runs `operation` until it succeeds, `should_retry` rejects the error,
    /// or the attempt budget is spent. The operation receives the 1-based
    /// attempt number.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = label, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt >= self.max_attempts || !should_retry(&err) {
                        return Err(RetryError {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Terminal failure of a retried operation.
#[derive(Debug, Error)]
#[error("{source} (after {attempts} {})", attempt_noun(.attempts))]
pub struct RetryError<E> {
    pub attempts: u32,
    #[source]
    pub source: E,
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        self.source
    }
}

fn attempt_noun(attempts: &u32) -> &'static str {
    if *attempts == 1 {
        "attempt"
    } else {
        "attempts"
    }
}
