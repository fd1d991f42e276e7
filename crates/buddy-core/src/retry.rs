//! Bounded retry for outbound API calls.
//!
//! Only failures the caller marks as transient are retried, and only a
//! fixed small number of times. Quota and authentication failures must be
//! reported as non-retryable by the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::{HttpConfig, MAX_RETRIES};

/// How many times, and how long to wait, before giving up on a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Build from config, capping retries at [`MAX_RETRIES`].
    pub fn from_config(http: &HttpConfig) -> Self {
        Self::new(http.max_retries.min(MAX_RETRIES), http.retry_backoff())
    }

    /// Run `op`, retrying while `is_retryable` approves the error and the
    /// retry budget lasts.
    pub async fn run<T, E, F, Fut, R>(&self, label: &str, mut op: F, is_retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    let delay = self.backoff * attempt;
                    tracing::warn!(
                        call = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}
