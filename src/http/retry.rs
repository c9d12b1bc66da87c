// Retry policy for platform API calls
// Transient failures are retried with exponential backoff; everything else goes straight back to the caller

use rand::Rng;
use reqwest::StatusCode;
use reqwest_retry::Retryable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statuses the platform uses for "try again shortly"
pub const DEFAULT_TRANSIENT_STATUSES: [u16; 3] = [429, 502, 503];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt, so a call makes at most `max_retries + 1` attempts
    pub max_retries: u32,
    /// Delay before the first retry; doubles for every retry after that
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff delay
    pub max_backoff_secs: u64,
    /// Randomize each delay between zero and its computed value
    pub jitter: bool,
    /// HTTP statuses treated as transient
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 500,
            max_backoff_secs: 120,
            jitter: false,
            transient_statuses: DEFAULT_TRANSIENT_STATUSES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Policy with no waiting between attempts, for tests against a mock server
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base_ms: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn is_transient_status(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status.as_u16())
    }

    /// Delay to wait before retry number `retry` (0-based)
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let base = Duration::from_millis(self.backoff_base_ms);
        let cap = Duration::from_secs(self.max_backoff_secs);
        let delay = base
            .checked_mul(2u32.saturating_pow(retry))
            .unwrap_or(cap)
            .min(cap);

        if self.jitter && !delay.is_zero() {
            let millis = rand::rng().random_range(0..=delay.as_millis() as u64);
            Duration::from_millis(millis)
        } else {
            delay
        }
    }

    /// Classify the outcome of one attempt.
    ///
    /// `None` means the attempt succeeded. `Some(Retryable::Fatal)` is handed back to the
    /// caller untouched, `Some(Retryable::Transient)` is worth another attempt.
    pub fn classify(&self, outcome: &Result<reqwest::Response, reqwest::Error>) -> Option<Retryable> {
        match outcome {
            Ok(response) => self.classify_status(response.status()),
            Err(error) if error.is_connect() || error.is_timeout() => Some(Retryable::Transient),
            Err(_) => Some(Retryable::Fatal),
        }
    }

    pub fn classify_status(&self, status: StatusCode) -> Option<Retryable> {
        if status.is_success() {
            None
        } else if self.is_transient_status(status) {
            Some(Retryable::Transient)
        } else {
            Some(Retryable::Fatal)
        }
    }
}
