//! Retry policy for transient failures

use crate::error::{is_default_retry_status, Error};
use crate::types::BackoffType;
use std::time::Duration;

/// How many times to try a request and how long to wait in between.
///
/// `max_attempts` counts the first try, so a policy with 3 attempts sends at
/// most 3 requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after the first failed attempt
    pub initial_backoff: Duration,
    /// Upper bound on any wait
    pub max_backoff: Duration,
    /// How waits grow
    pub backoff_type: BackoffType,
    /// Retryable status codes; `None` means 429 and every 5xx
    pub retry_statuses: Option<Vec<u16>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
            backoff_type: BackoffType::Exponential,
            retry_statuses: None,
        }
    }
}

impl RetryPolicy {
    /// Exponential policy with the given budget and first wait
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            ..Self::default()
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Set the attempt budget
    #[must_use]
    pub fn attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Retry exactly these status codes
    #[must_use]
    pub fn statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_statuses = Some(statuses.into_iter().collect());
        self
    }

    /// Wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let step = attempt.saturating_sub(1);
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(step + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(step);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        match &self.retry_statuses {
            Some(statuses) => statuses.contains(&status),
            None => is_default_retry_status(status),
        }
    }

    /// Whether an error is worth another attempt under this policy
    pub fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::HttpStatus { status, .. } => self.is_retryable_status(*status),
            other => other.is_transient_transport(),
        }
    }

    /// Wait before the next attempt, or `None` when the error is final
    pub fn should_retry(&self, error: &Error, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts.max(1) || !self.is_retryable(error) {
            return None;
        }
        Some(self.delay_for(attempt))
    }
}
