//! Retry policy for transient API failures
//!
//! The policy is deliberately small:
//! - A bounded number of retries after the first attempt
//! - A fixed delay by default, optionally stretched by a multiplier and capped
//! - A pure decision function over the HTTP status code
//!
//! # Example
//!
//! ```rust
//! use fleetline_core::retry::{RetryConfig, RetryDecision};
//!
//! let policy = RetryConfig::default();
//! assert_eq!(policy.decide(429, 0), RetryDecision::Retry);
//! assert_eq!(policy.decide(404, 0), RetryDecision::Fail);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status codes the remote service uses for transient refusals
pub const RETRYABLE_STATUSES: [u16; 2] = [412, 429];

/// Whether a status code signals a transient refusal
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Outcome of a retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait and send again
    Retry,
    /// Surface the failure to the caller
    Fail,
}

impl RetryDecision {
    /// Decision for a status code, ignoring the retry budget
    #[must_use]
    pub fn for_status(status: u16) -> Self {
        if is_retryable_status(status) {
            Self::Retry
        } else {
            Self::Fail
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor between retries; 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    /// Create a config for quick retries
    #[must_use]
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 1.0,
        }
    }

    /// Create a config for patient retries
    #[must_use]
    pub fn patient() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
        }
    }

    /// Create a config with no retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Total attempts this policy allows, first attempt included
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do after `retries_so_far` retries ended with `status`
    #[must_use]
    pub fn decide(&self, status: u16, retries_so_far: u32) -> RetryDecision {
        match RetryDecision::for_status(status) {
            RetryDecision::Retry if retries_so_far < self.max_retries => RetryDecision::Retry,
            _ => RetryDecision::Fail,
        }
    }

    /// Whether another retry fits in the budget
    #[must_use]
    pub fn has_budget(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Delay before the given retry (1-based)
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let fixed = (self.backoff_multiplier - 1.0).abs() < f64::EPSILON;
        let delay = if fixed || retry == 1 {
            self.delay
        } else {
            let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
            let secs = self.delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
            Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
        };

        delay.min(self.max_delay)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_config(
                "backoff_multiplier",
                "backoff_multiplier must be a finite value >= 1.0",
            ));
        }
        if self.max_delay < self.delay {
            return Err(Error::invalid_config(
                "max_delay",
                "max_delay cannot be shorter than delay",
            ));
        }
        Ok(())
    }
}
