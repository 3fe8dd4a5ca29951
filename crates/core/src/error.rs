//! Coded errors for the resilience primitives

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A wait was abandoned because its cancellation token fired
    Cancelled = 1003,

    /// A limiter or retry setting is out of range
    InvalidConfigValue = 2001,

    /// A non-blocking token request found nothing to take
    TokenUnavailable = 3001,
}

impl ErrorCode {
    /// Get the numeric code
    #[must_use]
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error with a code and optional context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({ctx})")?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Add context to the error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Whether this error reports a cancelled wait
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }

    // Convenience constructors

    /// The caller gave up while waiting
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
    }

    /// A configuration value is out of range or malformed
    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfigValue, message)
            .with_context(format!("field `{field}`"))
    }

    /// A non-blocking token request found the bucket empty
    pub fn token_unavailable() -> Self {
        Self::new(ErrorCode::TokenUnavailable, "No rate limit token available")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
