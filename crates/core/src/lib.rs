//! Core resilience primitives for the Fleetline API client
//!
//! This crate provides the pieces every outbound call goes through:
//!
//! - **Error handling**: Coded errors with optional context
//! - **Rate limiting**: A token bucket shared by all callers of a client
//! - **Retry policy**: Bounded retries for transient refusals
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetline_core::prelude::*;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> fleetline_core::Result<()> {
//! let limiter: Arc<dyn TokenSource> = Arc::new(TokenBucket::new(RateLimitConfig::per_second(18))?);
//! let policy = RetryConfig::default();
//!
//! limiter.acquire(&CancellationToken::new()).await?;
//! assert_eq!(policy.decide(429, 0), RetryDecision::Retry);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod rate_limit;
pub mod retry;

pub use error::{Error, ErrorCode, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::rate_limit::{RateLimitConfig, RateLimitStatus, TokenBucket, TokenSource};
    pub use crate::retry::{RetryConfig, RetryDecision};
}
