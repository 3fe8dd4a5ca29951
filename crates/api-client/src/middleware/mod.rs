//! Resilience components used by the dispatcher
//!
//! This module re-exports the limiter and retry policy from `fleetline-core`
//! so callers can tune or replace them without a direct dependency.

pub use fleetline_core::rate_limit::{RateLimitConfig, RateLimitStatus, TokenBucket, TokenSource};
pub use fleetline_core::retry::{is_retryable_status, RetryConfig, RetryDecision, RETRYABLE_STATUSES};
