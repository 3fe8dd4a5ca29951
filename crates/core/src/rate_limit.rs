//! Rate limiting for outbound API calls
//!
//! Provides a token bucket shared by every caller of a client:
//! - One bucket per client, handed around as `Arc<dyn TokenSource>`
//! - Waiters suspend instead of polling and are served in arrival order
//! - Waiting can be cancelled without consuming a token
//!
//! The bucket is tracked as a theoretical arrival time (GCRA), which keeps all
//! arithmetic in whole nanoseconds. In any window of length `T` at most
//! `burst + rate * T` tokens are granted.
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetline_core::rate_limit::{RateLimitConfig, TokenBucket, TokenSource};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> fleetline_core::Result<()> {
//! let bucket = TokenBucket::new(RateLimitConfig::per_second(18))?;
//! bucket.acquire(&CancellationToken::new()).await?;
//! // Proceed with API call
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Something that hands out permission to send one request.
///
/// Implementations own their synchronization; callers never lock.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Wait for one token, or fail with a cancellation error once `cancel` fires.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens added per window
    pub max_requests: u32,
    /// Refill window
    pub window: Duration,
    /// Bucket capacity (tokens that may be spent back to back)
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_second(10)
    }
}

impl RateLimitConfig {
    /// `max` tokens per second with a burst of one
    #[must_use]
    pub fn per_second(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(1),
            burst: 1,
        }
    }

    /// Builder-style method to set the bucket capacity
    #[must_use]
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Refill rate in tokens per second
    #[must_use]
    pub fn rate_per_second(&self) -> f64 {
        f64::from(self.max_requests) / self.window.as_secs_f64()
    }

    /// Time between two tokens, rounded up so the rate is never exceeded
    #[must_use]
    pub fn emission_interval(&self) -> Duration {
        let nanos = self
            .window
            .as_nanos()
            .div_ceil(u128::from(self.max_requests.max(1)));
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::invalid_config(
                "max_requests",
                "max_requests must be greater than zero",
            ));
        }
        if self.window.is_zero() {
            return Err(Error::invalid_config("window", "window cannot be zero"));
        }
        if self.burst == 0 {
            return Err(Error::invalid_config("burst", "burst must be at least 1"));
        }
        Ok(())
    }
}

/// Point-in-time view of a bucket
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    /// Tokens that could be taken right now
    pub available: u32,
    /// Bucket capacity
    pub burst: u32,
    /// Refill rate in tokens per second
    pub rate_per_second: f64,
    /// Time until the next token, zero if one is available
    pub wait: Duration,
}

#[derive(Debug)]
struct Schedule {
    interval: Duration,
    tolerance: Duration,
    burst: u32,
}

#[derive(Debug)]
struct BucketState {
    /// Theoretical arrival time of the next request
    tat: Instant,
}

impl BucketState {
    /// Take a token if one is available at `now`, otherwise report how long to wait.
    fn reserve(&mut self, now: Instant, schedule: &Schedule) -> std::result::Result<(), Duration> {
        if self.tat <= now + schedule.tolerance {
            self.tat = self.tat.max(now) + schedule.interval;
            Ok(())
        } else {
            Err(self
                .tat
                .saturating_duration_since(now)
                .saturating_sub(schedule.tolerance))
        }
    }

    fn available(&self, now: Instant, schedule: &Schedule) -> u32 {
        let tat = self.tat.max(now);
        let horizon = now + schedule.tolerance;
        if tat > horizon {
            return 0;
        }
        let slack = horizon.duration_since(tat).as_nanos();
        let tokens = slack / schedule.interval.as_nanos().max(1) + 1;
        u32::try_from(tokens).unwrap_or(u32::MAX).min(schedule.burst)
    }
}

/// Token bucket shared by all concurrent callers of one client
///
/// Waiters line up on `queue`; `state` is only ever locked briefly, so
/// [`TokenBucket::status`] never waits behind a sleeping caller.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    schedule: Schedule,
    queue: tokio::sync::Mutex<()>,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        config.validate()?;
        let interval = config.emission_interval();
        let schedule = Schedule {
            interval,
            tolerance: interval * (config.burst - 1),
            burst: config.burst,
        };
        Ok(Self {
            config,
            schedule,
            queue: tokio::sync::Mutex::new(()),
            state: Mutex::new(BucketState { tat: Instant::now() }),
        })
    }

    /// The configuration this bucket was built from
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a token without waiting.
    ///
    /// Fails when the bucket is empty or other callers are already queued.
    pub fn try_acquire(&self) -> Result<()> {
        let Ok(_turn) = self.queue.try_lock() else {
            return Err(Error::token_unavailable().with_context("callers are queued"));
        };
        self.state()
            .reserve(Instant::now(), &self.schedule)
            .map_err(|_| Error::token_unavailable())
    }

    /// Current bucket status. Does not wait for queued callers.
    #[must_use]
    pub fn status(&self) -> RateLimitStatus {
        let state = self.state();
        let now = Instant::now();
        let available = state.available(now, &self.schedule);
        let wait = if available > 0 {
            Duration::ZERO
        } else {
            state
                .tat
                .saturating_duration_since(now)
                .saturating_sub(self.schedule.tolerance)
        };

        RateLimitStatus {
            available,
            burst: self.schedule.burst,
            rate_per_second: self.config.rate_per_second(),
            wait,
        }
    }

    /// Wait until a token can be taken.
    ///
    /// The queue lock is held while sleeping so later callers line up behind
    /// this one.
    async fn wait_for_token(&self) {
        let _turn = self.queue.lock().await;
        loop {
            let reserved = self.state().reserve(Instant::now(), &self.schedule);
            match reserved {
                Ok(()) => {
                    trace!("rate limit token granted");
                    return;
                }
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis(), "Waiting for rate limit token");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait]
impl TokenSource for TokenBucket {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                Err(Error::cancelled("Cancelled while waiting for a rate limit token"))
            }
            () = self.wait_for_token() => Ok(()),
        }
    }
}
