//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use fleetline_api_client::{ClientConfig, FleetClient};
use fleetline_core::rate_limit::TokenSource;
use fleetline_core::retry::RetryConfig;
use mockito::{Server, ServerGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const API_KEY: &str = "test-api-key";

/// Token source that grants immediately and counts grants
#[derive(Default)]
pub struct CountingSource {
    acquired: AtomicUsize,
}

impl CountingSource {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for CountingSource {
    async fn acquire(&self, cancel: &CancellationToken) -> fleetline_core::Result<()> {
        if cancel.is_cancelled() {
            return Err(fleetline_core::Error::cancelled("token wait cancelled"));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Token source that never grants; waits until cancelled
#[derive(Default)]
pub struct ExhaustedSource;

#[async_trait]
impl TokenSource for ExhaustedSource {
    async fn acquire(&self, cancel: &CancellationToken) -> fleetline_core::Result<()> {
        cancel.cancelled().await;
        Err(fleetline_core::Error::cancelled("token wait cancelled"))
    }
}

/// Retry policy that keeps tests fast
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 1.0,
    }
}

/// Expected `Authorization` header for [`API_KEY`]
pub fn expected_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{API_KEY}:")))
}

/// Test fixture that owns a mock server and a counting token source
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub tokens: Arc<CountingSource>,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
            tokens: Arc::new(CountingSource::default()),
        }
    }

    /// Client configuration pointing at the mock server
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(API_KEY)
            .with_base_url(self.server.url())
            .with_retry(fast_retry(3))
    }

    /// Client drawing tokens from the counting source
    pub fn client(&self) -> FleetClient {
        self.client_with(self.config())
    }

    pub fn client_with(&self, config: ClientConfig) -> FleetClient {
        FleetClient::with_token_source(config, self.tokens.clone()).unwrap()
    }

    /// Path on the mock server for an API path
    pub fn path(path: &str) -> String {
        format!("/api/v2{path}")
    }
}
