//! Main API client implementation

use crate::config::ClientConfig;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::endpoints::{AdminsApi, OrganizationApi, TasksApi, TeamsApi, WorkersApi};
use crate::error::ApiResult;
use fleetline_core::rate_limit::{TokenBucket, TokenSource};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Fleetline API client
///
/// Cheap to clone; every clone shares one rate limiter, so the configured
/// call rate holds across all tasks using the client.
#[derive(Clone, Debug)]
pub struct FleetClient {
    dispatcher: Dispatcher,
    config: Arc<ClientConfig>,
    api_url: Arc<str>,
}

impl FleetClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        let config = config.normalized();
        config.validate()?;
        let limiter = Arc::new(TokenBucket::new(config.rate_limit())?);
        Self::with_token_source(config, limiter)
    }

    /// Create a client that draws tokens from an existing source.
    ///
    /// Lets several clients share one budget, or tests count acquisitions.
    pub fn with_token_source(
        config: ClientConfig,
        limiter: Arc<dyn TokenSource>,
    ) -> ApiResult<Self> {
        let config = config.normalized();
        config.validate()?;

        let dispatcher = Dispatcher::new(
            &config.api_key,
            limiter,
            config.retry.clone(),
            config.timeout,
        )?;
        let api_url: Arc<str> = Arc::from(config.api_url());

        debug!(
            api_url = %api_url,
            max_calls_per_second = config.max_calls_per_second,
            timeout_ms = config.timeout.as_millis(),
            "Client created"
        );

        Ok(Self {
            dispatcher,
            config: Arc::new(config),
            api_url,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root every resource path hangs off
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The dispatcher behind this client
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // -------------------------------------------------------------------------
    // Resource accessors
    // -------------------------------------------------------------------------

    /// Access administrator endpoints
    #[must_use]
    pub fn admins(&self) -> AdminsApi {
        AdminsApi::new(self.clone())
    }

    /// Access organization endpoints
    #[must_use]
    pub fn organization(&self) -> OrganizationApi {
        OrganizationApi::new(self.clone())
    }

    /// Access task endpoints
    #[must_use]
    pub fn tasks(&self) -> TasksApi {
        TasksApi::new(self.clone())
    }

    /// Access team endpoints
    #[must_use]
    pub fn teams(&self) -> TeamsApi {
        TeamsApi::new(self.clone())
    }

    /// Access worker endpoints
    #[must_use]
    pub fn workers(&self) -> WorkersApi {
        WorkersApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level requests
    // -------------------------------------------------------------------------

    /// Describe a call against the API root
    #[must_use]
    pub fn request<'a>(&self, method: Method) -> DispatchRequest<'a> {
        DispatchRequest::new(method, &*self.api_url)
    }

    /// Describe a GET call
    #[must_use]
    pub fn get<'a>(&self) -> DispatchRequest<'a> {
        self.request(Method::GET)
    }

    /// Describe a POST call
    #[must_use]
    pub fn post<'a>(&self) -> DispatchRequest<'a> {
        self.request(Method::POST)
    }

    /// Describe a PUT call
    #[must_use]
    pub fn put<'a>(&self) -> DispatchRequest<'a> {
        self.request(Method::PUT)
    }

    /// Describe a DELETE call
    #[must_use]
    pub fn delete<'a>(&self) -> DispatchRequest<'a> {
        self.request(Method::DELETE)
    }

    /// Perform a call and decode the response
    pub async fn call<T: DeserializeOwned>(&self, request: DispatchRequest<'_>) -> ApiResult<T> {
        self.dispatcher.call(request).await
    }

    /// Perform a call and discard the response body
    pub async fn send(&self, request: DispatchRequest<'_>) -> ApiResult<()> {
        self.dispatcher.send(request).await
    }
}
