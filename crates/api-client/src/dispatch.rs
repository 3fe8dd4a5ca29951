//! The dispatcher: the one path every outbound request takes
//!
//! A logical call moves through composing the URL, building the request,
//! waiting on the shared rate limiter, sending, and classifying the response.
//! Transient refusals (412, 429) and transport failures loop back to the
//! limiter until the retry budget runs out. The whole call, limiter waits and
//! retry delays included, is bounded by the client timeout.
//!
//! POST and PUT calls are retried like any other. Callers that cannot tolerate
//! a repeated write should use [`RetryConfig::no_retry`] for that client.

use crate::classify::{classify, Outcome};
use crate::error::{ApiError, ApiResult};
use crate::query::{self, ToQueryParams};
use crate::request::{self, ExtraHeader};
use bytes::Bytes;
use fleetline_core::rate_limit::TokenSource;
use fleetline_core::retry::RetryConfig;
use fleetline_telemetry::{metrics, names, Timer};
use reqwest::{Client, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request body encoded only once the call starts
trait JsonBody: Sync {
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Sync + ?Sized> JsonBody for T {
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// One logical call, described before anything is sent
pub struct DispatchRequest<'a> {
    method: Method,
    base_url: String,
    segments: Vec<String>,
    query: Option<&'a (dyn ToQueryParams + Sync)>,
    body: Option<&'a dyn JsonBody>,
    headers: Vec<ExtraHeader>,
    cancel: Option<CancellationToken>,
}

impl<'a> DispatchRequest<'a> {
    /// Start describing a call against `base_url`
    pub fn new(method: Method, base_url: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            segments: Vec::new(),
            query: None,
            body: None,
            headers: Vec::new(),
            cancel: None,
        }
    }

    /// GET call
    pub fn get(base_url: impl Into<String>) -> Self {
        Self::new(Method::GET, base_url)
    }

    /// POST call
    pub fn post(base_url: impl Into<String>) -> Self {
        Self::new(Method::POST, base_url)
    }

    /// PUT call
    pub fn put(base_url: impl Into<String>) -> Self {
        Self::new(Method::PUT, base_url)
    }

    /// DELETE call
    pub fn delete(base_url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, base_url)
    }

    /// Append one path segment
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append several path segments in order
    #[must_use]
    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Attach query parameters
    #[must_use]
    pub fn query<Q: ToQueryParams + Sync>(mut self, params: &'a Q) -> Self {
        self.query = Some(params);
        self
    }

    /// Attach a JSON body; ignored for GET and DELETE
    #[must_use]
    pub fn json<B: Serialize + Sync>(mut self, body: &'a B) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header that overrides any default of the same name
    #[must_use]
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.optional_header(name, Some(value.into()))
    }

    /// Add a header only when `value` is present
    #[must_use]
    pub fn optional_header(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.headers.push((name.into(), value));
        self
    }

    /// Abort the call when `token` is cancelled
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// HTTP method of the call
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path segments in order
    #[must_use]
    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Debug for DispatchRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("segments", &self.segments)
            .field("has_query", &self.query.is_some())
            .field("has_body", &self.body.is_some())
            .field("headers", &self.headers.len())
            .finish_non_exhaustive()
    }
}

/// A 2xx response waiting to be decoded
struct Completed {
    status: u16,
    body: Bytes,
}

/// Sends requests through the shared limiter with bounded retries
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
    api_key: Arc<str>,
    limiter: Arc<dyn TokenSource>,
    retry: RetryConfig,
    timeout: Duration,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher around a shared token source
    pub fn new(
        api_key: &str,
        limiter: Arc<dyn TokenSource>,
        retry: RetryConfig,
        timeout: Duration,
    ) -> ApiResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ApiError::config("api_key cannot be empty"));
        }
        retry.validate()?;

        let http = Client::builder().build()?;

        Ok(Self {
            http,
            api_key: Arc::from(api_key),
            limiter,
            retry,
            timeout,
        })
    }

    /// The shared limiter
    #[must_use]
    pub fn limiter(&self) -> &Arc<dyn TokenSource> {
        &self.limiter
    }

    /// Retry policy in effect
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Per-call timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the call and decode the 2xx body into `T`.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` targets
    /// accept it.
    pub async fn call<T: DeserializeOwned>(&self, request: DispatchRequest<'_>) -> ApiResult<T> {
        let _timer = Timer::start(names::LATENCY_MS);
        let result = self
            .dispatch(&request)
            .await
            .and_then(|completed| decode(&completed));
        record_outcome(&result);
        result
    }

    /// Perform the call and discard the 2xx body
    pub async fn send(&self, request: DispatchRequest<'_>) -> ApiResult<()> {
        let _timer = Timer::start(names::LATENCY_MS);
        let result = self.dispatch(&request).await.map(|_| ());
        record_outcome(&result);
        result
    }

    async fn dispatch(&self, request: &DispatchRequest<'_>) -> ApiResult<Completed> {
        let request_id = Uuid::new_v4().to_string();
        match tokio::time::timeout(self.timeout, self.run(request, &request_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    request_id = %request_id,
                    timeout_ms = self.timeout.as_millis(),
                    "Request timed out"
                );
                Err(ApiError::Timeout(self.timeout))
            }
        }
    }

    #[instrument(name = "dispatch", skip_all, fields(request_id = %request_id, method = %request.method))]
    async fn run(&self, request: &DispatchRequest<'_>, request_id: &str) -> ApiResult<Completed> {
        let params = request.query.map(|q| q.to_query_params()).transpose()?;
        let url = query::compose(&request.base_url, &request.segments, params.as_ref())?;

        let has_body = request::method_has_body(&request.method)?;
        let body = match request.body {
            Some(body) if has_body => Some(body.to_json_bytes().map_err(ApiError::Encode)?),
            _ => None,
        };
        let build = || {
            request::build(
                &self.api_key,
                &request.method,
                url.clone(),
                body.as_deref(),
                &request.headers,
                request_id,
            )
        };
        let prepared = build()?;

        let cancel = request.cancel.clone().unwrap_or_default();
        let mut retries = 0u32;

        loop {
            let attempt = retries + 1;
            self.limiter.acquire(&cancel).await?;

            let outgoing = match prepared.try_clone() {
                Some(outgoing) => outgoing,
                None => build()?,
            };

            metrics().increment(names::ATTEMPTS);
            debug!(attempt, url = %url, "Sending request");

            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ApiError::Cancelled),
                sent = self.execute(outgoing) => sent,
            };

            let failure = match sent {
                Ok((status, body)) => match classify(status, &body) {
                    Outcome::Success => {
                        debug!(attempt, status, "Request succeeded");
                        return Ok(Completed { status, body });
                    }
                    Outcome::Permanent(error) => {
                        debug!(attempt, status, code = %error.code, "Request failed, not retrying");
                        return Err(ApiError::Remote { status, error });
                    }
                    Outcome::Retry(error) => ApiError::Remote { status, error },
                },
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if !self.retry.has_budget(retries) {
                warn!(attempt, error = %failure, "Retry budget exhausted");
                return Err(ApiError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                });
            }

            retries += 1;
            metrics().increment(names::RETRIES);
            let delay = self.retry.delay_for_retry(retries);
            debug!(
                attempt,
                delay_ms = delay.as_millis(),
                error = %failure,
                "Request failed, will retry"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ApiError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn execute(&self, request: Request) -> ApiResult<(u16, Bytes)> {
        let response = self.http.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body))
    }
}

fn decode<T: DeserializeOwned>(completed: &Completed) -> ApiResult<T> {
    let body: &[u8] = if completed.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &completed.body
    };
    serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        status: completed.status,
        source,
    })
}

fn record_outcome<T>(result: &ApiResult<T>) {
    match result {
        Ok(_) => metrics().increment(names::SUCCESSES),
        Err(_) => metrics().increment(names::FAILURES),
    }
}
