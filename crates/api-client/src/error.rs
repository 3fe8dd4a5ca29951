//! Error types for the API client

use fleetline_core::retry::RetryDecision;
use fleetline_core::ErrorCode;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Decoded body of a non-2xx response.
///
/// Every field is optional on the wire; a body that is not JSON at all still
/// produces a value, with the decode failure and the raw text kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable failure category, e.g. `InvalidArgument`
    #[serde(default)]
    pub code: String,
    /// Details reported by the service
    #[serde(default)]
    pub message: ErrorMessage,
    /// Why the body could not be decoded, if it could not
    #[serde(skip)]
    pub decode_failure: Option<String>,
    /// Body text kept when decoding failed
    #[serde(skip)]
    pub raw_body: Option<String>,
}

/// The `message` object of an error body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    /// Numeric internal error code
    #[serde(default)]
    pub error: i64,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Underlying cause, a string or an object depending on the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<serde_json::Value>,
    /// Address the service saw the request coming from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    /// Request correlation id assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// Per-item status code (batch endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl StructuredError {
    /// Decode an error body. Never fails.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Self>(body) {
            Ok(error) => error,
            Err(typed_err) => match serde_json::from_slice::<serde_json::Value>(body) {
                // Valid JSON in an unexpected shape: keep what we can read
                Ok(value) => Self::from_loose_json(&value, &typed_err),
                Err(err) => Self::undecodable(body, &err),
            },
        }
    }

    fn from_loose_json(value: &serde_json::Value, err: &serde_json::Error) -> Self {
        let message = match value.get("message") {
            Some(serde_json::Value::Object(fields)) => ErrorMessage::from_loose_fields(fields),
            Some(serde_json::Value::String(text)) => ErrorMessage {
                message: text.clone(),
                ..ErrorMessage::default()
            },
            _ => ErrorMessage::default(),
        };

        Self {
            code: loose_text(value.get("code")).unwrap_or_default(),
            message,
            decode_failure: Some(err.to_string()),
            raw_body: Some(value.to_string()),
        }
    }

    fn undecodable(body: &[u8], err: &serde_json::Error) -> Self {
        Self {
            decode_failure: Some(err.to_string()),
            raw_body: Some(String::from_utf8_lossy(body).into_owned()),
            ..Self::default()
        }
    }

    /// Whether the body decoded into the expected shape
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.decode_failure.is_none()
    }
}

impl ErrorMessage {
    /// Read each field on its own, keeping those whose type can be used
    fn from_loose_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            error: loose_number(fields.get("error")).unwrap_or_default(),
            message: loose_text(fields.get("message")).unwrap_or_default(),
            cause: fields.get("cause").filter(|v| !v.is_null()).cloned(),
            remote_address: loose_text(fields.get("remoteAddress")),
            request: loose_text(fields.get("request")),
            status_code: loose_number(fields.get("statusCode"))
                .and_then(|code| u16::try_from(code).ok()),
        }
    }
}

/// A string, or a number rendered as text
fn loose_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// An integer, or a string holding one
fn loose_number(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref failure) = self.decode_failure {
            if self.code.is_empty() && self.message.message.is_empty() {
                let raw = self.raw_body.as_deref().unwrap_or_default();
                return write!(f, "undecodable error body ({failure}): {raw}");
            }
        }
        if self.code.is_empty() {
            write!(f, "{}", self.message.message)?;
        } else {
            write!(f, "{}: {}", self.code, self.message.message)?;
        }
        if self.message.error != 0 {
            write!(f, " (error {})", self.message.error)?;
        }
        Ok(())
    }
}

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Method the dispatcher does not send
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),

    /// Header name or value that cannot go on the wire
    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader {
        /// Header name as given
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Query parameter whose value is a nested structure
    #[error("Query parameter `{0}` is nested and cannot be flattened into a query string")]
    NestedQueryParam(String),

    /// Query parameters that are not a flat record
    #[error("Query parameters must serialize to an object, got {0}")]
    InvalidQueryParams(String),

    /// Request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Transport-level failure (connect, I/O, timeout)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// API returned a non-2xx response
    #[error("API error ({status}): {error}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Decoded error body
        error: StructuredError,
    },

    /// A 2xx body did not match the expected shape
    #[error("Failed to decode response body (HTTP {status}): {source}")]
    Decode {
        /// HTTP status code
        status: u16,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// The call did not finish within the client timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the call
    #[error("Request cancelled before completion")]
    Cancelled,

    /// Every allowed attempt failed with a transient error
    #[error("All {attempts} attempts failed: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error observed on the final attempt
        last: Box<ApiError>,
    },

    /// Error from the resilience layer
    #[error(transparent)]
    Core(fleetline_core::Error),
}

impl From<fleetline_core::Error> for ApiError {
    fn from(err: fleetline_core::Error) -> Self {
        match err.code {
            ErrorCode::Cancelled => Self::Cancelled,
            ErrorCode::InvalidConfigValue => Self::Config(err.to_string()),
            ErrorCode::TokenUnavailable => Self::Core(err),
        }
    }
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a remote error from a status and raw body
    #[must_use]
    pub fn remote(status: u16, body: &[u8]) -> Self {
        Self::Remote {
            status,
            error: StructuredError::from_body(body),
        }
    }

    /// Check if this error is worth another attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            Self::Remote { status, .. } => RetryDecision::for_status(*status) == RetryDecision::Retry,
            Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::InvalidUrl(_)
            | Self::UnsupportedMethod(_)
            | Self::InvalidHeader { .. }
            | Self::NestedQueryParam(_)
            | Self::InvalidQueryParams(_)
            | Self::Encode(_)
            | Self::Decode { .. }
            | Self::Timeout(_)
            | Self::Cancelled
            | Self::RetriesExhausted { .. }
            | Self::Core(_) => false,
        }
    }

    /// HTTP status of the response behind this error, if there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// The decoded error body, looking through exhausted retries
    #[must_use]
    pub fn structured(&self) -> Option<&StructuredError> {
        match self {
            Self::Remote { error, .. } => Some(error),
            Self::RetriesExhausted { last, .. } => last.structured(),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_full_body() {
        let body = br#"{
            "code": "InvalidArgument",
            "message": {
                "error": 2000,
                "message": "bad name",
                "cause": "name is required",
                "remoteAddress": "203.0.113.7",
                "request": "5a1e0c3e-9c3b-4c33-a0ec-6b1d7cbd1ae1"
            }
        }"#;

        let error = StructuredError::from_body(body);
        assert_eq!(error.code, "InvalidArgument");
        assert_eq!(error.message.error, 2000);
        assert_eq!(error.message.message, "bad name");
        assert_eq!(
            error.message.cause,
            Some(serde_json::Value::String("name is required".into()))
        );
        assert_eq!(error.message.remote_address.as_deref(), Some("203.0.113.7"));
        assert!(error.message.request.is_some());
        assert!(error.message.status_code.is_none());
        assert!(error.is_complete());
    }

    #[test]
    fn test_structured_error_missing_fields() {
        let error = StructuredError::from_body(br#"{"code":"Forbidden"}"#);
        assert_eq!(error.code, "Forbidden");
        assert_eq!(error.message, ErrorMessage::default());
        assert!(error.is_complete());

        let empty = StructuredError::from_body(b"{}");
        assert!(empty.code.is_empty());
        assert!(empty.is_complete());
    }

    #[test]
    fn test_structured_error_string_message() {
        let error = StructuredError::from_body(br#"{"code":"Unauthorized","message":"nope"}"#);
        assert_eq!(error.code, "Unauthorized");
        assert_eq!(error.message.message, "nope");
        assert!(!error.is_complete());
    }

    #[test]
    fn test_structured_error_keeps_fields_around_a_mistyped_one() {
        let error = StructuredError::from_body(
            br#"{"code":"InvalidArgument","message":{"error":"2000","message":"bad name","request":"r1","remoteAddress":false}}"#,
        );
        assert_eq!(error.code, "InvalidArgument");
        assert_eq!(error.message.error, 2000);
        assert_eq!(error.message.message, "bad name");
        assert_eq!(error.message.request.as_deref(), Some("r1"));
        assert!(error.message.remote_address.is_none());
        assert!(!error.is_complete());
    }

    #[test]
    fn test_structured_error_numeric_code_and_status() {
        let error = StructuredError::from_body(
            br#"{"code":429,"message":{"message":"slow down","statusCode":"429","cause":{"retry":true}}}"#,
        );
        assert_eq!(error.code, "429");
        assert_eq!(error.message.message, "slow down");
        assert_eq!(error.message.status_code, Some(429));
        assert_eq!(error.message.cause, Some(serde_json::json!({"retry": true})));
    }

    #[test]
    fn test_structured_error_not_json() {
        let error = StructuredError::from_body(b"<html>Bad Gateway</html>");
        assert!(error.code.is_empty());
        assert!(error.decode_failure.is_some());
        assert_eq!(error.raw_body.as_deref(), Some("<html>Bad Gateway</html>"));
        assert!(error.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_structured_error_empty_body() {
        let error = StructuredError::from_body(b"");
        assert!(error.decode_failure.is_some());
        assert_eq!(error.raw_body.as_deref(), Some(""));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::remote(429, b"{}").is_retryable());
        assert!(ApiError::remote(412, b"{}").is_retryable());
        for status in [400, 401, 403, 404, 500, 503] {
            assert!(!ApiError::remote(status, b"{}").is_retryable());
        }
        assert!(!ApiError::config("missing api key").is_retryable());
        assert!(!ApiError::Cancelled.is_retryable());
        assert!(!ApiError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_client_and_server_errors() {
        assert!(ApiError::remote(404, b"{}").is_client_error());
        assert!(!ApiError::remote(404, b"{}").is_server_error());
        assert!(ApiError::remote(502, b"{}").is_server_error());
    }

    #[test]
    fn test_structured_through_exhausted_retries() {
        let err = ApiError::RetriesExhausted {
            attempts: 4,
            last: Box::new(ApiError::remote(
                429,
                br#"{"code":"TooManyRequests","message":{"error":2300,"message":"slow down"}}"#,
            )),
        };

        assert_eq!(err.status(), Some(429));
        let structured = err.structured().unwrap();
        assert_eq!(structured.code, "TooManyRequests");
        assert_eq!(structured.message.error, 2300);
        assert!(err.to_string().contains("All 4 attempts failed"));
    }

    #[test]
    fn test_core_errors_map_to_api_errors() {
        let cancelled: ApiError = fleetline_core::Error::cancelled("stop").into();
        assert!(matches!(cancelled, ApiError::Cancelled));

        let config: ApiError = fleetline_core::Error::invalid_config("burst", "bad").into();
        assert!(matches!(config, ApiError::Config(_)));

        let other: ApiError = fleetline_core::Error::token_unavailable().into();
        assert!(matches!(other, ApiError::Core(_)));
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ApiError::remote(
            400,
            br#"{"code":"InvalidArgument","message":{"error":2000,"message":"bad name"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "API error (400): InvalidArgument: bad name (error 2000)"
        );
    }
}
