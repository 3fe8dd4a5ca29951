//! Building authenticated requests

use crate::error::{ApiError, ApiResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Body, Method, Request, Url};

/// Library identifier sent on every request
pub const USER_AGENT_VALUE: &str = concat!("fleetline-rs-", env!("CARGO_PKG_VERSION"));

/// Request correlation ID header
pub const X_REQUEST_ID: &str = "X-Request-ID";

const APPLICATION_JSON: &str = "application/json";

/// Extra header supplied by a caller; `None` values are skipped
pub type ExtraHeader = (String, Option<String>);

/// `Authorization` value for HTTP Basic with the API key as user and no password
#[must_use]
pub fn basic_auth_value(api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{api_key}:")))
}

/// Whether the method carries a JSON body; errors for methods the client never sends
pub fn method_has_body(method: &Method) -> ApiResult<bool> {
    match *method {
        Method::GET | Method::DELETE => Ok(false),
        Method::POST | Method::PUT => Ok(true),
        _ => Err(ApiError::UnsupportedMethod(method.clone())),
    }
}

/// Build a fully authenticated request.
///
/// Extra headers are applied last and replace defaults of the same name.
/// A body passed with GET or DELETE is not sent.
pub fn build(
    api_key: &str,
    method: &Method,
    url: Url,
    body: Option<&[u8]>,
    extra_headers: &[ExtraHeader],
    request_id: &str,
) -> ApiResult<Request> {
    let has_body = method_has_body(method)?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }

    let mut auth = HeaderValue::from_str(&basic_auth_value(api_key)).map_err(|e| {
        ApiError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        }
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(X_REQUEST_ID, value);
    }

    for (name, value) in extra_headers {
        let Some(value) = value else { continue };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    let mut request = Request::new(method.clone(), url);
    *request.headers_mut() = headers;
    if has_body {
        if let Some(bytes) = body {
            *request.body_mut() = Some(Body::from(bytes.to_vec()));
        }
    }

    Ok(request)
}
