//! Converts `reqwest` responses and transport failures into the shared
//! [`ProviderError`] taxonomy, preserving `Retry-After` for rate limits.

use alertproxy_core::{NetworkErrorKind, ProviderError};

/// Builds a [`ProviderError::Http`] from a non-success response, capturing
/// `Retry-After` if present. `body` is the already-read response body
/// (read once by the caller since `reqwest::Response::text` consumes it).
pub fn http_error(provider: &str, status: reqwest::StatusCode, retry_after: Option<u64>, body: String) -> ProviderError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    let mut err = ProviderError::http(status.as_u16(), provider, message);
    if let Some(secs) = retry_after {
        err = err.with_retry_after(secs);
    }
    err
}

/// Parses the `Retry-After` header as whole seconds, ignoring HTTP-date
/// values (sinks in this spec only ever send delta-seconds).
pub fn retry_after_seconds(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Classifies a transport-level `reqwest::Error` (the request never
/// produced an HTTP response) into the network-error taxonomy.
pub fn network_error(provider: &str, err: &reqwest::Error) -> ProviderError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::ConnectionRefused
    } else if err.is_body() || err.is_decode() {
        NetworkErrorKind::Unknown
    } else {
        NetworkErrorKind::Unknown
    };
    ProviderError::network(provider, err.to_string(), kind)
}
