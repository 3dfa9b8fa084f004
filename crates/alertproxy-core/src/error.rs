//! Uniform HTTP+network error taxonomy.
//!
//! A single error type carries everything retry, circuit-breaker, and
//! metrics decisions need. Predicates are derived purely from the status
//! code (or, for pre-HTTP failures, from the [`NetworkErrorKind`]) so that
//! every layer above agrees on what counts as retryable.

use std::collections::BTreeMap;

/// Classification of a pre-HTTP network failure (status code 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The operation did not complete before a deadline.
    Timeout,
    /// The remote end actively refused the connection.
    ConnectionRefused,
    /// An established connection was reset by the peer.
    ConnectionReset,
    /// DNS resolution failed. `temporary` distinguishes a transient
    /// resolver hiccup (retryable) from NXDOMAIN-style permanent failures.
    DnsError { temporary: bool },
    /// The destination network is unreachable.
    NetworkUnreachable,
    /// The destination host is unreachable.
    HostUnreachable,
    /// Write failed because the peer closed its read half.
    BrokenPipe,
    /// The call was cancelled. `deadline_exceeded` distinguishes a context
    /// deadline firing (retryable) from explicit caller cancellation (not).
    Canceled { deadline_exceeded: bool },
    /// Catch-all for network failures that don't fit the above.
    Unknown,
}

impl NetworkErrorKind {
    /// The stable classification string used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::ConnectionRefused => "connection_refused",
            NetworkErrorKind::ConnectionReset => "connection_reset",
            NetworkErrorKind::DnsError { .. } => "dns_error",
            NetworkErrorKind::NetworkUnreachable => "network_unreachable",
            NetworkErrorKind::HostUnreachable => "host_unreachable",
            NetworkErrorKind::BrokenPipe => "broken_pipe",
            NetworkErrorKind::Canceled { .. } => "canceled",
            NetworkErrorKind::Unknown => "unknown",
        }
    }

    /// Whether this network failure is worth retrying.
    ///
    /// Timeouts, connection refused/reset, network/host unreachable, broken
    /// pipe, and a deadline-exceeded cancellation are retryable. Explicit
    /// user cancellation and permanent DNS failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkErrorKind::Timeout
            | NetworkErrorKind::ConnectionRefused
            | NetworkErrorKind::ConnectionReset
            | NetworkErrorKind::NetworkUnreachable
            | NetworkErrorKind::HostUnreachable
            | NetworkErrorKind::BrokenPipe => true,
            NetworkErrorKind::DnsError { temporary } => *temporary,
            NetworkErrorKind::Canceled { deadline_exceeded } => *deadline_exceeded,
            NetworkErrorKind::Unknown => false,
        }
    }
}

/// The taxonomy error. Every publisher and sink-facing call returns this
/// type (or wraps it); retry, circuit-breaker, and metrics code all derive
/// their decisions from its predicates.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// An HTTP response came back from the sink with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        status: u16,
        provider: String,
        message: String,
        retry_after_seconds: Option<u64>,
        details: BTreeMap<String, String>,
    },
    /// The request never produced an HTTP response.
    #[error("{provider} network error ({}): {message}", kind.as_str())]
    Network {
        provider: String,
        message: String,
        kind: NetworkErrorKind,
        details: BTreeMap<String, String>,
    },
}

impl ProviderError {
    pub fn http(
        status: u16,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProviderError::Http {
            status,
            provider: provider.into(),
            message: message.into(),
            retry_after_seconds: None,
            details: BTreeMap::new(),
        }
    }

    pub fn network(
        provider: impl Into<String>,
        message: impl Into<String>,
        kind: NetworkErrorKind,
    ) -> Self {
        ProviderError::Network {
            provider: provider.into(),
            message: message.into(),
            kind,
            details: BTreeMap::new(),
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        if let ProviderError::Http {
            retry_after_seconds,
            ..
        } = &mut self
        {
            *retry_after_seconds = Some(seconds);
        }
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            ProviderError::Http { details, .. } | ProviderError::Network { details, .. } => {
                details.insert(key.into(), value.into());
            }
        }
        self
    }

    /// The provider name (`slack`, `pagerduty`, `rootly`, `webhook`, ...).
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Http { provider, .. } => provider,
            ProviderError::Network { provider, .. } => provider,
        }
    }

    /// HTTP status code, or `0` for a pre-HTTP network failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ProviderError::Http { status, .. } => *status,
            ProviderError::Network { .. } => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderError::Http { message, .. } => message,
            ProviderError::Network { message, .. } => message,
        }
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            ProviderError::Http {
                retry_after_seconds,
                ..
            } => *retry_after_seconds,
            ProviderError::Network { .. } => None,
        }
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        match self {
            ProviderError::Http { details, .. } => details,
            ProviderError::Network { details, .. } => details,
        }
    }

    pub fn network_kind(&self) -> Option<NetworkErrorKind> {
        match self {
            ProviderError::Network { kind, .. } => Some(*kind),
            ProviderError::Http { .. } => None,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.status_code() == 429
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.status_code(), 401 | 403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.status_code(), 408 | 504)
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == 409
    }

    pub fn is_validation(&self) -> bool {
        self.status_code() == 422
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), 400..=499)
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), 500..=599)
    }

    /// Whether this error is, in isolation, worth retrying.
    ///
    /// For HTTP errors: `429` or any `5xx`. For network errors: delegates to
    /// [`NetworkErrorKind::is_retryable`].
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Network { kind, .. } => kind.is_retryable(),
        }
    }

    /// The status-derived label used for metrics (e.g.
    /// `retry_attempts_total{error_type}`), as distinct from the coarse
    /// transient/permanent classification a retry engine or job uses to
    /// decide what to *do*. Network errors reuse their
    /// [`NetworkErrorKind::as_str`] label.
    pub fn metric_error_type(&self) -> &'static str {
        match self {
            ProviderError::Http { status, .. } => match status {
                429 => "rate_limit",
                408 | 504 => "timeout",
                409 => "conflict",
                422 => "validation",
                401 | 403 => "auth",
                404 => "not_found",
                500..=599 => "server_error",
                400..=499 => "client_error",
                _ => "unknown",
            },
            ProviderError::Network { kind, .. } => kind.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_predicates_derive_from_status() {
        let e = ProviderError::http(429, "slack", "rate limited");
        assert!(e.is_rate_limit());
        assert!(e.is_retryable());
        assert!(e.is_client_error());
        assert!(!e.is_server_error());

        let e = ProviderError::http(503, "pagerduty", "unavailable");
        assert!(e.is_server_error());
        assert!(e.is_retryable());

        let e = ProviderError::http(400, "rootly", "bad request");
        assert!(e.is_client_error());
        assert!(!e.is_retryable());

        let e = ProviderError::http(404, "rootly", "not found");
        assert!(e.is_not_found());

        let e = ProviderError::http(409, "rootly", "conflict");
        assert!(e.is_conflict());

        let e = ProviderError::http(422, "webhook", "invalid payload");
        assert!(e.is_validation());

        let e = ProviderError::http(401, "slack", "unauthorized");
        assert!(e.is_auth());

        let e = ProviderError::http(408, "slack", "request timeout");
        assert!(e.is_timeout());
    }

    #[test]
    fn network_zero_status_and_retryability() {
        let e = ProviderError::network("slack", "dial tcp: i/o timeout", NetworkErrorKind::Timeout);
        assert_eq!(e.status_code(), 0);
        assert!(e.is_retryable());

        let e = ProviderError::network(
            "slack",
            "context canceled",
            NetworkErrorKind::Canceled {
                deadline_exceeded: false,
            },
        );
        assert!(!e.is_retryable());

        let e = ProviderError::network(
            "slack",
            "context deadline exceeded",
            NetworkErrorKind::Canceled {
                deadline_exceeded: true,
            },
        );
        assert!(e.is_retryable());

        let e = ProviderError::network(
            "slack",
            "no such host",
            NetworkErrorKind::DnsError { temporary: false },
        );
        assert!(!e.is_retryable());

        let e = ProviderError::network(
            "slack",
            "temporary failure in name resolution",
            NetworkErrorKind::DnsError { temporary: true },
        );
        assert!(e.is_retryable());
    }

    #[test]
    fn retry_after_and_details_round_trip() {
        let e = ProviderError::http(429, "slack", "rate limited")
            .with_retry_after(30)
            .with_detail("field", "incident.id");
        assert_eq!(e.retry_after_seconds(), Some(30));
        assert_eq!(e.details().get("field").map(String::as_str), Some("incident.id"));
    }

    #[test]
    fn metric_error_type_is_status_derived() {
        assert_eq!(ProviderError::http(500, "slack", "boom").metric_error_type(), "server_error");
        assert_eq!(ProviderError::http(503, "slack", "boom").metric_error_type(), "server_error");
        assert_eq!(ProviderError::http(429, "slack", "limited").metric_error_type(), "rate_limit");
        assert_eq!(ProviderError::http(400, "slack", "bad").metric_error_type(), "client_error");
        assert_eq!(ProviderError::http(404, "slack", "gone").metric_error_type(), "not_found");

        let e = ProviderError::network("slack", "dial tcp: i/o timeout", NetworkErrorKind::Timeout);
        assert_eq!(e.metric_error_type(), "timeout");
    }
}
