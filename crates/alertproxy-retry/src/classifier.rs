//! Pluggable error classifiers.
//!
//! Classifier polymorphism maps naturally to a one-method trait; composition
//! (e.g. "database" extends "standard") is done by wrapping rather than
//! inheritance.

use alertproxy_core::ProviderError;
use std::sync::Arc;

/// Decides whether a given error is worth retrying.
pub trait ErrorClassifier<E>: Send + Sync {
    fn is_retryable(&self, err: &E) -> bool;
}

/// Classifies purely from the [`ProviderError`] taxonomy predicates — the
/// baseline every other `ProviderError` classifier wraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl ErrorClassifier<ProviderError> for Standard {
    fn is_retryable(&self, err: &ProviderError) -> bool {
        err.is_retryable()
    }
}

fn message_contains_any(message: &str, needles: &[&str]) -> bool {
    let lower = message.to_ascii_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Standard, augmented with database-specific transient patterns: lock
/// contention, deadlocks, serialization failures, and dropped connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Database;

const DATABASE_TRANSIENT_PATTERNS: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "could not serialize access",
    "database is locked",
    "connection reset by peer",
    "broken connection",
    "server closed the connection",
];

impl ErrorClassifier<ProviderError> for Database {
    fn is_retryable(&self, err: &ProviderError) -> bool {
        if Standard.is_retryable(err) {
            return true;
        }
        message_contains_any(err.message(), DATABASE_TRANSIENT_PATTERNS)
    }
}

/// Alias for [`Standard`] — publishing sinks use the same HTTP/network
/// predicates, with no provider-specific augmentation.
pub type Publishing = Standard;

/// Standard, augmented with Kubernetes API server throttling / temporary
/// unavailability patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kubernetes;

const KUBERNETES_TRANSIENT_PATTERNS: &[&str] =
    &["throttling", "client rate limiter", "apiserver not available", "api-unavailable"];

impl ErrorClassifier<ProviderError> for Kubernetes {
    fn is_retryable(&self, err: &ProviderError) -> bool {
        if Standard.is_retryable(err) {
            return true;
        }
        message_contains_any(err.message(), KUBERNETES_TRANSIENT_PATTERNS)
    }
}

/// Standard, but treats an open circuit breaker or a malformed request
/// reported by the LLM provider as permanent even if the HTTP status would
/// otherwise look transient.
#[derive(Debug, Clone, Copy, Default)]
pub struct Llm;

const LLM_PERMANENT_PATTERNS: &[&str] = &["circuit breaker open", "invalid request", "invalid response"];

impl ErrorClassifier<ProviderError> for Llm {
    fn is_retryable(&self, err: &ProviderError) -> bool {
        if message_contains_any(err.message(), LLM_PERMANENT_PATTERNS) {
            return false;
        }
        Standard.is_retryable(err)
    }
}

/// OR-combines any number of classifiers: retryable if any of them says so.
pub struct Composite<E> {
    classifiers: Vec<Arc<dyn ErrorClassifier<E>>>,
}

impl<E> Composite<E> {
    pub fn new(classifiers: Vec<Arc<dyn ErrorClassifier<E>>>) -> Self {
        Self { classifiers }
    }
}

impl<E> ErrorClassifier<E> for Composite<E> {
    fn is_retryable(&self, err: &E) -> bool {
        self.classifiers.iter().any(|c| c.is_retryable(err))
    }
}

/// Always retryable — for tests exercising retry-loop mechanics in
/// isolation from classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllRetryable;

impl<E> ErrorClassifier<E> for AllRetryable {
    fn is_retryable(&self, _err: &E) -> bool {
        true
    }
}

/// Never retryable — the counterpart to [`AllRetryable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetryable;

impl<E> ErrorClassifier<E> for NoRetryable {
    fn is_retryable(&self, _err: &E) -> bool {
        false
    }
}
