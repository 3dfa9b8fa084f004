//! Core infrastructure for the alert-history proxy dispatch stack.
//!
//! This crate provides the pieces every other crate in the workspace builds
//! on:
//! - [`error`] — a uniform HTTP+network error taxonomy with retryability
//!   predicates, the single source of truth for retry and metric decisions.
//! - [`events`] — a generic event/listener system used by the retry engine,
//!   circuit breaker, and queue for observability hooks.
//! - [`sanitize`] — URL/header/map redaction for log lines that might
//!   otherwise leak credentials.

pub mod error;
pub mod events;
pub mod sanitize;

pub use error::{NetworkErrorKind, ProviderError};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use sanitize::{sanitize_headers, sanitize_map, sanitize_url, SanitizedValue};
