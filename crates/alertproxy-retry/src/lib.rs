//! Exponential-backoff retry engine with jitter, pluggable classifiers, and
//! cooperative cancellation.
//!
//! # Example
//!
//! ```
//! use alertproxy_retry::{classifier, do_retry, RetryStrategy};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[derive(Debug, Clone)]
//! # struct MyError;
//! # impl std::fmt::Display for MyError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "boom")
//! #     }
//! # }
//! # impl alertproxy_retry::RetryAfterHint for MyError {}
//! # async fn run() {
//! let strategy = RetryStrategy::default_preset(Arc::new(classifier::AllRetryable));
//! let cancel = CancellationToken::new();
//! let result: Result<&str, _> = do_retry(&cancel, &strategy, || async { Ok("ok") }).await;
//! assert!(result.is_ok());
//! # }
//! ```

pub mod classifier;
mod engine;
mod error;
mod events;
mod strategy;

pub use classifier::ErrorClassifier;
pub use engine::do_retry;
pub use error::RetryError;
pub use events::RetryEvent;
pub use strategy::{RetryAfterHint, RetryObserver, RetryOutcome, RetryStrategy, RetryStrategyBuilder};
