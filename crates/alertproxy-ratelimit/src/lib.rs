//! Token-bucket rate limiting for the (out-of-scope) HTTP ingress: a global
//! bucket shared by every request, and a per-remote-IP bucket created
//! lazily and evicted once it's been idle at full capacity.
//!
//! Admission order is always global-first, per-IP-second (spec §4.9):
//! burning a global token for a request that then fails per-IP matches the
//! source's behavior and keeps per-IP lookups off the global hot path when
//! the whole system is saturated.

mod bucket;
mod config;
mod error;
mod events;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimitError;
pub use events::RateLimiterEvent;
pub use limiter::{RateLimitObserver, RateLimiter};
