use alertproxy_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Observability events emitted by the retry engine.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    Retry {
        strategy_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    Success {
        strategy_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    MaxRetriesExceeded {
        strategy_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    NonRetryable {
        strategy_name: String,
        timestamp: Instant,
    },
    Cancelled {
        strategy_name: String,
        timestamp: Instant,
        during_backoff: bool,
    },
}

impl RetryEvent {
    fn name(&self) -> &str {
        match self {
            RetryEvent::Retry { strategy_name, .. }
            | RetryEvent::Success { strategy_name, .. }
            | RetryEvent::MaxRetriesExceeded { strategy_name, .. }
            | RetryEvent::NonRetryable { strategy_name, .. }
            | RetryEvent::Cancelled { strategy_name, .. } => strategy_name,
        }
    }
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            RetryEvent::NonRetryable { .. } => "non_retryable",
            RetryEvent::Cancelled { .. } => "cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::MaxRetriesExceeded { timestamp, .. }
            | RetryEvent::NonRetryable { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
