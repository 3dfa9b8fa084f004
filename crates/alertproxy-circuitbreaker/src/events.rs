use alertproxy_core::ResilienceEvent;
use std::time::Instant;

use crate::breaker::CircuitState;

/// Observability events emitted by a single breaker's state machine.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    Tripped {
        target: String,
        timestamp: Instant,
        consecutive_failures: usize,
    },
    HalfOpened {
        target: String,
        timestamp: Instant,
    },
    Closed {
        target: String,
        timestamp: Instant,
    },
    CallRejected {
        target: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl CircuitBreakerEvent {
    fn target(&self) -> &str {
        match self {
            CircuitBreakerEvent::Tripped { target, .. }
            | CircuitBreakerEvent::HalfOpened { target, .. }
            | CircuitBreakerEvent::Closed { target, .. }
            | CircuitBreakerEvent::CallRejected { target, .. } => target,
        }
    }
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::Tripped { .. } => "tripped",
            CircuitBreakerEvent::HalfOpened { .. } => "half_opened",
            CircuitBreakerEvent::Closed { .. } => "closed",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::Tripped { timestamp, .. }
            | CircuitBreakerEvent::HalfOpened { timestamp, .. }
            | CircuitBreakerEvent::Closed { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.target()
    }
}
