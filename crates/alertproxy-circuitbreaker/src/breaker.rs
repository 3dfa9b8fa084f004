use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use alertproxy_core::EventListeners;

use crate::events::CircuitBreakerEvent;

/// Clock abstraction so breaker timeout arithmetic can be faked in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A target is either serving traffic (`Closed`), rejecting it (`Open`), or
/// cautiously probing recovery with a single in-flight call (`HalfOpen`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub success_threshold: usize,
    pub timeout: Duration,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: usize, success_threshold: usize, timeout: Duration) -> Self {
        Self {
            failure_threshold,
            success_threshold,
            timeout,
        }
    }

    /// 5 consecutive failures trip the breaker; 2 consecutive successes in
    /// `half_open` close it; 30s before the first recovery probe.
    pub fn default_config() -> Self {
        Self::new(5, 2, Duration::from_secs(30))
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: usize,
    consecutive_successes: usize,
    opened_at: Option<Instant>,
}

/// Per-target breaker. `canAttempt`/`recordSuccess`/`recordFailure` are the
/// only mutating entry points; a single mutex per breaker guards all three,
/// matching the concurrency note that reads dominate at the registry level
/// but each breaker's own state is simple enough for one lock.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    pub fn with_clock(name: impl Into<String>, config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
            }),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: alertproxy_core::EventListener<CircuitBreakerEvent> + 'static,
    {
        self.event_listeners.add(listener);
    }

    /// True iff `closed`, or `open` with the recovery timeout elapsed (which
    /// transitions the breaker to `halfOpen` as a side effect of asking).
    pub fn can_attempt(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("open state always has opened_at");
                if self.clock.now().duration_since(opened_at) >= self.config.timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.consecutive_successes = 0;
                    inner.consecutive_failures = 0;

                    #[cfg(feature = "tracing")]
                    tracing::info!(target = %self.name, "circuit breaker half-open");

                    self.event_listeners.emit(&CircuitBreakerEvent::HalfOpened {
                        target: self.name.clone(),
                        timestamp: Instant::now(),
                    });
                    true
                } else {
                    self.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                        target: self.name.clone(),
                        timestamp: Instant::now(),
                        state: CircuitState::Open,
                    });
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.consecutive_successes = 0;
                    inner.opened_at = None;

                    #[cfg(feature = "tracing")]
                    tracing::info!(target = %self.name, "circuit breaker closed");

                    self.event_listeners.emit(&CircuitBreakerEvent::Closed {
                        target: self.name.clone(),
                        timestamp: Instant::now(),
                    });
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.trip(&mut inner);
                }
            }
            CircuitState::HalfOpen => {
                self.trip(&mut inner);
            }
            CircuitState::Open => {}
        }
    }

    fn trip(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(self.clock.now());
        let failures = inner.consecutive_failures;
        inner.consecutive_successes = 0;

        #[cfg(feature = "tracing")]
        tracing::warn!(target = %self.name, consecutive_failures = failures, "circuit breaker tripped");

        #[cfg(feature = "metrics")]
        metrics::counter!("circuit_breaker_trips_total", "target" => self.name.clone()).increment(1);

        self.event_listeners.emit(&CircuitBreakerEvent::Tripped {
            target: self.name.clone(),
            timestamp: Instant::now(),
            consecutive_failures: failures,
        });
    }
}
