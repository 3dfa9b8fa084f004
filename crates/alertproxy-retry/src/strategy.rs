use crate::events::RetryEvent;
use alertproxy_core::{EventListeners, FnListener, ProviderError};
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::ErrorClassifier;

/// Lets the retry engine honor a sink's `Retry-After` hint without coupling
/// it to [`ProviderError`] directly.
pub trait RetryAfterHint {
    fn retry_after_seconds(&self) -> Option<u64> {
        None
    }
}

impl RetryAfterHint for ProviderError {
    fn retry_after_seconds(&self) -> Option<u64> {
        ProviderError::retry_after_seconds(self)
    }
}

/// Outcome label recorded by an (optional) [`RetryObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Success,
    Retry,
    MaxRetries,
    NonRetryable,
}

/// Observer hook for metrics. Kept decoupled from any specific metrics
/// backend — the facade crate wires a Prometheus-backed implementation in.
pub trait RetryObserver: Send + Sync {
    fn record(&self, outcome: RetryOutcome);
}

/// Immutable, reusable retry configuration: `{maxAttempts, baseDelay,
/// maxDelay, multiplier, jitterRatio, classifier, observer}`.
pub struct RetryStrategy<E> {
    pub(crate) name: String,
    pub(crate) max_attempts: usize,
    pub(crate) base_delay: Duration,
    pub(crate) max_delay: Duration,
    pub(crate) multiplier: f64,
    pub(crate) jitter_ratio: f64,
    pub(crate) classifier: Arc<dyn ErrorClassifier<E>>,
    pub(crate) observer: Option<Arc<dyn RetryObserver>>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl<E> RetryStrategy<E> {
    pub fn builder(classifier: Arc<dyn ErrorClassifier<E>>) -> RetryStrategyBuilder<E> {
        RetryStrategyBuilder::new(classifier)
    }

    /// `Default`: 3 attempts, 100ms base, 30s cap, 2.0x multiplier, 15% jitter.
    pub fn default_preset(classifier: Arc<dyn ErrorClassifier<E>>) -> Self {
        Self::builder(classifier)
            .name("default")
            .max_attempts(3)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(30))
            .multiplier(2.0)
            .jitter_ratio(0.15)
            .build()
    }

    /// `Aggressive`: 5 attempts, 50ms base, 10s cap, 1.5x multiplier, 20% jitter.
    pub fn aggressive(classifier: Arc<dyn ErrorClassifier<E>>) -> Self {
        Self::builder(classifier)
            .name("aggressive")
            .max_attempts(5)
            .base_delay(Duration::from_millis(50))
            .max_delay(Duration::from_secs(10))
            .multiplier(1.5)
            .jitter_ratio(0.2)
            .build()
    }

    /// `Conservative`: 2 attempts, 500ms base, 60s cap, 3.0x multiplier, 10% jitter.
    pub fn conservative(classifier: Arc<dyn ErrorClassifier<E>>) -> Self {
        Self::builder(classifier)
            .name("conservative")
            .max_attempts(2)
            .base_delay(Duration::from_millis(500))
            .max_delay(Duration::from_secs(60))
            .multiplier(3.0)
            .jitter_ratio(0.1)
            .build()
    }

    /// `NoRetry`: a single attempt, no backoff.
    pub fn no_retry(classifier: Arc<dyn ErrorClassifier<E>>) -> Self {
        Self::builder(classifier)
            .name("no-retry")
            .max_attempts(1)
            .base_delay(Duration::from_millis(0))
            .max_delay(Duration::from_millis(0))
            .multiplier(1.0)
            .jitter_ratio(0.0)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

pub struct RetryStrategyBuilder<E> {
    name: String,
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_ratio: f64,
    classifier: Arc<dyn ErrorClassifier<E>>,
    observer: Option<Arc<dyn RetryObserver>>,
    event_listeners: EventListeners<RetryEvent>,
}

impl<E> RetryStrategyBuilder<E> {
    pub fn new(classifier: Arc<dyn ErrorClassifier<E>>) -> Self {
        Self {
            name: "<unnamed>".to_string(),
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_ratio: 0.15,
            classifier,
            observer: None,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }

    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = d;
        self
    }

    pub fn multiplier(mut self, m: f64) -> Self {
        self.multiplier = m;
        self
    }

    pub fn jitter_ratio(mut self, r: f64) -> Self {
        self.jitter_ratio = r.clamp(0.0, 1.0);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RetryEvent| {
                if let RetryEvent::Retry { attempt, delay, .. } = event {
                    f(*attempt, *delay);
                }
            }));
        self
    }

    pub fn build(self) -> RetryStrategy<E> {
        RetryStrategy {
            name: self.name,
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
            jitter_ratio: self.jitter_ratio,
            classifier: self.classifier,
            observer: self.observer,
            event_listeners: self.event_listeners,
        }
    }
}
