//! Wires the independent crates into one running proxy: a [`TargetRegistry`]
//! resolves targets to publishers, a [`alertproxy_circuitbreaker::CircuitBreakerRegistry`]
//! isolates failing targets, a [`alertproxy_queue::PublishingQueue`] drains
//! jobs through both, a [`alertproxy_metrics::Registry`] records everything,
//! and a [`alertproxy_reload::ReloadOrchestrator`] lets an operator change
//! targets or the dead-letter backend without a restart.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use alertproxy_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry};
use alertproxy_core::EventListeners;
use alertproxy_metrics::Registry as MetricsRegistry;
use alertproxy_queue::{PublishingQueue, QueueConfig, QueueError, QueueEvent};
use alertproxy_reload::{Reloadable, ReloadError, ReloadOrchestrator};
use alertproxy_types::{EnrichedAlert, Target};

use crate::dlq::{DlqConfig, ReloadableDlq};
use crate::queue_observer::MetricsQueueObserver;
use crate::targets::{DispatchTargetsConfig, TargetRegistry};

/// Everything the proxy's reloadable components jointly care about. Each
/// component adapter below extracts the slice it owns, per
/// [`alertproxy_reload::Reloadable`]'s documented contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub targets: DispatchTargetsConfig,
    pub dlq: DlqConfig,
}

struct TargetRegistryAdapter(Arc<TargetRegistry>);

#[async_trait]
impl Reloadable<ProxyConfig> for TargetRegistryAdapter {
    fn name(&self) -> &str {
        Reloadable::<DispatchTargetsConfig>::name(self.0.as_ref())
    }

    fn is_critical(&self) -> bool {
        Reloadable::<DispatchTargetsConfig>::is_critical(self.0.as_ref())
    }

    async fn reload(&self, new_config: &ProxyConfig) -> Result<(), ReloadError> {
        self.0.reload(&new_config.targets).await
    }
}

struct DlqAdapter(Arc<ReloadableDlq>);

#[async_trait]
impl Reloadable<ProxyConfig> for DlqAdapter {
    fn name(&self) -> &str {
        Reloadable::<DlqConfig>::name(self.0.as_ref())
    }

    fn is_critical(&self) -> bool {
        Reloadable::<DlqConfig>::is_critical(self.0.as_ref())
    }

    async fn reload(&self, new_config: &ProxyConfig) -> Result<(), ReloadError> {
        Reloadable::<DlqConfig>::reload(self.0.as_ref(), &new_config.dlq).await
    }
}

/// The assembled proxy. Owns the queue, the target/publisher map, the
/// per-target breakers, the metrics registry, and the reload orchestrator
/// that fronts both stateful pieces.
pub struct Dispatcher {
    queue: PublishingQueue,
    metrics: Arc<MetricsRegistry>,
    targets: Arc<TargetRegistry>,
    breakers: CircuitBreakerRegistry,
    dlq: Arc<ReloadableDlq>,
    orchestrator: ReloadOrchestrator<ProxyConfig>,
    current_config: parking_lot::Mutex<ProxyConfig>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Derives a priority lane from the alert and enqueues it (spec §4.5).
    pub fn submit(&self, alert: EnrichedAlert, target: Target) -> Result<(), QueueError> {
        self.queue.submit(alert, target)
    }

    /// Spawns the worker pool. Call once after construction.
    pub fn start(&self) {
        self.queue.start();
    }

    /// Closes intake and waits for in-flight jobs to drain.
    pub async fn stop(&self, timeout: Duration) -> Result<(), QueueError> {
        self.queue.stop(timeout).await
    }

    /// Toggles metrics-only mode: workers keep draining the queue without
    /// dispatching to any sink.
    pub fn set_metrics_only(&self, enabled: bool) {
        self.queue.mode().set_metrics_only(enabled);
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn dlq(&self) -> &ReloadableDlq {
        &self.dlq
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// The live breaker for a target, if any job has been attempted against
    /// it yet (breakers are discovered lazily on first dispatch).
    pub fn circuit_breaker(&self, target: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(target)
    }

    /// Applies a new target list and/or dead-letter backend. A critical
    /// component's failure (the target registry always is) rolls the whole
    /// batch back; the DLQ backend is non-critical, so a failed DLQ swap
    /// only logs a warning and leaves the prior backend in place.
    pub async fn reload(&self, new_config: ProxyConfig) -> Result<(), ReloadError> {
        let old_config = {
            let mut guard = self.current_config.lock();
            let old = guard.clone();
            *guard = new_config.clone();
            old
        };

        self.orchestrator.reload_all(&old_config, &new_config).await
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    queue_config: Option<QueueConfig>,
    circuit_breaker_config: Option<CircuitBreakerConfig>,
    targets_config: Option<DispatchTargetsConfig>,
    dlq_config: Option<DlqConfig>,
}

impl DispatcherBuilder {
    pub fn queue_config(mut self, config: QueueConfig) -> Self {
        self.queue_config = Some(config);
        self
    }

    pub fn circuit_breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker_config = Some(config);
        self
    }

    pub fn targets(mut self, config: DispatchTargetsConfig) -> Self {
        self.targets_config = Some(config);
        self
    }

    pub fn dlq(mut self, config: DlqConfig) -> Self {
        self.dlq_config = Some(config);
        self
    }

    pub fn build(self) -> Result<Dispatcher, ReloadError> {
        let queue_config = self.queue_config.unwrap_or_default();
        let breakers = CircuitBreakerRegistry::new(self.circuit_breaker_config.unwrap_or_else(CircuitBreakerConfig::default_config));
        let targets_config = self.targets_config.unwrap_or_else(|| DispatchTargetsConfig {
            targets: Vec::new(),
            http_timeout: Duration::from_secs(10),
            incident_ttl: Duration::from_secs(24 * 3600),
        });
        let dlq_config = self.dlq_config.unwrap_or_else(|| DlqConfig::new("primary"));

        let metrics = Arc::new(MetricsRegistry::new_default().map_err(|e| ReloadError::ConstructionFailed {
            name: "metrics".to_string(),
            message: e.to_string(),
        })?);
        let targets = Arc::new(TargetRegistry::new(targets_config.clone())?);
        let dlq = Arc::new(ReloadableDlq::new(dlq_config.clone()));
        let observer = Arc::new(MetricsQueueObserver::new(metrics.clone()));

        let queue = PublishingQueue::with_observer(
            queue_config,
            breakers.clone(),
            targets.clone(),
            dlq.clone(),
            Some(observer),
            EventListeners::<QueueEvent>::new(),
        );

        let orchestrator = ReloadOrchestrator::new(vec![
            Arc::new(TargetRegistryAdapter(targets.clone())),
            Arc::new(DlqAdapter(dlq.clone())),
        ]);

        Ok(Dispatcher {
            queue,
            metrics,
            targets,
            breakers,
            dlq,
            orchestrator,
            current_config: parking_lot::Mutex::new(ProxyConfig {
                targets: targets_config,
                dlq: dlq_config,
            }),
        })
    }
}
