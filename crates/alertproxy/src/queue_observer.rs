//! Bridges [`alertproxy_queue::QueueObserver`] to a concrete
//! [`alertproxy_metrics::PublishingMetrics`] sub-registry, the same shape
//! the retry engine and circuit breaker crates expect a facade to supply
//! for their own observer traits.

use std::sync::Arc;

use alertproxy_metrics::Registry;
use alertproxy_queue::QueueObserver;

/// Holds the whole metrics [`Registry`] (not just its `publishing`
/// sub-registry) so the facade only needs one `Arc` per process, shared
/// between this observer and anything else (a scrape endpoint) that needs
/// the registry.
pub struct MetricsQueueObserver {
    registry: Arc<Registry>,
}

impl MetricsQueueObserver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl QueueObserver for MetricsQueueObserver {
    fn record_job_processed(&self, target: &str, status: &str) {
        self.registry.publishing.record_job_processed(target, status);
    }

    fn record_job_duration(&self, target: &str, priority: &str, seconds: f64) {
        self.registry.publishing.record_job_duration(target, priority, seconds);
    }

    fn record_retry_attempt(&self, target: &str, error_type: &str) {
        self.registry.publishing.record_retry_attempt(target, error_type);
    }

    fn set_queue_size(&self, priority: &str, size: i64) {
        self.registry.publishing.set_queue_size(priority, size);
    }

    fn set_queue_capacity_utilization(&self, priority: &str, utilization: f64) {
        self.registry.publishing.set_queue_capacity_utilization(priority, utilization);
    }

    fn worker_acquired(&self) {
        self.registry.publishing.worker_acquired();
    }

    fn worker_released(&self) {
        self.registry.publishing.worker_released();
    }

    fn set_workers_idle(&self, n: i64) {
        self.registry.publishing.set_workers_idle(n);
    }

    fn record_submission_rejected(&self, priority: &str) {
        self.registry.publishing.record_submission_rejected(priority);
    }

    fn record_circuit_breaker_trip(&self, target: &str) {
        self.registry.publishing.record_circuit_breaker_trip(target);
    }

    fn record_dlq_write(&self, target: &str) {
        self.registry.publishing.record_dlq_write(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_every_call_without_panicking() {
        let registry = Arc::new(Registry::new_default().unwrap());
        let observer = MetricsQueueObserver::new(registry);

        observer.record_job_processed("slack", "succeeded");
        observer.record_job_duration("slack", "high", 0.1);
        observer.record_retry_attempt("slack", "http_5xx");
        observer.set_queue_size("high", 3);
        observer.set_queue_capacity_utilization("high", 0.5);
        observer.worker_acquired();
        observer.worker_released();
        observer.set_workers_idle(2);
        observer.record_submission_rejected("low");
        observer.record_circuit_breaker_trip("pagerduty");
        observer.record_dlq_write("rootly");
    }
}
