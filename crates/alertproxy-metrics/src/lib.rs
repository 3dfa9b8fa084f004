//! Namespaced Prometheus metrics registry, initialized once at startup and
//! injected into every component that records a metric. Instrument names,
//! label sets, and bucket boundaries are fixed here, at construction — call
//! sites get typed recording methods on a sub-registry, never raw access to
//! a counter or histogram by name.

mod buckets;
mod cache;
mod database;
mod http;
mod publishing;

pub use cache::CacheMetrics;
pub use database::DatabaseMetrics;
pub use http::HttpMetrics;
pub use publishing::PublishingMetrics;

const NAMESPACE: &str = "alert_history";

/// Owns the sub-registries and the `prometheus::Registry` they were
/// registered into. Construct once per process from a registerer supplied
/// by the embedding binary (bring-your-own-registry, same as a Prometheus
/// exporter crate would expect).
pub struct Registry {
    inner: prometheus::Registry,
    pub publishing: PublishingMetrics,
    pub http: HttpMetrics,
    pub database: DatabaseMetrics,
    pub cache: CacheMetrics,
}

impl Registry {
    pub fn new(inner: prometheus::Registry) -> prometheus::Result<Self> {
        let publishing = PublishingMetrics::register(&inner, NAMESPACE)?;
        let http = HttpMetrics::register(&inner, NAMESPACE)?;
        let database = DatabaseMetrics::register(&inner, NAMESPACE)?;
        let cache = CacheMetrics::register(&inner, NAMESPACE)?;

        Ok(Self {
            inner,
            publishing,
            http,
            database,
            cache,
        })
    }

    /// Builds on a fresh default `prometheus::Registry`, for binaries that
    /// don't already own one (tests, standalone deployments).
    pub fn new_default() -> prometheus::Result<Self> {
        Self::new(prometheus::Registry::new())
    }

    /// The underlying registry, for wiring an HTTP scrape endpoint.
    pub fn prometheus_registry(&self) -> &prometheus::Registry {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_without_name_collisions() {
        Registry::new_default().expect("registry should register cleanly");
    }

    #[test]
    fn recorded_metrics_appear_under_the_shared_namespace() {
        let registry = Registry::new_default().unwrap();
        registry.publishing.record_job_processed("slack", "succeeded");
        registry.http.record_request("slack", "2xx", 0.1);

        let names: Vec<_> = registry
            .prometheus_registry()
            .gather()
            .into_iter()
            .map(|f| f.name().to_string())
            .collect();
        assert!(names.contains(&"alert_history_jobs_processed_total".to_string()));
        assert!(names.contains(&"alert_history_http_request_duration_seconds".to_string()));
    }

    #[test]
    fn recording_sites_do_not_panic() {
        let registry = Registry::new_default().unwrap();
        registry.publishing.record_job_processed("slack", "succeeded");
        registry.publishing.record_job_duration("slack", "high", 0.05);
        registry.publishing.record_retry_attempt("slack", "http_5xx");
        registry.publishing.set_queue_size("high", 3);
        registry.publishing.set_queue_capacity_utilization("high", 0.3);
        registry.publishing.worker_acquired();
        registry.publishing.worker_released();
        registry.publishing.record_submission_rejected("low");
        registry.publishing.record_incident_created("critical");
        registry.publishing.record_circuit_breaker_trip("pagerduty");
        registry.publishing.record_dlq_write("rootly");
        registry.http.record_request("slack", "2xx", 0.12);
        registry.database.record_query("dlq_write", "success", 0.02);
        registry.cache.record_hit();
        registry.cache.record_miss();
        registry.cache.set_entries(42);

        let families = registry.prometheus_registry().gather();
        assert!(!families.is_empty());
    }
}
