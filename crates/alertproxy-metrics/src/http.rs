use prometheus::{CounterVec, HistogramVec, Opts, Registry};

use crate::buckets::api_latency_buckets;

/// Outbound HTTP call instrumentation, shared by every sink.
pub struct HttpMetrics {
    pub(crate) requests_total: CounterVec,
    pub(crate) request_duration_seconds: HistogramVec,
}

impl HttpMetrics {
    pub(crate) fn register(registry: &Registry, namespace: &str) -> prometheus::Result<Self> {
        let requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Outbound HTTP calls by target and status class").namespace(namespace),
            &["target", "status_class"],
        )?;
        let request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("http_request_duration_seconds", "Outbound HTTP call latency")
                .namespace(namespace)
                .buckets(api_latency_buckets()),
            &["target"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
        })
    }

    pub fn record_request(&self, target: &str, status_class: &str, seconds: f64) {
        self.requests_total.with_label_values(&[target, status_class]).inc();
        self.request_duration_seconds.with_label_values(&[target]).observe(seconds);
    }
}
