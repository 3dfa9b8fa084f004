use prometheus::{CounterVec, GaugeVec, Opts, Registry};

/// Instrumentation for the incident-ID TTL cache.
pub struct CacheMetrics {
    pub(crate) operations_total: CounterVec,
    pub(crate) entries: GaugeVec,
}

impl CacheMetrics {
    pub(crate) fn register(registry: &Registry, namespace: &str) -> prometheus::Result<Self> {
        let operations_total = CounterVec::new(
            Opts::new("cache_operations_total", "Incident cache lookups by outcome").namespace(namespace),
            &["outcome"],
        )?;
        let entries = GaugeVec::new(
            Opts::new("cache_entries", "Current number of live incident cache entries").namespace(namespace),
            &[],
        )?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(entries.clone()))?;

        Ok(Self {
            operations_total,
            entries,
        })
    }

    pub fn record_hit(&self) {
        self.operations_total.with_label_values(&["hit"]).inc();
    }

    pub fn record_miss(&self) {
        self.operations_total.with_label_values(&["miss"]).inc();
    }

    pub fn set_entries(&self, n: i64) {
        self.entries.with_label_values(&[]).set(n as f64);
    }
}
