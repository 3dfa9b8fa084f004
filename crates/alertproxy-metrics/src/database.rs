use prometheus::{CounterVec, HistogramVec, Opts, Registry};

use crate::buckets::database_buckets;

/// Instrumentation for the reloadable database pool (DLQ repository, config store).
pub struct DatabaseMetrics {
    pub(crate) queries_total: CounterVec,
    pub(crate) query_duration_seconds: HistogramVec,
}

impl DatabaseMetrics {
    pub(crate) fn register(registry: &Registry, namespace: &str) -> prometheus::Result<Self> {
        let queries_total = CounterVec::new(
            Opts::new("database_queries_total", "Database queries by operation and outcome").namespace(namespace),
            &["operation", "outcome"],
        )?;
        let query_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("database_query_duration_seconds", "Database query latency")
                .namespace(namespace)
                .buckets(database_buckets()),
            &["operation"],
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(query_duration_seconds.clone()))?;

        Ok(Self {
            queries_total,
            query_duration_seconds,
        })
    }

    pub fn record_query(&self, operation: &str, outcome: &str, seconds: f64) {
        self.queries_total.with_label_values(&[operation, outcome]).inc();
        self.query_duration_seconds.with_label_values(&[operation]).observe(seconds);
    }
}
