use prometheus::{CounterVec, GaugeVec, HistogramVec, Opts, Registry};

use crate::buckets::duration_buckets;

/// Everything the publishing queue and sinks record: job lifecycle,
/// retries, breaker trips, incident lifecycle, worker occupancy.
pub struct PublishingMetrics {
    pub(crate) jobs_processed_total: CounterVec,
    pub(crate) job_duration_seconds: HistogramVec,
    pub(crate) retry_attempts_total: CounterVec,
    pub(crate) queue_size: GaugeVec,
    pub(crate) queue_capacity_utilization: GaugeVec,
    pub(crate) workers_active: GaugeVec,
    pub(crate) workers_idle: GaugeVec,
    pub(crate) submission_rejected_total: CounterVec,
    pub(crate) incidents_created_total: CounterVec,
    pub(crate) circuit_breaker_trips_total: CounterVec,
    pub(crate) dlq_writes_total: CounterVec,
}

impl PublishingMetrics {
    pub(crate) fn register(registry: &Registry, namespace: &str) -> prometheus::Result<Self> {
        let jobs_processed_total = CounterVec::new(
            Opts::new("jobs_processed_total", "Publishing jobs completed by outcome").namespace(namespace),
            &["target", "status"],
        )?;
        let job_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("job_duration_seconds", "Time to process a publishing job")
                .namespace(namespace)
                .buckets(duration_buckets()),
            &["target", "priority"],
        )?;
        let retry_attempts_total = CounterVec::new(
            Opts::new("retry_attempts_total", "Retry attempts made against a sink").namespace(namespace),
            &["target", "error_type"],
        )?;
        let queue_size = GaugeVec::new(
            Opts::new("queue_size", "Current depth of a priority queue").namespace(namespace),
            &["priority"],
        )?;
        let queue_capacity_utilization = GaugeVec::new(
            Opts::new("queue_capacity_utilization", "Fraction of a priority queue's capacity in use").namespace(namespace),
            &["priority"],
        )?;
        let workers_active = GaugeVec::new(
            Opts::new("workers_active", "Workers currently processing a job").namespace(namespace),
            &[],
        )?;
        let workers_idle = GaugeVec::new(
            Opts::new("workers_idle", "Workers currently waiting for work").namespace(namespace),
            &[],
        )?;
        let submission_rejected_total = CounterVec::new(
            Opts::new("submission_rejected_total", "Submissions rejected because a queue was full").namespace(namespace),
            &["priority"],
        )?;
        let incidents_created_total = CounterVec::new(
            Opts::new("incidents_created_total", "Remote incidents created at a sink").namespace(namespace),
            &["severity"],
        )?;
        let circuit_breaker_trips_total = CounterVec::new(
            Opts::new("circuit_breaker_trips_total", "Times a target's circuit breaker tripped open").namespace(namespace),
            &["target"],
        )?;
        let dlq_writes_total = CounterVec::new(
            Opts::new("dlq_writes_total", "Jobs handed to the dead-letter queue").namespace(namespace),
            &["target"],
        )?;

        registry.register(Box::new(jobs_processed_total.clone()))?;
        registry.register(Box::new(job_duration_seconds.clone()))?;
        registry.register(Box::new(retry_attempts_total.clone()))?;
        registry.register(Box::new(queue_size.clone()))?;
        registry.register(Box::new(queue_capacity_utilization.clone()))?;
        registry.register(Box::new(workers_active.clone()))?;
        registry.register(Box::new(workers_idle.clone()))?;
        registry.register(Box::new(submission_rejected_total.clone()))?;
        registry.register(Box::new(incidents_created_total.clone()))?;
        registry.register(Box::new(circuit_breaker_trips_total.clone()))?;
        registry.register(Box::new(dlq_writes_total.clone()))?;

        Ok(Self {
            jobs_processed_total,
            job_duration_seconds,
            retry_attempts_total,
            queue_size,
            queue_capacity_utilization,
            workers_active,
            workers_idle,
            submission_rejected_total,
            incidents_created_total,
            circuit_breaker_trips_total,
            dlq_writes_total,
        })
    }

    pub fn record_job_processed(&self, target: &str, status: &str) {
        self.jobs_processed_total.with_label_values(&[target, status]).inc();
    }

    pub fn record_job_duration(&self, target: &str, priority: &str, seconds: f64) {
        self.job_duration_seconds.with_label_values(&[target, priority]).observe(seconds);
    }

    pub fn record_retry_attempt(&self, target: &str, error_type: &str) {
        self.retry_attempts_total.with_label_values(&[target, error_type]).inc();
    }

    pub fn set_queue_size(&self, priority: &str, size: i64) {
        self.queue_size.with_label_values(&[priority]).set(size as f64);
    }

    pub fn set_queue_capacity_utilization(&self, priority: &str, utilization: f64) {
        self.queue_capacity_utilization.with_label_values(&[priority]).set(utilization);
    }

    pub fn worker_acquired(&self) {
        self.workers_active.with_label_values(&[]).inc();
        self.workers_idle.with_label_values(&[]).dec();
    }

    pub fn worker_released(&self) {
        self.workers_active.with_label_values(&[]).dec();
        self.workers_idle.with_label_values(&[]).inc();
    }

    pub fn set_workers_idle(&self, n: i64) {
        self.workers_idle.with_label_values(&[]).set(n as f64);
    }

    pub fn record_submission_rejected(&self, priority: &str) {
        self.submission_rejected_total.with_label_values(&[priority]).inc();
    }

    pub fn record_incident_created(&self, severity: &str) {
        self.incidents_created_total.with_label_values(&[severity]).inc();
    }

    pub fn record_circuit_breaker_trip(&self, target: &str) {
        self.circuit_breaker_trips_total.with_label_values(&[target]).inc();
    }

    pub fn record_dlq_write(&self, target: &str) {
        self.dlq_writes_total.with_label_values(&[target]).inc();
    }
}
