use std::time::Instant;

use alertproxy_core::ResilienceEvent;

/// Job lifecycle events, for the same tracing-span/test-probe uses as the
/// retry and circuit-breaker event streams.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Submitted {
        target: String,
        priority: &'static str,
        timestamp: Instant,
    },
    SubmissionRejected {
        priority: &'static str,
        timestamp: Instant,
    },
    Started {
        target: String,
        timestamp: Instant,
    },
    Succeeded {
        target: String,
        attempts: usize,
        timestamp: Instant,
    },
    Failed {
        target: String,
        attempts: usize,
        timestamp: Instant,
    },
    Skipped {
        target: String,
        timestamp: Instant,
    },
    DlqWritten {
        target: String,
        timestamp: Instant,
    },
    DlqWriteFailed {
        target: String,
        timestamp: Instant,
    },
}

impl QueueEvent {
    fn target_name(&self) -> &str {
        match self {
            QueueEvent::Submitted { target, .. }
            | QueueEvent::Started { target, .. }
            | QueueEvent::Succeeded { target, .. }
            | QueueEvent::Failed { target, .. }
            | QueueEvent::Skipped { target, .. }
            | QueueEvent::DlqWritten { target, .. }
            | QueueEvent::DlqWriteFailed { target, .. } => target,
            QueueEvent::SubmissionRejected { priority, .. } => priority,
        }
    }
}

impl ResilienceEvent for QueueEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::Submitted { .. } => "submitted",
            QueueEvent::SubmissionRejected { .. } => "submission_rejected",
            QueueEvent::Started { .. } => "started",
            QueueEvent::Succeeded { .. } => "succeeded",
            QueueEvent::Failed { .. } => "failed",
            QueueEvent::Skipped { .. } => "skipped",
            QueueEvent::DlqWritten { .. } => "dlq_written",
            QueueEvent::DlqWriteFailed { .. } => "dlq_write_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            QueueEvent::Submitted { timestamp, .. }
            | QueueEvent::SubmissionRejected { timestamp, .. }
            | QueueEvent::Started { timestamp, .. }
            | QueueEvent::Succeeded { timestamp, .. }
            | QueueEvent::Failed { timestamp, .. }
            | QueueEvent::Skipped { timestamp, .. }
            | QueueEvent::DlqWritten { timestamp, .. }
            | QueueEvent::DlqWriteFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.target_name()
    }
}

/// Metrics hook for the queue, kept decoupled from any specific backend —
/// the facade wires a [`alertproxy_metrics::PublishingMetrics`]-backed
/// implementation in, the same pattern as the retry engine's observer.
pub trait QueueObserver: Send + Sync {
    fn record_job_processed(&self, target: &str, status: &str);
    fn record_job_duration(&self, target: &str, priority: &str, seconds: f64);
    fn record_retry_attempt(&self, target: &str, error_type: &str);
    fn set_queue_size(&self, priority: &str, size: i64);
    fn set_queue_capacity_utilization(&self, priority: &str, utilization: f64);
    fn worker_acquired(&self);
    fn worker_released(&self);
    fn set_workers_idle(&self, n: i64);
    fn record_submission_rejected(&self, priority: &str);
    fn record_circuit_breaker_trip(&self, target: &str);
    fn record_dlq_write(&self, target: &str);
}
