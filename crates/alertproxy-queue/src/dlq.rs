//! Dead-letter hand-off. A job that permanently fails (classifier said so,
//! or retries were exhausted) is handed to this collaborator rather than
//! dropped, so nothing firing is silently lost.

use async_trait::async_trait;

use crate::job::Job;

#[derive(Debug, Clone, thiserror::Error)]
#[error("dead-letter write failed: {0}")]
pub struct DlqError(pub String);

/// External dead-letter store. The queue itself has no opinion on durability
/// — a facade wires in whatever backs this (a file, a topic, a table).
#[async_trait]
pub trait DlqRepository: Send + Sync {
    async fn write(&self, job: &Job) -> Result<(), DlqError>;
}

/// An envelope carrying everything a dead-letter consumer needs to inspect
/// or replay a failed job, without exposing `Job`'s internal mutable state
/// directly.
#[derive(Debug, Clone)]
pub struct DlqEnvelope {
    pub job_id: uuid::Uuid,
    pub target: String,
    pub fingerprint: String,
    pub retry_count: usize,
    pub last_error: Option<String>,
    pub error_type: &'static str,
}

impl DlqEnvelope {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            target: job.target_name().to_string(),
            fingerprint: job.enriched_alert.fingerprint.clone(),
            retry_count: job.retry_count,
            last_error: job.last_error.clone(),
            error_type: job.error_type.as_str(),
        }
    }
}
