//! The unit of work moving through the publishing queue, and the lifecycle
//! states it passes through between submission and a terminal outcome.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use alertproxy_types::{EnrichedAlert, Priority, Target};

/// `Queued -> Processing -> {Retrying -> Processing}* -> {Succeeded | Failed}`,
/// with `Failed` optionally followed by a dead-letter write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Processing,
    Retrying,
    Succeeded,
    Failed,
    Dlq,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Retrying => "retrying",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Dlq => "dlq",
        }
    }
}

/// How the last observed error was classified, independent of the sink
/// provider. Mirrors what the retry engine already decided via its
/// classifier so a job carries that verdict forward into the DLQ envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Transient,
    Permanent,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Transient => "transient",
            ErrorType::Permanent => "permanent",
            ErrorType::Unknown => "unknown",
        }
    }
}

/// A dispatch attempt in flight: an alert bound to a target, with its
/// submission metadata and mutable progress state.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub enriched_alert: EnrichedAlert,
    pub target: Target,
    pub submitted_at: DateTime<Utc>,
    pub priority: Priority,
    pub state: JobState,
    pub retry_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub error_type: ErrorType,
}

impl Job {
    pub fn new(enriched_alert: EnrichedAlert, target: Target, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4(),
            enriched_alert,
            target,
            submitted_at: Utc::now(),
            priority,
            state: JobState::Queued,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            last_error: None,
            error_type: ErrorType::Unknown,
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertproxy_types::TargetKind;
    use std::collections::BTreeMap;

    fn alert() -> EnrichedAlert {
        EnrichedAlert {
            fingerprint: "fp1".to_string(),
            status: alertproxy_types::AlertStatus::Firing,
            labels: BTreeMap::new(),
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: None,
            classification: None,
        }
    }

    #[test]
    fn new_job_starts_queued_and_unattempted() {
        let job = Job::new(alert(), Target::new("slack-oncall", TargetKind::Slack), Priority::High);
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.retry_count, 0);
        assert!(job.started_at.is_none());
        assert!(job.last_error.is_none());
    }
}
