use alertproxy_types::Priority;

/// Failures returned synchronously from [`crate::PublishingQueue::submit`].
/// Per-job dispatch failures never surface here; they live on the [`crate::Job`]
/// itself and are handed to the dead-letter collaborator instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("{priority:?} priority queue is full")]
    QueueFull { priority: Priority },
    #[error("queue is shutting down")]
    ShuttingDown,
    #[error("stop timed out waiting for workers to drain")]
    StopTimedOut,
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

impl QueueError {
    pub fn priority_label(&self) -> Option<&'static str> {
        match self {
            QueueError::QueueFull { priority } => Some(priority_label(*priority)),
            _ => None,
        }
    }
}
