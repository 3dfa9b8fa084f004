//! Three-priority-lane publishing queue: [`PublishingQueue::submit`]
//! enqueues an enriched alert for a target, a worker pool drains strict
//! high-over-medium-over-low order (spec §4.5), and each job runs through
//! the target's circuit breaker and the publishing retry engine before a
//! terminal state — `Succeeded`, `Failed`, or dead-lettered — is recorded.

mod channels;
mod config;
mod dlq;
mod error;
mod events;
mod job;
mod mode;
mod queue;
mod registry;
mod worker;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use dlq::{DlqEnvelope, DlqError, DlqRepository};
pub use error::QueueError;
pub use events::{QueueEvent, QueueObserver};
pub use job::{ErrorType, Job, JobState};
pub use mode::ModeManager;
pub use queue::PublishingQueue;
pub use registry::PublisherRegistry;
