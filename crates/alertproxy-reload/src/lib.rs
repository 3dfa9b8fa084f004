//! Generic hot-reload wrapper for long-lived resources (database pool,
//! cache client, LLM client, logger, metrics manager): construct the
//! replacement, health-probe it under a deadline, atomically swap it in,
//! then drain and close the old one off the critical path.

mod error;
mod orchestrator;
mod resource;
mod traits;

pub use error::ReloadError;
pub use orchestrator::ReloadOrchestrator;
pub use resource::ReloadableResource;
pub use traits::{Closeable, HealthProbe, Reloadable, ResourceFactory};
