use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("failed to construct resource {name} from new config: {message}")]
    ConstructionFailed { name: String, message: String },

    #[error("health probe for resource {name} failed: {message}")]
    HealthCheckFailed { name: String, message: String },

    #[error("health probe for resource {name} timed out after {timeout_secs}s")]
    HealthCheckTimedOut { name: String, timeout_secs: u64 },
}
