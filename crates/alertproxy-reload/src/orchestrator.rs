use std::sync::Arc;

use crate::error::ReloadError;
use crate::traits::Reloadable;

/// Drives a reload across every registered component. A critical
/// component's failure rolls the whole batch back to `old_config`; a
/// non-critical failure only logs a warning and lets the batch continue.
pub struct ReloadOrchestrator<C> {
    resources: Vec<Arc<dyn Reloadable<C>>>,
}

impl<C> ReloadOrchestrator<C> {
    pub fn new(resources: Vec<Arc<dyn Reloadable<C>>>) -> Self {
        Self { resources }
    }

    pub async fn reload_all(&self, old_config: &C, new_config: &C) -> Result<(), ReloadError> {
        let mut applied: Vec<&Arc<dyn Reloadable<C>>> = Vec::new();

        for resource in &self.resources {
            match resource.reload(new_config).await {
                Ok(()) => applied.push(resource),
                Err(e) => {
                    if resource.is_critical() {
                        #[cfg(feature = "tracing")]
                        tracing::error!(resource = %resource.name(), error = %e, "critical reload failed, rolling back batch");

                        for rolled_back in applied.iter().rev() {
                            if let Err(rollback_err) = rolled_back.reload(old_config).await {
                                #[cfg(feature = "tracing")]
                                tracing::error!(resource = %rolled_back.name(), error = %rollback_err, "rollback failed");
                                let _ = rollback_err;
                            }
                        }

                        return Err(e);
                    }

                    #[cfg(feature = "tracing")]
                    tracing::warn!(resource = %resource.name(), error = %e, "non-critical reload failed, continuing batch");
                }
            }
        }

        Ok(())
    }
}
