use async_trait::async_trait;

use crate::error::ReloadError;

/// Builds a resource from config. Implemented once per resource family
/// (database pool, cache client, LLM client, logger, metrics manager).
#[async_trait]
pub trait ResourceFactory<C, R>: Send + Sync {
    async fn build(&self, config: &C) -> Result<R, ReloadError>;
}

/// Confirms a freshly built resource is actually usable before it replaces
/// the live one. Probes run under a bounded sub-context; see
/// [`crate::ReloadableResource::reload`].
#[async_trait]
pub trait HealthProbe<R>: Send + Sync {
    async fn probe(&self, resource: &R) -> Result<(), ReloadError>;
}

/// Resources that need a graceful shutdown once they've been swapped out
/// and drained. Stateless clients (a logger, a metrics manager) can no-op.
#[async_trait]
pub trait Closeable: Send {
    async fn close(self);
}

/// The contract every reloadable component exposes to the orchestrator:
/// `name()`, `isCritical()`, `reload(ctx, newConfig)`. `C` is the shared
/// top-level config type; each component extracts the slice it cares about.
#[async_trait]
pub trait Reloadable<C>: Send + Sync {
    fn name(&self) -> &str;
    fn is_critical(&self) -> bool;
    async fn reload(&self, new_config: &C) -> Result<(), ReloadError>;
}
