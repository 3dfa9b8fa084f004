use std::sync::Arc;

use alertproxy_publisher::Publisher;
use alertproxy_types::Target;

/// Resolves a [`Target`] to the [`Publisher`] that dispatches to it. Kept as
/// a trait rather than a concrete map so the facade is free to decide how
/// publishers are built and cached (one per target, sharing an HTTP client,
/// each with its own [`alertproxy_cache::IncidentCache`] — see
/// `alertproxy-publisher`'s factory docs for why that cache must not be
/// shared across targets).
pub trait PublisherRegistry: Send + Sync {
    fn get(&self, target: &Target) -> Option<Arc<dyn Publisher>>;
}
