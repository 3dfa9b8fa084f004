//! Builds and hot-swaps the target -> publisher map that backs
//! [`alertproxy_queue::PublisherRegistry`].
//!
//! The publisher-registry read site (`alertproxy_queue::worker::process_job`)
//! is synchronous by design — a worker must not await a lock just to look up
//! where a job goes. [`alertproxy_reload::ReloadableResource`]'s `get()` is
//! async (it guards a `tokio::sync::RwLock`), so it doesn't fit that read
//! site. [`TargetRegistry`] instead runs the same fast-path-equality /
//! build / swap shape directly over a `parking_lot::RwLock`, and still
//! implements [`alertproxy_reload::Reloadable`] so it composes with
//! [`alertproxy_reload::ReloadOrchestrator`] alongside resources that do use
//! the generic wrapper (see `dlq.rs`). Recorded in `DESIGN.md`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;

use alertproxy_cache::IncidentCache;
use alertproxy_publisher::{publisher_for, Publisher};
use alertproxy_queue::PublisherRegistry;
use alertproxy_reload::{Reloadable, ReloadError};
use alertproxy_types::Target;

/// The slice of top-level config this resource cares about: which targets
/// exist, plus the knobs that rebuild the shared HTTP client and per-target
/// incident caches.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTargetsConfig {
    pub targets: Vec<Target>,
    pub http_timeout: Duration,
    pub incident_ttl: Duration,
}

type PublisherMap = HashMap<String, Arc<dyn Publisher>>;

struct Inner {
    config: DispatchTargetsConfig,
    map: Arc<PublisherMap>,
}

fn build_map(config: &DispatchTargetsConfig, client: &Client) -> PublisherMap {
    config
        .targets
        .iter()
        .map(|target| {
            let cache = IncidentCache::new(config.incident_ttl);
            let publisher: Arc<dyn Publisher> = Arc::from(publisher_for(target.kind, client.clone(), cache));
            (target.name.clone(), publisher)
        })
        .collect()
}

pub struct TargetRegistry {
    name: String,
    inner: RwLock<Inner>,
}

impl TargetRegistry {
    /// Builds the initial map. A client timeout that fails to construct is
    /// the one way this can fail at startup; everything else (a missing
    /// `webhook_url`, an unreachable sink) is a per-publish error, not a
    /// construction error.
    pub fn new(config: DispatchTargetsConfig) -> Result<Self, ReloadError> {
        let client = Client::builder().timeout(config.http_timeout).build().map_err(|e| ReloadError::ConstructionFailed {
            name: "target_registry".to_string(),
            message: e.to_string(),
        })?;
        let map = build_map(&config, &client);

        Ok(Self {
            name: "target_registry".to_string(),
            inner: RwLock::new(Inner { config, map: Arc::new(map) }),
        })
    }

    pub fn target_names(&self) -> Vec<String> {
        self.inner.read().map.keys().cloned().collect()
    }
}

impl PublisherRegistry for TargetRegistry {
    fn get(&self, target: &Target) -> Option<Arc<dyn Publisher>> {
        self.inner.read().map.get(&target.name).cloned()
    }
}

#[async_trait]
impl Reloadable<DispatchTargetsConfig> for TargetRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_critical(&self) -> bool {
        true
    }

    async fn reload(&self, new_config: &DispatchTargetsConfig) -> Result<(), ReloadError> {
        {
            let current = self.inner.read();
            if &current.config == new_config {
                return Ok(());
            }
        }

        let client = Client::builder().timeout(new_config.http_timeout).build().map_err(|e| ReloadError::ConstructionFailed {
            name: self.name.clone(),
            message: e.to_string(),
        })?;
        let map = build_map(new_config, &client);

        let mut guard = self.inner.write();
        guard.map = Arc::new(map);
        guard.config = new_config.clone();
        Ok(())
    }
}
