//! Dead-letter backend wiring. `alertproxy-queue` only defines the
//! [`alertproxy_queue::DlqRepository`] contract; durability is an external
//! collaborator's job (spec §1/§6). [`InMemoryDlq`] is the bring-your-own
//! backend a standalone binary or test harness can start with, and
//! [`ReloadableDlq`] shows the backend itself can be swapped at runtime
//! (e.g. repointing at a different table or topic) via the generic
//! [`alertproxy_reload::ReloadableResource`] — DLQ writes are already
//! async, so unlike the target registry this resource fits the wrapper
//! directly rather than needing a hand-rolled variant.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use alertproxy_queue::{DlqEnvelope, DlqError, DlqRepository, Job};
use alertproxy_reload::{Closeable, HealthProbe, Reloadable, ReloadError, ReloadableResource, ResourceFactory};

/// Identifies which backend a [`ReloadableDlq`] should be pointed at.
/// `label` is surfaced only for observability; the in-memory backend
/// itself doesn't distinguish labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlqConfig {
    pub label: String,
}

impl DlqConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

/// An in-process dead-letter store. Entries survive only for the life of
/// the binary — fine for a test harness or a single-node deployment that
/// tails its own log, not a substitute for a durable queue.
pub struct InMemoryDlq {
    label: String,
    entries: Mutex<Vec<DlqEnvelope>>,
}

impl InMemoryDlq {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<DlqEnvelope> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DlqRepository for InMemoryDlq {
    async fn write(&self, job: &Job) -> Result<(), DlqError> {
        self.entries.lock().push(DlqEnvelope::from_job(job));
        Ok(())
    }
}

#[async_trait]
impl Closeable for InMemoryDlq {
    async fn close(self) {}
}

struct InMemoryDlqFactory;

#[async_trait]
impl ResourceFactory<DlqConfig, InMemoryDlq> for InMemoryDlqFactory {
    async fn build(&self, config: &DlqConfig) -> Result<InMemoryDlq, ReloadError> {
        Ok(InMemoryDlq::new(config.label.clone()))
    }
}

struct AlwaysHealthy;

#[async_trait]
impl HealthProbe<InMemoryDlq> for AlwaysHealthy {
    async fn probe(&self, _resource: &InMemoryDlq) -> Result<(), ReloadError> {
        Ok(())
    }
}

/// Hot-swappable DLQ backend. Drains and drops the prior backend's
/// in-memory buffer immediately on swap — there's nothing to flush to,
/// which is the whole reason a real deployment points this at something
/// durable instead.
pub struct ReloadableDlq {
    resource: ReloadableResource<InMemoryDlq, DlqConfig, InMemoryDlqFactory, AlwaysHealthy>,
}

impl ReloadableDlq {
    pub fn new(initial: DlqConfig) -> Self {
        let label = initial.label.clone();
        Self {
            resource: ReloadableResource::new(
                "dlq",
                false,
                std::time::Duration::ZERO,
                InMemoryDlqFactory,
                AlwaysHealthy,
                InMemoryDlq::new(label),
                initial,
            ),
        }
    }

    pub async fn current(&self) -> Arc<InMemoryDlq> {
        self.resource.get().await
    }
}

#[async_trait]
impl DlqRepository for ReloadableDlq {
    async fn write(&self, job: &Job) -> Result<(), DlqError> {
        self.resource.get().await.write(job).await
    }
}

#[async_trait]
impl Reloadable<DlqConfig> for ReloadableDlq {
    fn name(&self) -> &str {
        Reloadable::<DlqConfig>::name(&self.resource)
    }

    fn is_critical(&self) -> bool {
        Reloadable::<DlqConfig>::is_critical(&self.resource)
    }

    async fn reload(&self, new_config: &DlqConfig) -> Result<(), ReloadError> {
        Reloadable::<DlqConfig>::reload(&self.resource, new_config).await
    }
}
