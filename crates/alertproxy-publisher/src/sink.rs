use async_trait::async_trait;

use alertproxy_cache::IncidentCache;
use alertproxy_core::ProviderError;
use alertproxy_types::{AlertStatus, EnrichedAlert, Severity, Target};

/// The uniform contract every dispatch target implements: `publish(ctx,
/// enrichedAlert, target) -> error`, per spec §4.4.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError>;
}

/// Metrics hook for incident lifecycle events, kept decoupled from any
/// specific metrics backend (the facade wires a Prometheus-backed
/// implementation in, the same pattern as the retry engine's observer).
pub trait IncidentObserver: Send + Sync {
    fn record_incident_created(&self, severity: &str);
}

/// A sink's low-level incident operations: create the remote entity,
/// update it, resolve it. [`IncidentPublisher`] wraps any `IncidentSink`
/// with the create/update/resolve routing and cache bookkeeping common to
/// every sink, so each sink module only needs to implement these three
/// calls.
#[async_trait]
pub trait IncidentSink: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Creates a new remote entity for `alert`, returning the ID to cache.
    async fn create(&self, alert: &EnrichedAlert, target: &Target) -> Result<String, ProviderError>;

    /// Updates the remote entity identified by `external_id`.
    async fn update(&self, external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError>;

    /// Resolves the remote entity identified by `external_id`.
    async fn resolve(&self, external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError>;
}

fn severity_label(alert: &EnrichedAlert) -> &'static str {
    match alert.effective_severity() {
        Severity::Critical => "critical",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

/// Generic create/update/resolve routing shared by every sink (spec §4.4):
///
/// - firing + no cached ID → create, cache the returned ID.
/// - firing + cached ID → update; a 404 evicts the stale entry and falls
///   back to create (tolerates external deletion).
/// - resolved + no cached ID → no-op success.
/// - resolved + cached ID → resolve; 404/409 evicts and is treated as
///   success; any other error propagates.
pub struct IncidentPublisher<S> {
    sink: S,
    cache: IncidentCache,
    observer: Option<Box<dyn IncidentObserver>>,
}

impl<S: IncidentSink> IncidentPublisher<S> {
    pub fn new(sink: S, cache: IncidentCache) -> Self {
        Self {
            sink,
            cache,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn IncidentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    async fn create_and_cache(&self, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        let id = self.sink.create(alert, target).await?;
        self.cache.set(&alert.fingerprint, id);
        if let Some(observer) = &self.observer {
            observer.record_incident_created(severity_label(alert));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: IncidentSink> Publisher for IncidentPublisher<S> {
    async fn publish(&self, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        match alert.status {
            AlertStatus::Firing => match self.cache.get(&alert.fingerprint) {
                None => self.create_and_cache(alert, target).await,
                Some(existing_id) => match self.sink.update(&existing_id, alert, target).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_not_found() => {
                        #[cfg(feature = "tracing")]
                        tracing::info!(provider = self.sink.provider(), fingerprint = %alert.fingerprint, "remote incident gone, recreating");
                        self.cache.evict(&alert.fingerprint);
                        self.create_and_cache(alert, target).await
                    }
                    Err(e) => Err(e),
                },
            },
            AlertStatus::Resolved => match self.cache.get(&alert.fingerprint) {
                None => Ok(()),
                Some(existing_id) => match self.sink.resolve(&existing_id, alert, target).await {
                    Ok(()) => {
                        self.cache.evict(&alert.fingerprint);
                        Ok(())
                    }
                    Err(e) if e.is_not_found() || e.is_conflict() => {
                        self.cache.evict(&alert.fingerprint);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use alertproxy_types::TargetKind;
    use chrono::Utc;

    struct FakeSink {
        create_calls: Arc<AtomicUsize>,
        update_calls: Arc<AtomicUsize>,
        resolve_calls: Arc<AtomicUsize>,
        update_result: Result<(), ProviderError>,
        resolve_result: Result<(), ProviderError>,
    }

    impl Clone for FakeSink {
        fn clone(&self) -> Self {
            Self {
                create_calls: self.create_calls.clone(),
                update_calls: self.update_calls.clone(),
                resolve_calls: self.resolve_calls.clone(),
                update_result: self.update_result.clone(),
                resolve_result: self.resolve_result.clone(),
            }
        }
    }

    #[async_trait]
    impl IncidentSink for FakeSink {
        fn provider(&self) -> &'static str {
            "fake"
        }

        async fn create(&self, _alert: &EnrichedAlert, _target: &Target) -> Result<String, ProviderError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok("EXT-1".to_string())
        }

        async fn update(&self, _id: &str, _alert: &EnrichedAlert, _target: &Target) -> Result<(), ProviderError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            self.update_result.clone()
        }

        async fn resolve(&self, _id: &str, _alert: &EnrichedAlert, _target: &Target) -> Result<(), ProviderError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            self.resolve_result.clone()
        }
    }

    fn alert(fingerprint: &str, status: AlertStatus) -> EnrichedAlert {
        EnrichedAlert {
            fingerprint: fingerprint.to_string(),
            status,
            labels: BTreeMap::new(),
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: None,
            classification: None,
        }
    }

    fn target() -> Target {
        Target::new("rootly-oncall", TargetKind::Rootly)
    }

    #[tokio::test]
    async fn firing_with_no_cache_creates_and_caches() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Ok(()),
            resolve_result: Ok(()),
        };
        let publisher = IncidentPublisher::new(sink.clone(), IncidentCache::new(Duration::from_secs(60)));

        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        assert_eq!(sink.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn firing_with_cache_updates_not_creates() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Ok(()),
            resolve_result: Ok(()),
        };
        let publisher = IncidentPublisher::new(sink.clone(), IncidentCache::new(Duration::from_secs(60)));

        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();

        assert_eq!(sink.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_404_evicts_and_falls_back_to_create() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Err(ProviderError::http(404, "fake", "gone")),
            resolve_result: Ok(()),
        };
        let publisher = IncidentPublisher::new(sink.clone(), IncidentCache::new(Duration::from_secs(60)));

        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();

        assert_eq!(sink.create_calls.load(Ordering::SeqCst), 2, "404 on update should fall back to create");
        assert_eq!(sink.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolved_with_no_cache_is_a_noop_success() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Ok(()),
            resolve_result: Ok(()),
        };
        let publisher = IncidentPublisher::new(sink.clone(), IncidentCache::new(Duration::from_secs(60)));

        publisher.publish(&alert("fp1", AlertStatus::Resolved), &target()).await.unwrap();
        assert_eq!(sink.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn full_lifecycle_create_update_resolve_then_idempotent_resolve() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Ok(()),
            resolve_result: Ok(()),
        };
        let cache = IncidentCache::new(Duration::from_secs(60));
        let publisher = IncidentPublisher::new(sink.clone(), cache);

        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        publisher.publish(&alert("fp1", AlertStatus::Resolved), &target()).await.unwrap();
        publisher.publish(&alert("fp1", AlertStatus::Resolved), &target()).await.unwrap();

        assert_eq!(sink.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.update_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.resolve_calls.load(Ordering::SeqCst), 1, "second resolve should be a cache-miss no-op");
    }

    #[tokio::test]
    async fn resolve_404_evicts_and_is_treated_as_success() {
        let sink = FakeSink {
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            update_result: Ok(()),
            resolve_result: Err(ProviderError::http(404, "fake", "already gone")),
        };
        let publisher = IncidentPublisher::new(sink.clone(), IncidentCache::new(Duration::from_secs(60)));

        publisher.publish(&alert("fp1", AlertStatus::Firing), &target()).await.unwrap();
        let result = publisher.publish(&alert("fp1", AlertStatus::Resolved), &target()).await;
        assert!(result.is_ok());
    }
}
