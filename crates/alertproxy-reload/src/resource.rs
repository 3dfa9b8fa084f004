use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ReloadError;
use crate::traits::{Closeable, HealthProbe, Reloadable, ResourceFactory};

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

struct Inner<R, C> {
    resource: Arc<R>,
    config: C,
}

/// Wraps a long-lived resource so it can be atomically replaced when its
/// config changes, without ever exposing a half-constructed or unhealthy
/// replacement to callers.
///
/// Implements the five-step reload protocol: fast-path equality check,
/// construct, bounded health-probe, atomic swap under a write lock, and a
/// fire-and-forget drain of the prior resource.
pub struct ReloadableResource<R, C, F, P> {
    name: String,
    critical: bool,
    drain_delay: Duration,
    factory: F,
    probe: P,
    inner: RwLock<Inner<R, C>>,
}

impl<R, C, F, P> ReloadableResource<R, C, F, P>
where
    R: Closeable + Send + Sync + 'static,
    C: PartialEq + Clone + Send + Sync + 'static,
    F: ResourceFactory<C, R> + Send + Sync,
    P: HealthProbe<R> + Send + Sync,
{
    pub fn new(name: impl Into<String>, critical: bool, drain_delay: Duration, factory: F, probe: P, initial_resource: R, initial_config: C) -> Self {
        Self {
            name: name.into(),
            critical,
            drain_delay,
            factory,
            probe,
            inner: RwLock::new(Inner {
                resource: Arc::new(initial_resource),
                config: initial_config,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// The live resource. Callers must not hold onto the returned handle
    /// past the call that needed it — a reload may swap it out at any time.
    pub async fn get(&self) -> Arc<R> {
        self.inner.read().await.resource.clone()
    }

    pub async fn do_reload(&self, new_config: C) -> Result<(), ReloadError> {
        {
            let current = self.inner.read().await;
            if current.config == new_config {
                #[cfg(feature = "tracing")]
                tracing::info!(resource = %self.name, "reload config unchanged, skipping");
                return Ok(());
            }
        }

        let new_resource = self.factory.build(&new_config).await.map_err(|e| match e {
            ReloadError::ConstructionFailed { message, .. } => ReloadError::ConstructionFailed {
                name: self.name.clone(),
                message,
            },
            other => other,
        })?;

        match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, self.probe.probe(&new_resource)).await {
            Err(_) => {
                return Err(ReloadError::HealthCheckTimedOut {
                    name: self.name.clone(),
                    timeout_secs: HEALTH_PROBE_TIMEOUT.as_secs(),
                });
            }
            Ok(Err(e)) => {
                return Err(e);
            }
            Ok(Ok(())) => {}
        }

        let old_resource = {
            let mut guard = self.inner.write().await;
            let old = std::mem::replace(&mut guard.resource, Arc::new(new_resource));
            guard.config = new_config;
            old
        };

        #[cfg(feature = "tracing")]
        tracing::info!(resource = %self.name, "reload applied, scheduling drain of prior resource");

        let drain_delay = self.drain_delay;
        let name = self.name.clone();
        tokio::spawn(async move {
            if !drain_delay.is_zero() {
                tokio::time::sleep(drain_delay).await;
            }
            match Arc::try_unwrap(old_resource) {
                Ok(resource) => {
                    resource.close().await;
                    #[cfg(feature = "tracing")]
                    tracing::info!(resource = %name, "prior resource drained and closed");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(resource = %name, "prior resource still referenced after drain delay, skipping close");
                }
            }
        });

        Ok(())
    }
}

#[async_trait]
impl<R, C, F, P> Reloadable<C> for ReloadableResource<R, C, F, P>
where
    R: Closeable + Send + Sync + 'static,
    C: PartialEq + Clone + Send + Sync + 'static,
    F: ResourceFactory<C, R> + Send + Sync,
    P: HealthProbe<R> + Send + Sync,
{
    fn name(&self) -> &str {
        ReloadableResource::name(self)
    }

    fn is_critical(&self) -> bool {
        ReloadableResource::is_critical(self)
    }

    async fn reload(&self, new_config: &C) -> Result<(), ReloadError> {
        self.do_reload(new_config.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, PartialEq, Debug)]
    struct Config {
        pool_size: usize,
    }

    struct Resource {
        pool_size: usize,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Closeable for Resource {
        async fn close(self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Factory {
        closed: Arc<AtomicUsize>,
        fail_next: Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl ResourceFactory<Config, Resource> for Factory {
        async fn build(&self, config: &Config) -> Result<Resource, ReloadError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ReloadError::ConstructionFailed {
                    name: "test".into(),
                    message: "forced failure".into(),
                });
            }
            Ok(Resource {
                pool_size: config.pool_size,
                closed: self.closed.clone(),
            })
        }
    }

    struct AlwaysHealthy;

    #[async_trait]
    impl HealthProbe<Resource> for AlwaysHealthy {
        async fn probe(&self, _resource: &Resource) -> Result<(), ReloadError> {
            Ok(())
        }
    }

    struct AlwaysUnhealthy;

    #[async_trait]
    impl HealthProbe<Resource> for AlwaysUnhealthy {
        async fn probe(&self, _resource: &Resource) -> Result<(), ReloadError> {
            Err(ReloadError::HealthCheckFailed {
                name: "test".into(),
                message: "forced unhealthy".into(),
            })
        }
    }

    #[tokio::test]
    async fn unchanged_config_is_a_fast_path_noop() {
        let closed = Arc::new(AtomicUsize::new(0));
        let resource = ReloadableResource::new(
            "db",
            true,
            Duration::from_millis(0),
            Factory {
                closed: closed.clone(),
                fail_next: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            },
            AlwaysHealthy,
            Resource { pool_size: 5, closed: closed.clone() },
            Config { pool_size: 5 },
        );

        resource.do_reload(Config { pool_size: 5 }).await.unwrap();
        assert_eq!(resource.get().await.pool_size, 5);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn changed_config_swaps_and_drains_old_resource() {
        let closed = Arc::new(AtomicUsize::new(0));
        let resource = ReloadableResource::new(
            "db",
            true,
            Duration::from_millis(10),
            Factory {
                closed: closed.clone(),
                fail_next: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            },
            AlwaysHealthy,
            Resource { pool_size: 5, closed: closed.clone() },
            Config { pool_size: 5 },
        );

        resource.do_reload(Config { pool_size: 10 }).await.unwrap();
        assert_eq!(resource.get().await.pool_size, 10);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(closed.load(Ordering::SeqCst), 1, "old resource should have been drained and closed");
    }

    #[tokio::test]
    async fn failed_health_probe_leaves_old_resource_in_place() {
        let closed = Arc::new(AtomicUsize::new(0));
        let resource = ReloadableResource::new(
            "db",
            true,
            Duration::from_millis(0),
            Factory {
                closed: closed.clone(),
                fail_next: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            },
            AlwaysUnhealthy,
            Resource { pool_size: 5, closed: closed.clone() },
            Config { pool_size: 5 },
        );

        let result = resource.do_reload(Config { pool_size: 10 }).await;
        assert!(matches!(result, Err(ReloadError::HealthCheckFailed { .. })));
        assert_eq!(resource.get().await.pool_size, 5);
    }

    #[tokio::test]
    async fn failed_construction_is_reported_with_resource_name() {
        let closed = Arc::new(AtomicUsize::new(0));
        let fail_next = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let resource = ReloadableResource::new(
            "cache",
            false,
            Duration::from_millis(0),
            Factory {
                closed: closed.clone(),
                fail_next,
            },
            AlwaysHealthy,
            Resource { pool_size: 5, closed: closed.clone() },
            Config { pool_size: 5 },
        );

        let result = resource.do_reload(Config { pool_size: 10 }).await;
        match result {
            Err(ReloadError::ConstructionFailed { name, .. }) => assert_eq!(name, "cache"),
            other => panic!("expected ConstructionFailed, got {other:?}"),
        }
    }
}
