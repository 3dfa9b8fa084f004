use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use alertproxy_circuitbreaker::CircuitBreakerRegistry;
use alertproxy_core::EventListeners;
use alertproxy_types::{EnrichedAlert, Priority, Target};

use crate::channels::Channels;
use crate::config::QueueConfig;
use crate::dlq::DlqRepository;
use crate::error::QueueError;
use crate::events::{QueueEvent, QueueObserver};
use crate::job::Job;
use crate::mode::ModeManager;
use crate::registry::PublisherRegistry;
use crate::worker::{self, WorkerContext};

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

/// The three-lane priority dispatch queue: [`PublishingQueue::submit`]
/// enqueues, a configurable pool of workers drains in strict
/// high-over-medium-over-low order (spec §4.5), each job running through the
/// target's circuit breaker and the publishing retry engine before a
/// terminal outcome is recorded.
pub struct PublishingQueue {
    channels: Arc<Channels>,
    config: QueueConfig,
    shutdown: CancellationToken,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    ctx: Arc<WorkerContext>,
}

impl PublishingQueue {
    pub fn new(
        config: QueueConfig,
        breakers: CircuitBreakerRegistry,
        publishers: Arc<dyn PublisherRegistry>,
        dlq: Arc<dyn DlqRepository>,
    ) -> Self {
        Self::with_observer(config, breakers, publishers, dlq, None, EventListeners::new())
    }

    pub fn with_observer(
        config: QueueConfig,
        breakers: CircuitBreakerRegistry,
        publishers: Arc<dyn PublisherRegistry>,
        dlq: Arc<dyn DlqRepository>,
        observer: Option<Arc<dyn QueueObserver>>,
        event_listeners: EventListeners<QueueEvent>,
    ) -> Self {
        let channels = Arc::new(Channels::new(&config));
        let shutdown = CancellationToken::new();

        let ctx = Arc::new(WorkerContext {
            channels: channels.clone(),
            config: config.clone(),
            breakers,
            publishers,
            dlq,
            mode: Arc::new(ModeManager::new()),
            observer,
            event_listeners,
            shutdown: shutdown.clone(),
        });

        Self {
            channels,
            config,
            shutdown,
            workers: std::sync::Mutex::new(Vec::new()),
            ctx,
        }
    }

    pub fn mode(&self) -> &ModeManager {
        &self.ctx.mode
    }

    /// Spawns the configured worker pool. Idempotent only in the sense that
    /// calling it twice doubles the pool — callers should call it once.
    pub fn start(&self) {
        let mut workers = self.workers.lock().unwrap();
        for _ in 0..self.config.worker_count {
            let ctx = self.ctx.clone();
            workers.push(tokio::spawn(worker::run(ctx)));
        }
        if let Some(observer) = &self.ctx.observer {
            observer.set_workers_idle(self.config.worker_count as i64);
        }
    }

    /// Derives priority from the alert (spec §4.5) and enqueues into the
    /// matching lane, rejecting with [`QueueError::QueueFull`] if that lane
    /// is at capacity or [`QueueError::ShuttingDown`] once [`Self::stop`]
    /// has closed the channels.
    pub fn submit(&self, alert: EnrichedAlert, target: Target) -> Result<(), QueueError> {
        let priority = Priority::from_alert(&alert);
        let job = Job::new(alert, target, priority);
        let target_name = job.target_name().to_string();

        match self.channels.try_submit(priority, job) {
            Ok(()) => {
                self.ctx.event_listeners.emit(&QueueEvent::Submitted {
                    target: target_name,
                    priority: priority_label(priority),
                    timestamp: std::time::Instant::now(),
                });
                self.record_gauges(priority);
                Ok(())
            }
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                if let Some(observer) = &self.ctx.observer {
                    observer.record_submission_rejected(priority_label(priority));
                }
                self.ctx.event_listeners.emit(&QueueEvent::SubmissionRejected {
                    priority: priority_label(priority),
                    timestamp: std::time::Instant::now(),
                });
                Err(QueueError::QueueFull { priority })
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => Err(QueueError::ShuttingDown),
        }
    }

    fn record_gauges(&self, priority: Priority) {
        let Some(observer) = &self.ctx.observer else {
            return;
        };
        let label = priority_label(priority);
        let depth = self.channels.depth(priority);
        let capacity = self.channels.capacity(priority).max(1);
        observer.set_queue_size(label, depth as i64);
        observer.set_queue_capacity_utilization(label, depth as f64 / capacity as f64);
    }

    /// Closes all three lanes (future submits fail with
    /// [`QueueError::ShuttingDown`]) and waits up to `timeout` for every
    /// worker to finish draining already-buffered jobs. If workers are still
    /// running when `timeout` elapses, cancels the shared retry context —
    /// aborting any in-flight backoff wait — and returns
    /// [`QueueError::StopTimedOut`] once the (now forcibly unblocked)
    /// workers finish.
    pub async fn stop(&self, timeout: Duration) -> Result<(), QueueError> {
        self.channels.close().await;

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut self.workers.lock().unwrap());
        let drain = futures::future::join_all(handles);

        match tokio::time::timeout(timeout, drain).await {
            Ok(_) => Ok(()),
            Err(_) => {
                self.shutdown.cancel();
                Err(QueueError::StopTimedOut)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlq::DlqError;
    use alertproxy_circuitbreaker::CircuitBreakerConfig;
    use alertproxy_publisher::Publisher;
    use alertproxy_types::{AlertStatus, TargetKind};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct AlwaysOk;

    #[async_trait]
    impl Publisher for AlwaysOk {
        async fn publish(&self, _alert: &EnrichedAlert, _target: &Target) -> Result<(), alertproxy_core::ProviderError> {
            Ok(())
        }
    }

    struct FixedPublisher(Arc<dyn Publisher>);

    impl PublisherRegistry for FixedPublisher {
        fn get(&self, _target: &Target) -> Option<Arc<dyn Publisher>> {
            Some(self.0.clone())
        }
    }

    struct NoopDlq {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl DlqRepository for NoopDlq {
        async fn write(&self, _job: &Job) -> Result<(), DlqError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn alert(name: &str, severity: &str) -> EnrichedAlert {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), name.to_string());
        labels.insert("severity".to_string(), severity.to_string());
        EnrichedAlert {
            fingerprint: format!("fp-{name}"),
            status: AlertStatus::Firing,
            labels,
            starts_at: chrono::Utc::now(),
            ends_at: None,
            generator_url: None,
            classification: None,
        }
    }

    fn target() -> Target {
        Target::new("slack-oncall", TargetKind::Slack)
    }

    #[tokio::test]
    async fn submit_then_stop_drains_successfully() {
        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(2).build(),
            CircuitBreakerRegistry::new(CircuitBreakerConfig::default_config()),
            Arc::new(FixedPublisher(Arc::new(AlwaysOk))),
            Arc::new(NoopDlq { writes: AtomicUsize::new(0) }),
        );
        queue.start();

        for i in 0..5 {
            queue.submit(alert(&format!("A{i}"), "critical"), target()).unwrap();
        }

        queue.stop(Duration::from_secs(2)).await.unwrap();
    }

    #[tokio::test]
    async fn full_lane_rejects_submission() {
        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(0).high_capacity(1).build(),
            CircuitBreakerRegistry::default(),
            Arc::new(FixedPublisher(Arc::new(AlwaysOk))),
            Arc::new(NoopDlq { writes: AtomicUsize::new(0) }),
        );

        queue.submit(alert("A", "critical"), target()).unwrap();
        let result = queue.submit(alert("B", "critical"), target());
        assert!(matches!(result, Err(QueueError::QueueFull { priority: Priority::High })));

        queue.stop(Duration::from_millis(100)).await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_stop_is_rejected() {
        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(1).build(),
            CircuitBreakerRegistry::default(),
            Arc::new(FixedPublisher(Arc::new(AlwaysOk))),
            Arc::new(NoopDlq { writes: AtomicUsize::new(0) }),
        );
        queue.start();
        queue.stop(Duration::from_secs(1)).await.unwrap();

        let result = queue.submit(alert("A", "critical"), target());
        assert!(matches!(result, Err(QueueError::ShuttingDown)));
    }

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _alert: &EnrichedAlert, _target: &Target) -> Result<(), alertproxy_core::ProviderError> {
            Err(alertproxy_core::ProviderError::http(400, "slack", "bad request"))
        }
    }

    #[tokio::test]
    async fn permanent_failure_is_handed_to_dlq() {
        let writes = Arc::new(AtomicUsize::new(0));
        struct CountingDlq(Arc<AtomicUsize>);
        #[async_trait]
        impl DlqRepository for CountingDlq {
            async fn write(&self, _job: &Job) -> Result<(), DlqError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(1).max_retries(2).build(),
            CircuitBreakerRegistry::default(),
            Arc::new(FixedPublisher(Arc::new(FailingPublisher))),
            Arc::new(CountingDlq(writes.clone())),
        );
        queue.start();
        queue.submit(alert("A", "critical"), target()).unwrap();
        queue.stop(Duration::from_secs(2)).await.unwrap();

        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn metrics_only_mode_drains_without_dispatching() {
        let calls = Arc::new(AtomicUsize::new(0));
        struct CountingPublisher(Arc<AtomicUsize>);
        #[async_trait]
        impl Publisher for CountingPublisher {
            async fn publish(&self, _alert: &EnrichedAlert, _target: &Target) -> Result<(), alertproxy_core::ProviderError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(1).build(),
            CircuitBreakerRegistry::default(),
            Arc::new(FixedPublisher(Arc::new(CountingPublisher(calls.clone())))),
            Arc::new(NoopDlq { writes: AtomicUsize::new(0) }),
        );
        queue.mode().set_metrics_only(true);
        queue.start();
        queue.submit(alert("A", "critical"), target()).unwrap();
        queue.stop(Duration::from_secs(2)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0, "sink must not be called in metrics-only mode");
    }

    #[tokio::test]
    async fn open_breaker_skips_dispatch_without_extra_failure_bookkeeping() {
        let calls = Arc::new(AtomicUsize::new(0));
        struct CountingFailingPublisher(Arc<AtomicUsize>);
        #[async_trait]
        impl Publisher for CountingFailingPublisher {
            async fn publish(&self, _alert: &EnrichedAlert, _target: &Target) -> Result<(), alertproxy_core::ProviderError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(alertproxy_core::ProviderError::http(500, "slack", "boom"))
            }
        }

        let breakers = CircuitBreakerRegistry::new(CircuitBreakerConfig::new(1, 2, Duration::from_secs(300)));
        let queue = PublishingQueue::new(
            QueueConfig::builder().worker_count(1).max_retries(0).build(),
            breakers.clone(),
            Arc::new(FixedPublisher(Arc::new(CountingFailingPublisher(calls.clone())))),
            Arc::new(NoopDlq { writes: AtomicUsize::new(0) }),
        );
        queue.start();

        queue.submit(alert("A", "critical"), target()).unwrap();
        queue.submit(alert("B", "critical"), target()).unwrap();
        queue.stop(Duration::from_secs(2)).await.unwrap();

        // first call trips the breaker (threshold 1); the second job should
        // be skipped, so the sink is called exactly once.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let breaker = breakers.get("slack-oncall").unwrap();
        assert_eq!(breaker.state(), alertproxy_circuitbreaker::CircuitState::Open);
    }
}
