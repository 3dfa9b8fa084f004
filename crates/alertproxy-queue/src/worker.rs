//! The per-worker poll/process loop.
//!
//! A worker is a single task looping over [`Channels::dequeue`]: skip a job
//! whose target breaker is open (no failure bookkeeping — the breaker is
//! already tracking that target as unhealthy), otherwise run it through the
//! retry engine and record the terminal outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use alertproxy_circuitbreaker::CircuitBreakerRegistry;
use alertproxy_publisher::Publisher;
use alertproxy_retry::{classifier::Standard, do_retry, ErrorClassifier, RetryError, RetryStrategy};

use crate::channels::{Channels, Dequeued};
use crate::config::QueueConfig;
use crate::dlq::{DlqEnvelope, DlqRepository};
use crate::events::{QueueEvent, QueueObserver};
use crate::job::{ErrorType, Job, JobState};
use crate::mode::ModeManager;
use crate::registry::PublisherRegistry;

pub(crate) struct WorkerContext {
    pub(crate) channels: Arc<Channels>,
    pub(crate) config: QueueConfig,
    pub(crate) breakers: CircuitBreakerRegistry,
    pub(crate) publishers: Arc<dyn PublisherRegistry>,
    pub(crate) dlq: Arc<dyn DlqRepository>,
    pub(crate) mode: Arc<ModeManager>,
    pub(crate) observer: Option<Arc<dyn QueueObserver>>,
    pub(crate) event_listeners: alertproxy_core::EventListeners<QueueEvent>,
    pub(crate) shutdown: CancellationToken,
}

pub(crate) async fn run(ctx: Arc<WorkerContext>) {
    loop {
        match ctx.channels.dequeue(ctx.config.idle_poll_timeout).await {
            Dequeued::Drained => return,
            Dequeued::Idle => continue,
            Dequeued::Job(priority, job) => {
                if let Some(observer) = &ctx.observer {
                    observer.worker_acquired();
                }
                process_job(&ctx, priority, job).await;
                if let Some(observer) = &ctx.observer {
                    observer.worker_released();
                }
            }
        }
    }
}

fn classify(err: &alertproxy_core::ProviderError) -> ErrorType {
    if Standard.is_retryable(err) {
        ErrorType::Transient
    } else {
        ErrorType::Permanent
    }
}

async fn process_job(ctx: &WorkerContext, priority: alertproxy_types::Priority, mut job: Job) {
    let priority_label = match priority {
        alertproxy_types::Priority::High => "high",
        alertproxy_types::Priority::Medium => "medium",
        alertproxy_types::Priority::Low => "low",
    };
    let target_name = job.target_name().to_string();

    if ctx.mode.is_metrics_only() {
        #[cfg(feature = "tracing")]
        tracing::debug!(target = %target_name, "metrics-only mode, draining job without dispatch");
        ctx.event_listeners.emit(&QueueEvent::Skipped {
            target: target_name,
            timestamp: Instant::now(),
        });
        return;
    }

    let breaker = ctx.breakers.get_or_create(&target_name);
    if !breaker.can_attempt() {
        if let Some(observer) = &ctx.observer {
            observer.record_job_processed(&target_name, "skipped");
        }
        ctx.event_listeners.emit(&QueueEvent::Skipped {
            target: target_name,
            timestamp: Instant::now(),
        });
        return;
    }

    job.state = JobState::Processing;
    job.started_at = Some(Utc::now());
    ctx.event_listeners.emit(&QueueEvent::Started {
        target: job.target_name().to_string(),
        timestamp: Instant::now(),
    });

    let Some(publisher) = ctx.publishers.get(&job.target) else {
        #[cfg(feature = "tracing")]
        tracing::error!(target = %job.target_name(), "no publisher registered for target");
        job.state = JobState::Failed;
        job.last_error = Some(format!("no publisher registered for target {}", job.target_name()));
        job.error_type = ErrorType::Permanent;
        job.completed_at = Some(Utc::now());
        write_to_dlq(ctx, &mut job).await;
        return;
    };

    let strategy = RetryStrategy::builder(Arc::new(Standard) as Arc<dyn ErrorClassifier<alertproxy_core::ProviderError>>)
        .name("publishing")
        .max_attempts(ctx.config.max_retries + 1)
        .base_delay(ctx.config.retry_interval)
        .max_delay(Duration::from_secs(30))
        .multiplier(2.0)
        .jitter_ratio(0.15)
        .build();

    let job_cell = AsyncMutex::new(job);
    let alert = job_cell.lock().await.enriched_alert.clone();
    let target = job_cell.lock().await.target.clone();

    let attempts_made = std::sync::atomic::AtomicUsize::new(0);

    let result = do_retry(&ctx.shutdown, &strategy, || {
        let publisher: &dyn Publisher = publisher.as_ref();
        let alert = &alert;
        let target = &target;
        let attempts_made = &attempts_made;
        async move {
            match publisher.publish(alert, target).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    let error_type = classify(&e);
                    let attempt_number = attempts_made.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                    let will_retry = Standard.is_retryable(&e) && attempt_number < strategy.max_attempts();
                    {
                        let mut job = job_cell.lock().await;
                        job.last_error = Some(e.to_string());
                        job.error_type = error_type;
                        if will_retry {
                            job.retry_count += 1;
                            job.state = JobState::Retrying;
                        }
                    }
                    if let Some(observer) = &ctx.observer {
                        observer.record_retry_attempt(&target.name, e.metric_error_type());
                    }
                    Err(e)
                }
            }
        }
    })
    .await;

    let mut job = job_cell.into_inner();
    let duration = (Utc::now() - job.started_at.unwrap_or_else(Utc::now)).num_milliseconds().max(0) as f64 / 1000.0;

    match result {
        Ok(()) => {
            job.state = JobState::Succeeded;
            job.completed_at = Some(Utc::now());
            breaker.record_success();
            if let Some(observer) = &ctx.observer {
                observer.record_job_processed(&job.target_name().to_string(), "succeeded");
                observer.record_job_duration(&job.target_name().to_string(), priority_label, duration);
            }
            ctx.event_listeners.emit(&QueueEvent::Succeeded {
                target: job.target_name().to_string(),
                attempts: job.retry_count + 1,
                timestamp: Instant::now(),
            });
        }
        Err(RetryError::Cancelled { .. }) => {
            job.state = JobState::Failed;
            job.completed_at = Some(Utc::now());
            job.last_error.get_or_insert_with(|| "cancelled during shutdown".to_string());
            #[cfg(feature = "tracing")]
            tracing::warn!(target = %job.target_name(), "job abandoned: queue is shutting down");
            if let Some(observer) = &ctx.observer {
                observer.record_job_processed(&job.target_name().to_string(), "cancelled");
            }
        }
        Err(RetryError::NonRetryable(e)) | Err(RetryError::MaxRetriesExceeded { source: e, .. }) => {
            job.state = JobState::Failed;
            job.completed_at = Some(Utc::now());
            job.last_error = Some(e.to_string());
            job.error_type = classify(&e);
            breaker.record_failure();
            if breaker.state() == alertproxy_circuitbreaker::CircuitState::Open {
                if let Some(observer) = &ctx.observer {
                    observer.record_circuit_breaker_trip(&job.target_name().to_string());
                }
            }
            if let Some(observer) = &ctx.observer {
                observer.record_job_processed(&job.target_name().to_string(), "failed");
                observer.record_job_duration(&job.target_name().to_string(), priority_label, duration);
            }
            ctx.event_listeners.emit(&QueueEvent::Failed {
                target: job.target_name().to_string(),
                attempts: job.retry_count + 1,
                timestamp: Instant::now(),
            });
            write_to_dlq(ctx, &mut job).await;
        }
    }
}

async fn write_to_dlq(ctx: &WorkerContext, job: &mut Job) {
    let target = job.target_name().to_string();
    match ctx.dlq.write(job).await {
        Ok(()) => {
            job.state = JobState::Dlq;
            if let Some(observer) = &ctx.observer {
                observer.record_dlq_write(&target);
            }
            ctx.event_listeners.emit(&QueueEvent::DlqWritten {
                target,
                timestamp: Instant::now(),
            });
        }
        Err(e) => {
            // Per spec, a DLQ write failure is logged and the job is
            // otherwise abandoned in its terminal `Failed` state — there is
            // no second-tier fallback store to retry against.
            #[cfg(feature = "tracing")]
            tracing::error!(target = %target, error = %e, envelope = ?DlqEnvelope::from_job(job), "dead-letter write failed");
            #[cfg(not(feature = "tracing"))]
            let _ = DlqEnvelope::from_job(job);
            ctx.event_listeners.emit(&QueueEvent::DlqWriteFailed {
                target,
                timestamp: Instant::now(),
            });
        }
    }
}
