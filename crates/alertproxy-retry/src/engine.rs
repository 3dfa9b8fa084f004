use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::events::RetryEvent;
use crate::error::RetryError;
use crate::strategy::{RetryAfterHint, RetryOutcome, RetryStrategy};

/// Executes `op` at least once, at most `strategy.max_attempts` times.
///
/// After a failure, the error is classified via `strategy.classifier`. A
/// permanent error is wrapped and returned immediately. Otherwise the delay
/// for attempt `k` (0-indexed) is `min(base_delay * multiplier^k, max_delay)`
/// scaled by `(1 + u * jitter_ratio)` with `u ~ Uniform(-1, 1)`, clamped to
/// be non-negative — unless the error carries a `Retry-After` hint, which
/// overrides the schedule for that attempt (still capped by `max_delay` and
/// jittered the same way).
///
/// `cancel` is observed both before each attempt and during the backoff
/// sleep; a cancellation always wins over continuing the loop, and is
/// reported distinctly from exhausting retries.
pub async fn do_retry<T, E, Fut, Op>(
    cancel: &CancellationToken,
    strategy: &RetryStrategy<E>,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    E: RetryAfterHint + fmt::Display + Send + 'static,
    T: Send,
    Fut: Future<Output = Result<T, E>> + Send,
    Op: FnMut() -> Fut + Send,
{
    let mut attempt = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled {
                during_backoff: false,
                source: None,
            });
        }

        match op().await {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                {
                    if attempt > 0 {
                        tracing::info!(strategy = %strategy.name, attempts = attempt + 1, "request succeeded after retries");
                    } else {
                        tracing::debug!(strategy = %strategy.name, "request succeeded on first attempt");
                    }
                }

                if let Some(observer) = &strategy.observer {
                    observer.record(RetryOutcome::Success);
                }

                strategy.event_listeners.emit(&RetryEvent::Success {
                    strategy_name: strategy.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt + 1,
                });

                return Ok(value);
            }
            Err(error) => {
                if !strategy.classifier.is_retryable(&error) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(strategy = %strategy.name, "error not retryable, failing immediately");

                    if let Some(observer) = &strategy.observer {
                        observer.record(RetryOutcome::NonRetryable);
                    }

                    strategy.event_listeners.emit(&RetryEvent::NonRetryable {
                        strategy_name: strategy.name.clone(),
                        timestamp: Instant::now(),
                    });

                    return Err(RetryError::NonRetryable(error));
                }

                if attempt + 1 >= strategy.max_attempts {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(strategy = %strategy.name, attempts = attempt + 1, "retry attempts exhausted");

                    if let Some(observer) = &strategy.observer {
                        observer.record(RetryOutcome::MaxRetries);
                    }

                    strategy
                        .event_listeners
                        .emit(&RetryEvent::MaxRetriesExceeded {
                            strategy_name: strategy.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });

                    return Err(RetryError::MaxRetriesExceeded {
                        attempts: attempt + 1,
                        source: error,
                    });
                }

                let delay = compute_delay(strategy, attempt, error.retry_after_seconds());

                if let Some(observer) = &strategy.observer {
                    observer.record(RetryOutcome::Retry);
                }

                strategy.event_listeners.emit(&RetryEvent::Retry {
                    strategy_name: strategy.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                    delay,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(strategy = %strategy.name, attempt = attempt + 1, delay_ms = delay.as_millis(), "retrying after delay");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        strategy.event_listeners.emit(&RetryEvent::Cancelled {
                            strategy_name: strategy.name.clone(),
                            timestamp: Instant::now(),
                            during_backoff: true,
                        });
                        return Err(RetryError::Cancelled {
                            during_backoff: true,
                            source: Some(error),
                        });
                    }
                }

                attempt += 1;
            }
        }
    }
}

/// `min(base * multiplier^k, max)`, bit-shifted when `multiplier == 2.0`,
/// then jittered by `(1 + u * jitter_ratio)`, `u ~ Uniform(-1, 1)`. A
/// `Retry-After` hint overrides the exponential schedule but is still
/// capped and jittered the same way.
fn compute_delay<E>(strategy: &RetryStrategy<E>, attempt: usize, retry_after: Option<u64>) -> Duration {
    let base = if let Some(secs) = retry_after {
        Duration::from_secs(secs).min(strategy.max_delay)
    } else {
        exponential(strategy.base_delay, strategy.multiplier, attempt).min(strategy.max_delay)
    };

    jitter(base, strategy.jitter_ratio)
}

fn exponential(base_delay: Duration, multiplier: f64, attempt: usize) -> Duration {
    if multiplier == 2.0 {
        let shift = attempt.min(32) as u32;
        return base_delay
            .checked_mul(1u32.checked_shl(shift).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX);
    }

    let factor = multiplier.powi(attempt as i32);
    Duration::from_secs_f64((base_delay.as_secs_f64() * factor).max(0.0))
}

fn jitter(delay: Duration, jitter_ratio: f64) -> Duration {
    if jitter_ratio <= 0.0 {
        return delay;
    }
    let u: f64 = rand::rng().random_range(-1.0..=1.0);
    let scaled = delay.as_secs_f64() * (1.0 + u * jitter_ratio);
    Duration::from_secs_f64(scaled.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{AllRetryable, NoRetryable, Standard};
    use alertproxy_core::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_without_retry() {
        let strategy = RetryStrategy::<ProviderError>::default_preset(Arc::new(AllRetryable));
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let result: Result<&str, RetryError<ProviderError>> = do_retry(&cancel, &strategy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("ok") }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let strategy = RetryStrategy::builder(Arc::new(AllRetryable) as Arc<dyn crate::ErrorClassifier<ProviderError>>)
            .max_attempts(5)
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(10))
            .build();
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let result: Result<&str, RetryError<ProviderError>> = do_retry(&cancel, &strategy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::http(500, "x", "boom"))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_on_first_attempt() {
        let strategy = RetryStrategy::<ProviderError>::default_preset(Arc::new(NoRetryable));
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let result: Result<&str, RetryError<ProviderError>> = do_retry(&cancel, &strategy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::http(400, "x", "bad request")) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::NonRetryable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_max_attempts() {
        let strategy = RetryStrategy::builder(Arc::new(Standard) as Arc<dyn crate::ErrorClassifier<ProviderError>>)
            .max_attempts(3)
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .build();
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let result: Result<&str, RetryError<ProviderError>> = do_retry(&cancel, &strategy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::http(500, "x", "boom")) }
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::MaxRetriesExceeded { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_before_attempt_is_reported_distinctly() {
        let strategy = RetryStrategy::<ProviderError>::default_preset(Arc::new(AllRetryable));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<&str, RetryError<ProviderError>> = do_retry(&cancel, &strategy, || async {
            Err(ProviderError::http(500, "x", "boom"))
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::Cancelled {
                during_backoff: false,
                source: None
            })
        ));
    }

    #[tokio::test]
    async fn retry_after_hint_overrides_schedule() {
        let strategy = RetryStrategy::builder(Arc::new(Standard) as Arc<dyn crate::ErrorClassifier<ProviderError>>)
            .max_attempts(2)
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_secs(30))
            .jitter_ratio(0.0)
            .build();

        let delay = compute_delay(
            &strategy,
            0,
            ProviderError::http(429, "slack", "rate limited")
                .with_retry_after(2)
                .retry_after_seconds(),
        );
        assert_eq!(delay, Duration::from_secs(2));
    }

    #[test]
    fn bit_shift_fast_path_matches_pow() {
        let base = Duration::from_millis(100);
        for attempt in 0..8 {
            let shifted = exponential(base, 2.0, attempt);
            let powed = Duration::from_secs_f64(base.as_secs_f64() * 2f64.powi(attempt as i32));
            assert_eq!(shifted, powed);
        }
    }
}
