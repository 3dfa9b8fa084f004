use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use alertproxy_core::EventListeners;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::bucket::TokenBucket;
use crate::config::RateLimiterConfig;
use crate::error::RateLimitError;
use crate::events::RateLimiterEvent;

/// Observer hook for metrics, decoupled from any specific backend the way
/// the retry engine's `RetryObserver` is.
pub trait RateLimitObserver: Send + Sync {
    fn record_admitted(&self, ip: &str);
    fn record_rejected_global(&self);
    fn record_rejected_per_ip(&self, ip: &str);
}

struct Shared {
    config: RateLimiterConfig,
    global: Mutex<TokenBucket>,
    per_ip: RwLock<HashMap<String, Mutex<TokenBucket>>>,
    observer: Option<Arc<dyn RateLimitObserver>>,
    event_listeners: EventListeners<RateLimiterEvent>,
}

/// Global-then-per-IP token-bucket admission control.
///
/// Both tiers are lazily sized from [`RateLimiterConfig`]: the global bucket
/// is created eagerly; per-IP buckets are created on first sight of a host,
/// double-checked under a write lock the same way the circuit-breaker
/// registry discovers breakers.
pub struct RateLimiter {
    shared: Arc<Shared>,
    sweeper: Option<JoinHandle<()>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_observer(config, None, EventListeners::new())
    }

    /// Like [`RateLimiter::new`], with an optional metrics observer and a
    /// pre-built set of event listeners. Listeners must be attached here,
    /// before construction, since the sweeper task immediately takes its
    /// own handle on the shared state.
    pub fn with_observer(
        config: RateLimiterConfig,
        observer: Option<Arc<dyn RateLimitObserver>>,
        event_listeners: EventListeners<RateLimiterEvent>,
    ) -> Self {
        let global = Mutex::new(TokenBucket::new(config.global_limit(), config.global_limit() as f64));
        let sweep_interval = config.sweep_interval;

        let shared = Arc::new(Shared {
            config,
            global,
            per_ip: RwLock::new(HashMap::new()),
            observer,
            event_listeners,
        });

        let sweep_shared = shared.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sweep(&sweep_shared);
            }
        });

        Self {
            shared,
            sweeper: Some(sweeper),
        }
    }

    /// Admits or rejects `remote_addr` (typically Hyper/Axum's
    /// `ConnectInfo` socket address string). Global bucket is checked
    /// first; a per-IP bucket is only consulted — and only created — once
    /// the global check passes.
    pub fn admit(&self, remote_addr: &str) -> Result<(), RateLimitError> {
        if !self.shared.global.lock().try_acquire() {
            if let Some(observer) = &self.shared.observer {
                observer.record_rejected_global();
            }
            self.shared.event_listeners.emit(&RateLimiterEvent::RejectedGlobal {
                timestamp: Instant::now(),
            });
            return Err(RateLimitError::GlobalLimitExceeded);
        }

        let ip = host_of(remote_addr).to_string();
        let admitted = {
            let buckets = self.shared.per_ip.read();
            if let Some(bucket) = buckets.get(&ip) {
                bucket.lock().try_acquire()
            } else {
                drop(buckets);
                let mut buckets = self.shared.per_ip.write();
                let bucket = buckets
                    .entry(ip.clone())
                    .or_insert_with(|| Mutex::new(TokenBucket::new(self.shared.config.per_ip_limit(), self.shared.config.per_ip_limit() as f64)));
                bucket.lock().try_acquire()
            }
        };

        if !admitted {
            if let Some(observer) = &self.shared.observer {
                observer.record_rejected_per_ip(&ip);
            }
            self.shared.event_listeners.emit(&RateLimiterEvent::RejectedPerIp {
                timestamp: Instant::now(),
                ip,
            });
            return Err(RateLimitError::PerIpLimitExceeded);
        }

        if let Some(observer) = &self.shared.observer {
            observer.record_admitted(&ip);
        }
        self.shared.event_listeners.emit(&RateLimiterEvent::Admitted {
            timestamp: Instant::now(),
            ip,
        });
        Ok(())
    }

    pub fn tracked_ips(&self) -> usize {
        self.shared.per_ip.read().len()
    }

    /// Terminates the background eviction sweep. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Evicts per-IP buckets that are at full capacity and have been idle for
/// at least `capacity / limit` seconds — proof the bucket hasn't been
/// touched since it last refilled completely, per spec §4.9.
fn sweep(shared: &Shared) {
    let now = Instant::now();
    let mut evicted = Vec::new();

    {
        let mut buckets = shared.per_ip.write();
        buckets.retain(|ip, bucket| {
            let mut b = bucket.lock();
            if b.is_full(now) && now.duration_since(b.last_refill()) >= b.idle_window() {
                evicted.push(ip.clone());
                false
            } else {
                true
            }
        });
    }

    for ip in evicted {
        shared.event_listeners.emit(&RateLimiterEvent::BucketEvicted {
            timestamp: Instant::now(),
            ip,
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("rate limiter sweep completed");
}

/// Extracts the host portion of a `host:port` or bracketed `[ipv6]:port`
/// remote address string, per spec §4.9 ("keyed by the host portion of
/// RemoteAddr, not the full ip:port").
fn host_of(remote_addr: &str) -> &str {
    if let Some(rest) = remote_addr.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    match remote_addr.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => host,
        _ => remote_addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn host_of_strips_ipv4_port() {
        assert_eq!(host_of("203.0.113.5:51342"), "203.0.113.5");
    }

    #[test]
    fn host_of_strips_bracketed_ipv6_port() {
        assert_eq!(host_of("[::1]:8080"), "::1");
    }

    #[test]
    fn host_of_passes_through_bare_host() {
        assert_eq!(host_of("203.0.113.5"), "203.0.113.5");
    }

    #[tokio::test]
    async fn per_ip_limit_is_enforced_independently_of_other_ips() {
        let config = RateLimiterConfig::builder().global_limit(1000).per_ip_limit(2).build();
        let limiter = RateLimiter::new(config);

        assert!(limiter.admit("1.1.1.1:1").is_ok());
        assert!(limiter.admit("1.1.1.1:2").is_ok());
        assert_eq!(limiter.admit("1.1.1.1:3"), Err(RateLimitError::PerIpLimitExceeded));

        assert!(limiter.admit("2.2.2.2:1").is_ok());
    }

    #[tokio::test]
    async fn global_limit_is_checked_before_per_ip() {
        let config = RateLimiterConfig::builder().global_limit(1).per_ip_limit(50).build();
        let limiter = RateLimiter::new(config);

        assert!(limiter.admit("1.1.1.1:1").is_ok());
        assert_eq!(limiter.admit("2.2.2.2:1"), Err(RateLimitError::GlobalLimitExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_full_idle_buckets() {
        let config = RateLimiterConfig::builder()
            .global_limit(1000)
            .per_ip_limit(5)
            .sweep_interval(Duration::from_millis(10))
            .build();
        let limiter = RateLimiter::new(config);

        limiter.admit("9.9.9.9:1").unwrap();
        assert_eq!(limiter.tracked_ips(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.tracked_ips(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut limiter = RateLimiter::new(RateLimiterConfig::builder().build());
        limiter.stop();
        limiter.stop();
    }
}
