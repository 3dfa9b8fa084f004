use alertproxy_core::ResilienceEvent;
use std::time::Instant;

/// Observability events emitted by the rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    Admitted {
        timestamp: Instant,
        ip: String,
    },
    RejectedGlobal {
        timestamp: Instant,
    },
    RejectedPerIp {
        timestamp: Instant,
        ip: String,
    },
    BucketEvicted {
        timestamp: Instant,
        ip: String,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::Admitted { .. } => "admitted",
            RateLimiterEvent::RejectedGlobal { .. } => "rejected_global",
            RateLimiterEvent::RejectedPerIp { .. } => "rejected_per_ip",
            RateLimiterEvent::BucketEvicted { .. } => "bucket_evicted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::Admitted { timestamp, .. }
            | RateLimiterEvent::RejectedGlobal { timestamp }
            | RateLimiterEvent::RejectedPerIp { timestamp, .. }
            | RateLimiterEvent::BucketEvicted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::Admitted { ip, .. }
            | RateLimiterEvent::RejectedPerIp { ip, .. }
            | RateLimiterEvent::BucketEvicted { ip, .. } => ip,
            RateLimiterEvent::RejectedGlobal { .. } => "global",
        }
    }
}
