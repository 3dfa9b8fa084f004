use std::time::Duration;

/// Sweep cadence for evicting idle per-IP buckets, per spec §4.9.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Configuration for [`crate::RateLimiter`]: a global bucket shared by every
/// request, and a per-remote-IP bucket created lazily on first sight.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub(crate) global_limit: u32,
    pub(crate) per_ip_limit: u32,
    pub(crate) sweep_interval: Duration,
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::default()
    }

    pub fn global_limit(&self) -> u32 {
        self.global_limit
    }

    pub fn per_ip_limit(&self) -> u32 {
        self.per_ip_limit
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiterConfigBuilder {
    global_limit: u32,
    per_ip_limit: u32,
    sweep_interval: Duration,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self {
            global_limit: 1000,
            per_ip_limit: 50,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RateLimiterConfigBuilder {
    /// Capacity (and per-second refill) of the shared global bucket.
    pub fn global_limit(mut self, limit: u32) -> Self {
        self.global_limit = limit;
        self
    }

    /// Capacity (and per-second refill) of each per-IP bucket.
    pub fn per_ip_limit(mut self, limit: u32) -> Self {
        self.per_ip_limit = limit;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            global_limit: self.global_limit.max(1),
            per_ip_limit: self.per_ip_limit.max(1),
            sweep_interval: self.sweep_interval,
        }
    }
}
