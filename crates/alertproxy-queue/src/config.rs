use std::time::Duration;

/// Per-priority bounded-channel capacity and worker-pool sizing for a
/// [`crate::PublishingQueue`].
///
/// The retry schedule derived for every job is fixed at `maxDelay = 30s`,
/// `multiplier = 2.0`, `jitterRatio = 0.15` (spec §4.5); only the attempt
/// count and base delay are configurable per deployment.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub high_capacity: usize,
    pub medium_capacity: usize,
    pub low_capacity: usize,
    pub worker_count: usize,
    pub max_retries: usize,
    pub retry_interval: Duration,
    pub idle_poll_timeout: Duration,
}

impl QueueConfig {
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::default()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct QueueConfigBuilder {
    high_capacity: usize,
    medium_capacity: usize,
    low_capacity: usize,
    worker_count: usize,
    max_retries: usize,
    retry_interval: Duration,
    idle_poll_timeout: Duration,
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self {
            high_capacity: 500,
            medium_capacity: 1000,
            low_capacity: 2000,
            worker_count: 10,
            max_retries: 3,
            retry_interval: Duration::from_millis(500),
            idle_poll_timeout: Duration::from_millis(100),
        }
    }
}

impl QueueConfigBuilder {
    pub fn high_capacity(mut self, n: usize) -> Self {
        self.high_capacity = n;
        self
    }

    pub fn medium_capacity(mut self, n: usize) -> Self {
        self.medium_capacity = n;
        self
    }

    pub fn low_capacity(mut self, n: usize) -> Self {
        self.low_capacity = n;
        self
    }

    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn retry_interval(mut self, d: Duration) -> Self {
        self.retry_interval = d;
        self
    }

    pub fn idle_poll_timeout(mut self, d: Duration) -> Self {
        self.idle_poll_timeout = d;
        self
    }

    pub fn build(self) -> QueueConfig {
        QueueConfig {
            high_capacity: self.high_capacity,
            medium_capacity: self.medium_capacity,
            low_capacity: self.low_capacity,
            worker_count: self.worker_count,
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
            idle_poll_timeout: self.idle_poll_timeout,
        }
    }
}
