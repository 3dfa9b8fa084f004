use std::time::{Duration, Instant};

/// A single token bucket: `capacity` tokens, refilled continuously at
/// `refill_per_second` tokens/sec, clamped at `capacity`.
///
/// Refill is computed lazily on each [`TokenBucket::try_acquire`] call from
/// elapsed wall-clock time rather than by a background tick — the bucket
/// itself never schedules anything.
pub(crate) struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub(crate) fn new(capacity: u32, refill_per_second: f64) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_second,
            tokens: capacity as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    /// Consumes one token if available. Returns `true` on admission.
    pub(crate) fn try_acquire(&mut self) -> bool {
        self.refill(Instant::now());
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whether the bucket is at (or above, from float drift) full capacity
    /// as of `now` — used by the eviction sweep to identify idle per-IP
    /// buckets without consuming a token.
    pub(crate) fn is_full(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= self.capacity
    }

    /// Seconds of complete idleness required for a full bucket to prove it
    /// hasn't been touched: `capacity / refill_per_second`.
    pub(crate) fn idle_window(&self) -> Duration {
        if self.refill_per_second <= 0.0 {
            return Duration::MAX;
        }
        Duration::from_secs_f64(self.capacity / self.refill_per_second)
    }

    pub(crate) fn last_refill(&self) -> Instant {
        self.last_refill
    }
}
