//! TTL cache mapping an alert's `fingerprint` to the incident ID a sink
//! returned for it. Lets a firing alert's later updates and its eventual
//! resolution find the same remote incident instead of creating duplicates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::task::JoinHandle;

/// Default sweep cadence: once an hour, matching the expectation that
/// entries linger well past their TTL between sweeps without harm — `get`
/// enforces expiry eagerly regardless of sweep timing.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

struct Entry {
    incident_id: String,
    expires_at: Instant,
}

struct Shared {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

/// A concurrent fingerprint → incident-ID cache with a background sweeper.
///
/// Cloning shares the underlying store; the sweeper task is owned by the
/// clone that called [`IncidentCache::new`] and stopped via [`IncidentCache::stop`].
pub struct IncidentCache {
    shared: Arc<Shared>,
    sweeper: Option<JoinHandle<()>>,
}

impl IncidentCache {
    /// Spawns a background sweeper on the current Tokio runtime.
    pub fn new(ttl: Duration) -> Self {
        Self::with_sweep_interval(ttl, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(ttl: Duration, sweep_interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::new()),
            ttl,
        });

        let sweeper_shared = shared.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                sweep(&sweeper_shared);
            }
        });

        Self {
            shared,
            sweeper: Some(sweeper),
        }
    }

    /// Stores `(incident_id, now + ttl)` for `fingerprint`, overwriting any
    /// existing entry.
    pub fn set(&self, fingerprint: &str, incident_id: impl Into<String>) {
        let mut entries = self.shared.entries.write();
        entries.insert(
            fingerprint.to_string(),
            Entry {
                incident_id: incident_id.into(),
                expires_at: Instant::now() + self.shared.ttl,
            },
        );
    }

    /// Returns the cached incident ID iff it hasn't expired, evicting it if it has.
    pub fn get(&self, fingerprint: &str) -> Option<String> {
        {
            let entries = self.shared.entries.read();
            match entries.get(fingerprint) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.incident_id.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.shared.entries.write().remove(fingerprint);
        None
    }

    /// Removes an entry regardless of expiry, used when a sink reports the
    /// remote incident no longer exists (404/409 on update or resolve).
    pub fn evict(&self, fingerprint: &str) {
        self.shared.entries.write().remove(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Terminates the background sweeper. Idempotent; safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

impl Drop for IncidentCache {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sweep(shared: &Shared) {
    let now = Instant::now();
    let mut entries = shared.entries.write();
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);

    #[cfg(feature = "tracing")]
    {
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "incident cache sweep evicted expired entries");
        }
    }
    #[cfg(not(feature = "tracing"))]
    let _ = before;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = IncidentCache::new(Duration::from_secs(60));
        cache.set("fp-1", "INC-100");
        assert_eq!(cache.get("fp-1"), Some("INC-100".to_string()));
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let cache = IncidentCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn get_evicts_expired_entries() {
        let cache = IncidentCache::new(Duration::from_millis(10));
        cache.set("fp-1", "INC-100");
        tokio::time::advance(Duration::from_millis(20)).await;

        assert_eq!(cache.get("fp-1"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn evict_removes_unconditionally() {
        let cache = IncidentCache::new(Duration::from_secs(60));
        cache.set("fp-1", "INC-100");
        cache.evict("fp-1");
        assert_eq!(cache.get("fp-1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_removes_expired_entries_without_a_get() {
        let cache = IncidentCache::with_sweep_interval(Duration::from_millis(10), Duration::from_millis(5));
        cache.set("fp-1", "INC-100");
        tokio::time::advance(Duration::from_millis(25)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut cache = IncidentCache::new(Duration::from_secs(60));
        cache.stop();
        cache.stop();
    }
}
