//! Operator-facing toggle that lets workers keep draining the queue without
//! actually dispatching to sinks — useful for observing incoming load
//! during an incident without generating more outbound traffic.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ModeManager {
    metrics_only: AtomicBool,
}

impl ModeManager {
    pub fn new() -> Self {
        Self {
            metrics_only: AtomicBool::new(false),
        }
    }

    pub fn is_metrics_only(&self) -> bool {
        self.metrics_only.load(Ordering::Acquire)
    }

    pub fn set_metrics_only(&self, enabled: bool) {
        self.metrics_only.store(enabled, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_normal_dispatch() {
        let mode = ModeManager::new();
        assert!(!mode.is_metrics_only());
    }

    #[test]
    fn toggles_take_effect_immediately() {
        let mode = ModeManager::new();
        mode.set_metrics_only(true);
        assert!(mode.is_metrics_only());
        mode.set_metrics_only(false);
        assert!(!mode.is_metrics_only());
    }
}
