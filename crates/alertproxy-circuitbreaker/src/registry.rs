use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::breaker::{CircuitBreaker, CircuitBreakerConfig};

/// Breakers are discovered lazily by target name. A read lock serves the
/// common case (breaker already exists); a miss escalates to a write lock
/// and re-checks before inserting, so concurrent first-callers for the same
/// target never race to create two breakers.
#[derive(Clone)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: Arc<RwLock<HashMap<String, Arc<CircuitBreaker>>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get_or_create(&self, target: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.read().unwrap().get(target) {
            return existing.clone();
        }

        let mut breakers = self.breakers.write().unwrap();
        if let Some(existing) = breakers.get(target) {
            return existing.clone();
        }

        let breaker = Arc::new(CircuitBreaker::new(target.to_string(), self.config.clone()));
        breakers.insert(target.to_string(), breaker.clone());
        breaker
    }

    pub fn get(&self, target: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.read().unwrap().get(target).cloned()
    }

    pub fn len(&self) -> usize {
        self.breakers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default_config())
    }
}
