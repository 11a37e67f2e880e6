//! Circuit breaker registry.
//!
//! # Responsibilities
//! - Hand out at most one breaker per dependency name
//! - Construct breakers lazily with the options supplied on first access
//!
//! # Design Decisions
//! - An explicit value passed to call sites, not a module-level singleton,
//!   so tests can instantiate isolated registries
//! - Options on later `get` calls for an existing name are ignored; the
//!   first caller wins. Sharp edge: two call sites asking for the same name
//!   with different thresholds silently share the first configuration.

use dashmap::DashMap;
use std::sync::Arc;

use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerOptions};

/// Shared map of named circuit breakers. Clones share the same map.
#[derive(Clone, Default)]
pub struct CircuitBreakerRegistry {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily create the breaker for `name`.
    pub fn get(&self, name: &str, options: CircuitBreakerOptions) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(breaker = %name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(name, options))
            })
            .clone()
    }

    /// Get the breaker for `name` with default options.
    pub fn get_default(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get(name, CircuitBreakerOptions::default())
    }

    /// Force one named breaker back to Closed, if it exists.
    pub fn reset(&self, name: &str) {
        if let Some(breaker) = self.breakers.get(name) {
            breaker.reset();
        }
    }

    /// Force every registered breaker back to Closed.
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
