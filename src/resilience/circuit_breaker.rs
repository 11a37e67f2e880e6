//! Circuit breaker for failing dependencies.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls rejected without being invoked
//! - Half-Open: probing, calls allowed through to test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: first call after next_attempt_at has elapsed
//! Half-Open → Closed: success_count >= success_threshold
//! Half-Open → Open: any single failure
//! ```
//!
//! # Design Decisions
//! - Open → Half-Open happens lazily inside the call path, not on a timer;
//!   no background work, at the cost of state looking stale between calls
//! - Rejection uses a dedicated `CircuitOpen` error, never the wrapped
//!   operation's error
//! - Counters are mutually exclusive accumulators: success zeroes
//!   `failure_count`, and `success_count` only advances in Half-Open
//! - State lives behind a mutex; unlike a single-threaded event loop, a
//!   multi-threaded runtime can race `execute()` calls mid-transition

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ResilienceError;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Tuning knobs for a breaker. Fixed at construction.
#[derive(Debug, Clone)]
pub struct CircuitBreakerOptions {
    /// Consecutive failures in Closed before tripping Open.
    pub failure_threshold: u32,
    /// Consecutive successes in Half-Open before closing.
    pub success_threshold: u32,
    /// Cooldown before Open allows a probe call.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerOptions {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&crate::config::CircuitBreakerConfig> for CircuitBreakerOptions {
    fn from(config: &crate::config::CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    next_attempt_at: Option<Instant>,
}

type StateObserver = Arc<dyn Fn(CircuitState) + Send + Sync>;

/// Failure tracker for one named dependency.
pub struct CircuitBreaker {
    name: String,
    options: CircuitBreakerOptions,
    inner: Mutex<BreakerInner>,
    on_state_change: Mutex<Option<StateObserver>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, options: CircuitBreakerOptions) -> Self {
        Self {
            name: name.into(),
            options,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                next_attempt_at: None,
            }),
            on_state_change: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker mutex poisoned").state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().expect("breaker mutex poisoned").failure_count
    }

    /// Register an observer invoked on every state transition.
    pub fn set_on_state_change(&self, observer: impl Fn(CircuitState) + Send + Sync + 'static) {
        *self.on_state_change.lock().expect("breaker mutex poisoned") = Some(Arc::new(observer));
    }

    /// Run `operation` through the breaker.
    ///
    /// While Open and before the cooldown elapses, rejects with
    /// [`ResilienceError::CircuitOpen`] without invoking the operation. The
    /// first call after the cooldown transitions to Half-Open and probes.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, ResilienceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ResilienceError>>,
    {
        self.before_call()?;
        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(err)
            }
        }
    }

    /// Force Closed and zero both counters, regardless of current state.
    pub fn reset(&self) {
        let transitioned = {
            let mut inner = self.inner.lock().expect("breaker mutex poisoned");
            let was = inner.state;
            inner.state = CircuitState::Closed;
            inner.failure_count = 0;
            inner.success_count = 0;
            inner.next_attempt_at = None;
            (was != CircuitState::Closed).then_some(CircuitState::Closed)
        };
        if let Some(state) = transitioned {
            tracing::info!(breaker = %self.name, "Circuit manually reset");
            self.notify(state);
        }
    }

    fn before_call(&self) -> Result<(), ResilienceError> {
        let transitioned = {
            let mut inner = self.inner.lock().expect("breaker mutex poisoned");
            match inner.state {
                CircuitState::Closed | CircuitState::HalfOpen => None,
                CircuitState::Open => {
                    let now = Instant::now();
                    match inner.next_attempt_at {
                        Some(at) if now < at => {
                            metrics::record_circuit_rejection(&self.name);
                            return Err(ResilienceError::CircuitOpen {
                                name: self.name.clone(),
                                retry_in: at - now,
                            });
                        }
                        _ => {
                            inner.state = CircuitState::HalfOpen;
                            inner.success_count = 0;
                            Some(CircuitState::HalfOpen)
                        }
                    }
                }
            }
        };
        if let Some(state) = transitioned {
            tracing::info!(breaker = %self.name, "Circuit half-open, probing dependency");
            self.notify(state);
        }
        Ok(())
    }

    fn on_success(&self) {
        let transitioned = {
            let mut inner = self.inner.lock().expect("breaker mutex poisoned");
            inner.failure_count = 0;
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.success_count += 1;
                    if inner.success_count >= self.options.success_threshold {
                        inner.state = CircuitState::Closed;
                        inner.success_count = 0;
                        inner.next_attempt_at = None;
                        Some(CircuitState::Closed)
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };
        if let Some(state) = transitioned {
            tracing::info!(breaker = %self.name, "Circuit closed, dependency recovered");
            self.notify(state);
        }
    }

    fn on_failure(&self) {
        let transitioned = {
            let mut inner = self.inner.lock().expect("breaker mutex poisoned");
            inner.success_count = 0;
            match inner.state {
                CircuitState::HalfOpen => {
                    // One failed probe reopens immediately
                    inner.state = CircuitState::Open;
                    inner.next_attempt_at = Some(Instant::now() + self.options.reset_timeout);
                    Some(CircuitState::Open)
                }
                CircuitState::Closed => {
                    inner.failure_count += 1;
                    if inner.failure_count >= self.options.failure_threshold {
                        inner.state = CircuitState::Open;
                        inner.next_attempt_at = Some(Instant::now() + self.options.reset_timeout);
                        Some(CircuitState::Open)
                    } else {
                        None
                    }
                }
                CircuitState::Open => None,
            }
        };
        if let Some(state) = transitioned {
            tracing::warn!(
                breaker = %self.name,
                reset_timeout_ms = self.options.reset_timeout.as_millis() as u64,
                "Circuit opened, failing fast"
            );
            self.notify(state);
        }
    }

    // The observer is cloned out of its slot and invoked with no breaker
    // lock held, so a hook may call back into `reset()` or `execute()`.
    fn notify(&self, state: CircuitState) {
        metrics::record_circuit_state(&self.name, state);
        let observer = self
            .on_state_change
            .lock()
            .expect("breaker mutex poisoned")
            .clone();
        if let Some(observer) = observer {
            observer(state);
        }
    }
}
