//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound operation:
//!     → timeout.rs (bound how long we wait; the work itself is detached)
//!     → retry.rs (on failure: consult policy, back off with jitter, retry)
//!     → circuit_breaker.rs (per-dependency failure tracking, fail fast
//!       while open; registry.rs hands out one breaker per name)
//! ```
//!
//! # Design Decisions
//! - Retrier and timeout wrapper re-raise the original failure unchanged;
//!   they only delay or bound, never swallow
//! - The circuit breaker rejects with its own `CircuitOpen` error so callers
//!   can tell "did not try" from "tried and failed"
//! - OPEN → HALF_OPEN happens lazily inside `execute()`, not on a timer;
//!   between calls the observed state can look stale, which callers accept
//!   in exchange for zero background work

pub mod backoff;
pub mod circuit_breaker;
pub mod registry;
pub mod retry;
pub mod timeout;

pub use backoff::backoff_delay;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerOptions, CircuitState};
pub use registry::CircuitBreakerRegistry;
pub use retry::{with_retry, RetryPolicy};
pub use timeout::{with_timeout, with_timeout_cancelling, with_timeout_or};
