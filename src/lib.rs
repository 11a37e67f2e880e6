//! Client-side resilience layer.
//!
//! Composable building blocks that harden UI-initiated operations against
//! flaky networks and failing backends.
//!
//! # Architecture Overview
//!
//! ```text
//!   UI-initiated operation
//!        │
//!        ▼
//!   ┌───────────────┐     ┌────────────────┐     ┌──────────────────┐
//!   │  resilience   │────▶│   resilience   │────▶│    resilience     │
//!   │  timeout      │     │   retry        │     │  circuit_breaker  │
//!   │ (stop waiting)│     │(backoff+jitter)│     │ (per-dependency,  │
//!   └───────────────┘     └────────────────┘     │  fail fast)       │
//!                                                └──────────────────┘
//!   Network-shaped write failures
//!        │
//!        ▼
//!   ┌───────────────┐     ┌────────────────┐
//!   │    queue      │◀───▶│  net           │
//!   │ (FIFO replay, │     │  connectivity  │
//!   │  persisted)   │     │ (online flag)  │
//!   └───────────────┘     └────────────────┘
//!
//!   Independent, informational only:
//!   ┌───────────────┐
//!   │    health     │  periodic probe → ConnectionHealth → subscribers
//!   └───────────────┘
//! ```
//!
//! The pieces compose but do not depend on each other: wrap an operation in
//! a timeout, a retry policy, a named breaker, or any combination; route
//! offline write failures through the queue; let the health monitor keep the
//! UI honest about backend reachability.

// Core components
pub mod error;
pub mod health;
pub mod queue;
pub mod resilience;

// Cross-cutting concerns
pub mod config;
pub mod net;
pub mod observability;

pub use config::ResilienceConfig;
pub use error::ResilienceError;
pub use health::{ConnectionHealth, ConnectionMonitor, HealthStatus};
pub use net::Connectivity;
pub use queue::OfflineQueue;
pub use resilience::{
    with_retry, with_timeout, CircuitBreaker, CircuitBreakerOptions, CircuitBreakerRegistry,
    CircuitState, RetryPolicy,
};
