//! Error taxonomy for the resilience layer.
//!
//! # Responsibilities
//! - Classify failures into retryable and non-retryable categories
//! - Keep the circuit-open rejection distinct from operation failures
//!
//! # Design Decisions
//! - NETWORK, TIMEOUT and UNEXPECTED are retryable by default
//! - VALIDATION is never retryable
//! - BACKEND is retryable only at the caller's discretion (default: no)
//! - `CircuitOpen` means "we did not even try" and must never be
//!   confused with "we tried and the dependency failed"

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the resilience layer.
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Connectivity failure reaching the dependency.
    #[error("network error: {0}")]
    Network(String),

    /// Input rejected before any network activity.
    #[error("validation error: {0}")]
    Validation(String),

    /// The dependency was reached and reported a failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// The operation did not settle within the allowed time.
    #[error("operation timed out after {after:?}")]
    Timeout {
        /// The configured deadline, not a measured duration.
        after: Duration,
    },

    /// Rejected fail-fast by an open circuit; the operation was not invoked.
    #[error("circuit '{name}' is open, retry in {retry_in:?}")]
    CircuitOpen { name: String, retry_in: Duration },

    /// Anything that does not fit the categories above.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ResilienceError {
    /// Whether this failure is worth retrying by default.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResilienceError::Network(_) => true,
            ResilienceError::Timeout { .. } => true,
            ResilienceError::Unexpected(_) => true,
            ResilienceError::Validation(_) => false,
            ResilienceError::Backend(_) => false,
            ResilienceError::CircuitOpen { .. } => false,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResilienceError::Network(_) => "network",
            ResilienceError::Validation(_) => "validation",
            ResilienceError::Backend(_) => "backend",
            ResilienceError::Timeout { .. } => "timeout",
            ResilienceError::CircuitOpen { .. } => "circuit_open",
            ResilienceError::Unexpected(_) => "unexpected",
        }
    }
}
