//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an async operation against a deadline
//! - Surface a distinct, typed timeout error
//!
//! # Design Decisions
//! - Timeout means "stop waiting", not "abort work": the operation is
//!   spawned as a task and keeps running after the deadline fires; its
//!   result is discarded. Callers wrapping non-idempotent work must account
//!   for the detached task still mutating state after they have moved on.
//! - [`with_timeout_cancelling`] is the opt-in variant that drops the
//!   operation on expiry for callers that want real cancellation.

use std::future::Future;
use std::time::Duration;

use crate::error::ResilienceError;

/// Wait at most `timeout` for `operation`, rejecting with a default timeout
/// error on expiry. The operation is detached, not cancelled.
pub async fn with_timeout<T>(
    operation: impl Future<Output = Result<T, ResilienceError>> + Send + 'static,
    timeout: Duration,
) -> Result<T, ResilienceError>
where
    T: Send + 'static,
{
    with_timeout_or(operation, timeout, ResilienceError::Timeout { after: timeout }).await
}

/// [`with_timeout`] with a caller-supplied timeout error.
pub async fn with_timeout_or<T>(
    operation: impl Future<Output = Result<T, ResilienceError>> + Send + 'static,
    timeout: Duration,
    timeout_error: ResilienceError,
) -> Result<T, ResilienceError>
where
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ResilienceError::Unexpected(format!(
            "wrapped operation panicked: {join_err}"
        ))),
        Err(_elapsed) => {
            // Dropping the JoinHandle detaches the task; it runs to
            // completion in the background.
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Operation timed out, detaching");
            Err(timeout_error)
        }
    }
}

/// Cancelling variant: the operation future is dropped when the deadline
/// fires, so no background work survives the timeout.
pub async fn with_timeout_cancelling<T>(
    operation: impl Future<Output = Result<T, ResilienceError>>,
    timeout: Duration,
) -> Result<T, ResilienceError> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ResilienceError::Timeout { after: timeout }),
    }
}
