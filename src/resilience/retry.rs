//! Retry logic.
//!
//! # Responsibilities
//! - Execute an async operation up to `max_attempts` times
//! - Back off between attempts with exponential delay + jitter
//! - Consult a `should_retry` predicate before every sleep
//!
//! # Design Decisions
//! - The last observed error is re-raised unchanged; this layer never
//!   swallows or rewraps failures
//! - The default predicate matches network-indicative substrings in the
//!   error message. This is a heuristic, not a typed check: any error whose
//!   message happens to contain a matched substring (e.g. a validation
//!   message mentioning "timeout") is misclassified as retryable. Kept for
//!   behavioral compatibility with existing callers; use
//!   [`RetryPolicy::with_should_retry`] for typed classification.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::backoff::backoff_delay;

/// Error-message substrings treated as network-shaped by the default policy.
const NETWORK_ERROR_PATTERNS: &[&str] = &["fetch", "network", "timeout", "timed out", "connection"];

/// Case-insensitive substring match against [`NETWORK_ERROR_PATTERNS`].
pub fn looks_like_network_error(message: &str) -> bool {
    let message = message.to_lowercase();
    NETWORK_ERROR_PATTERNS.iter().any(|p| message.contains(p))
}

type RetryPredicate<E> = Arc<dyn Fn(&E, u32) -> bool + Send + Sync>;
type RetryObserver<E> = Arc<dyn Fn(&E, u32, Duration) + Send + Sync>;

/// Policy controlling [`with_retry`].
///
/// Immutable value; build once and reuse across calls, or construct per call.
#[derive(Clone)]
pub struct RetryPolicy<E> {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    should_retry: RetryPredicate<E>,
    on_retry: Option<RetryObserver<E>>,
}

impl<E: Display> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            should_retry: Arc::new(|err, _attempt| looks_like_network_error(&err.to_string())),
            on_retry: None,
        }
    }
}

impl<E: Display> RetryPolicy<E> {
    /// Policy from configuration, keeping the default predicate.
    pub fn from_config(config: &crate::config::RetryConfig) -> Self {
        Self::default()
            .with_max_attempts(config.max_attempts)
            .with_initial_delay(Duration::from_millis(config.initial_delay_ms))
            .with_max_delay(Duration::from_millis(config.max_delay_ms))
            .with_backoff_multiplier(config.backoff_multiplier)
    }
}

impl<E> RetryPolicy<E> {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Replace the retry predicate. Called as `should_retry(error, attempt)`
    /// with the 0-indexed attempt that just failed.
    pub fn with_should_retry(
        mut self,
        predicate: impl Fn(&E, u32) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Observer invoked as `on_retry(error, attempt_number, delay)` before
    /// each sleep, where `attempt_number` is the 1-based count of failed
    /// attempts so far.
    pub fn with_on_retry(
        mut self,
        observer: impl Fn(&E, u32, Duration) + Send + Sync + 'static,
    ) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }
}

/// Execute `operation` under `policy`.
///
/// Returns the first success. A permanently failing operation is invoked
/// exactly `max_attempts` times and the error from the final invocation is
/// returned. If `should_retry` declines, the error is returned immediately
/// without sleeping.
pub async fn with_retry<T, E, F, Fut>(mut operation: F, policy: &RetryPolicy<E>) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let exhausted = attempt + 1 >= policy.max_attempts;
                if exhausted || !(policy.should_retry)(&err, attempt) {
                    if exhausted {
                        metrics::record_retries_exhausted();
                    }
                    return Err(err);
                }

                let delay = backoff_delay(
                    attempt,
                    policy.initial_delay,
                    policy.backoff_multiplier,
                    policy.max_delay,
                );
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying after backoff"
                );
                metrics::record_retry_attempt();

                if let Some(on_retry) = &policy.on_retry {
                    on_retry(&err, attempt + 1, delay);
                }

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
