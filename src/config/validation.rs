//! Configuration validation.

use thiserror::Error;

use crate::config::schema::ResilienceConfig;

/// A single rejected configuration field.
#[derive(Debug, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Check cross-field and range constraints. Returns all violations at once.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.retry.max_attempts == 0 {
        errors.push(err("retry.max_attempts", "must be at least 1"));
    }
    if config.retry.backoff_multiplier < 1.0 {
        errors.push(err("retry.backoff_multiplier", "must be >= 1.0"));
    }
    if config.retry.initial_delay_ms > config.retry.max_delay_ms {
        errors.push(err("retry.initial_delay_ms", "must not exceed max_delay_ms"));
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(err("circuit_breaker.failure_threshold", "must be at least 1"));
    }
    if config.circuit_breaker.success_threshold == 0 {
        errors.push(err("circuit_breaker.success_threshold", "must be at least 1"));
    }

    if config.offline_queue.max_retries == 0 {
        errors.push(err("offline_queue.max_retries", "must be at least 1"));
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(err("health_check.interval_secs", "must be at least 1"));
        }
        if config.health_check.timeout_ms == 0 {
            errors.push(err("health_check.timeout_ms", "must be at least 1"));
        }
        if config.health_check.endpoint.parse::<url::Url>().is_err() {
            errors.push(err("health_check.endpoint", "must be a valid URL"));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_bind_address",
            "must be a valid socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
