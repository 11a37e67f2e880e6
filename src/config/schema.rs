//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, with
//! defaults matching the layer's built-in behavior.

use serde::{Deserialize, Serialize};

/// Root configuration for the resilience layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retry policy defaults.
    pub retry: RetryConfig,

    /// Circuit breaker defaults.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Offline queue settings.
    pub offline_queue: OfflineQueueConfig,

    /// Connection health monitor settings.
    pub health_check: HealthCheckConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Retry policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total invocations of the operation, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay_ms: u64,

    /// Ceiling on any single backoff delay.
    pub max_delay_ms: u64,

    /// Exponential growth factor between retries.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,

    /// Cooldown before an open circuit allows a probe call.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

/// Offline queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OfflineQueueConfig {
    /// Replay attempts per item before it is dropped.
    pub max_retries: u32,

    /// Base of the linear backoff between replays of the same item.
    pub retry_delay_ms: u64,

    /// Where the queue blob is persisted. None keeps the queue in memory.
    pub storage_path: Option<String>,
}

impl Default for OfflineQueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 2_000,
            storage_path: None,
        }
    }
}

/// Connection health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub enabled: bool,

    /// Health endpoint URL (expected to answer 2xx quickly).
    pub endpoint: String,

    /// Probe interval. The first probe waits a full interval.
    pub interval_secs: u64,

    /// Per-probe timeout.
    pub timeout_ms: u64,

    /// Consecutive failures before the status becomes Unhealthy.
    pub max_consecutive_failures: u32,

    /// Successful probes faster than this are Healthy, slower are Degraded.
    pub healthy_latency_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://127.0.0.1:8080/health".to_string(),
            interval_secs: 30,
            timeout_ms: 5_000,
            max_consecutive_failures: 3,
            healthy_latency_ms: 1_000,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g. "info", "client_resilience=debug").
    pub log_level: String,

    /// "pretty" for development, "json" for production.
    pub log_format: String,

    /// Whether to expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Bind address for the Prometheus exporter.
    pub metrics_bind_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_bind_address: "127.0.0.1:9100".to_string(),
        }
    }
}
