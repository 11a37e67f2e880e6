//! Connection health values.
//!
//! # States
//! - Healthy: probe succeeded quickly
//! - Degraded: probe succeeded slowly, or failures below the outage threshold
//! - Unhealthy: consecutive failures reached the outage threshold
//! - Unknown: no probe has completed yet
//!
//! # Design Decisions
//! - Every probe produces a complete replacement value, never a partial
//!   update; subscribers always observe a consistent snapshot

use serde::Serialize;

/// Backend reachability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of backend reachability, recomputed on every probe.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionHealth {
    pub status: HealthStatus,
    /// Probe completion time, milliseconds since the epoch. Zero until the
    /// first probe completes.
    pub last_check: u64,
    /// Round-trip latency of the last successful probe.
    pub latency_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub message: String,
}

impl ConnectionHealth {
    /// Baseline value before any probe has run.
    pub fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            last_check: 0,
            latency_ms: None,
            consecutive_failures: 0,
            message: "no health check performed yet".to_string(),
        }
    }
}
