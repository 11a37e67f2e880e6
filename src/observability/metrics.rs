//! Metrics collection.
//!
//! # Metrics
//! - `resilience_retry_attempts_total` (counter): sleeps taken before retries
//! - `resilience_retries_exhausted_total` (counter): operations that failed
//!   after the final attempt
//! - `resilience_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `resilience_circuit_rejections_total` (counter): fail-fast rejections
//! - `resilience_queue_depth` (gauge): pending queued requests
//! - `resilience_queue_replayed_total` / `resilience_queue_dropped_total`
//! - `resilience_probe_latency_seconds` (histogram): successful probe RTT
//! - `resilience_probe_outcomes_total` (counter): probes by resulting status

use metrics::{counter, gauge, histogram};

use crate::health::state::HealthStatus;
use crate::resilience::circuit_breaker::CircuitState;

pub fn record_retry_attempt() {
    counter!("resilience_retry_attempts_total").increment(1);
}

pub fn record_retries_exhausted() {
    counter!("resilience_retries_exhausted_total").increment(1);
}

pub fn record_circuit_state(name: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("resilience_circuit_state", "breaker" => name.to_string()).set(value);
}

pub fn record_circuit_rejection(name: &str) {
    counter!("resilience_circuit_rejections_total", "breaker" => name.to_string()).increment(1);
}

pub fn record_queue_depth(depth: usize) {
    gauge!("resilience_queue_depth").set(depth as f64);
}

pub fn record_queue_replayed() {
    counter!("resilience_queue_replayed_total").increment(1);
}

pub fn record_queue_dropped() {
    counter!("resilience_queue_dropped_total").increment(1);
}

pub fn record_probe(status: HealthStatus, latency_ms: Option<u64>) {
    counter!("resilience_probe_outcomes_total", "status" => status.as_str()).increment(1);
    if let Some(latency_ms) = latency_ms {
        histogram!("resilience_probe_latency_seconds").record(latency_ms as f64 / 1_000.0);
    }
}
