//! Integration tests for the resilience layer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use client_resilience::config::HealthCheckConfig;
use client_resilience::error::ResilienceError;
use client_resilience::health::{ConnectionMonitor, HttpProbe};
use client_resilience::resilience::{
    with_retry, with_timeout, CircuitBreakerOptions, CircuitBreakerRegistry, CircuitState,
    RetryPolicy,
};
use client_resilience::HealthStatus;

mod common;

/// Breaker timeline from a cold start: two failures open the circuit, a call
/// inside the cooldown is rejected without reaching the operation, and the
/// first call after the cooldown probes and closes on success.
#[tokio::test(start_paused = true)]
async fn test_breaker_recovery_timeline() {
    let registry = CircuitBreakerRegistry::new();
    let breaker = registry.get(
        "leads-api",
        CircuitBreakerOptions {
            failure_threshold: 2,
            success_threshold: 1,
            reset_timeout: Duration::from_millis(1_000),
        },
    );
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..2 {
        let c = calls.clone();
        let _ = breaker
            .execute(|| {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ResilienceError::Backend("503".into())) }
            })
            .await;
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // 500ms in: still cooling down, operation must not run
    tokio::time::sleep(Duration::from_millis(500)).await;
    let c = calls.clone();
    let rejected = breaker
        .execute(|| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
    assert!(matches!(rejected, Err(ResilienceError::CircuitOpen { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Past the cooldown: the call probes and, on success, closes the circuit
    tokio::time::sleep(Duration::from_millis(600)).await;
    let c = calls.clone();
    let probed = breaker
        .execute(|| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
    assert!(probed.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

/// Retry and timeout compose: each attempt is individually bounded, and the
/// retrier gives up after its attempt budget.
#[tokio::test(start_paused = true)]
async fn test_retry_of_timed_out_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let policy = RetryPolicy::default()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(10));

    let result: Result<(), _> = with_retry(
        || {
            c.fetch_add(1, Ordering::SeqCst);
            with_timeout(
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                },
                Duration::from_millis(100),
            )
        },
        &policy,
    )
    .await;

    // Timeout errors match the retry heuristic, so all attempts were used
    assert!(matches!(result, Err(ResilienceError::Timeout { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_monitor_against_http_endpoint() {
    let backend_addr: SocketAddr = "127.0.0.1:28391".parse().unwrap();
    let healthy = Arc::new(AtomicBool::new(false));
    let h = healthy.clone();
    common::serve_scripted(backend_addr, move || {
        let h = h.clone();
        async move {
            if h.load(Ordering::SeqCst) {
                common::Reply::new(200, "ok")
            } else {
                common::Reply::new(503, "down")
            }
        }
    })
    .await;

    let config = HealthCheckConfig {
        enabled: true,
        endpoint: format!("http://{backend_addr}/health"),
        interval_secs: 60,
        timeout_ms: 2_000,
        max_consecutive_failures: 3,
        healthy_latency_ms: 1_000,
    };
    let probe = Arc::new(HttpProbe::new(config.endpoint.parse().unwrap()));
    let monitor = ConnectionMonitor::new(probe, config);

    let statuses: Arc<std::sync::Mutex<Vec<HealthStatus>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = statuses.clone();
    monitor.subscribe(move |health| log.lock().unwrap().push(health.status));

    for _ in 0..3 {
        monitor.perform_health_check().await;
    }
    assert_eq!(monitor.current().status, HealthStatus::Unhealthy);
    assert_eq!(monitor.current().consecutive_failures, 3);

    healthy.store(true, Ordering::SeqCst);
    monitor.perform_health_check().await;
    let health = monitor.current();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.consecutive_failures, 0);

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            HealthStatus::Unknown, // baseline on subscribe
            HealthStatus::Degraded,
            HealthStatus::Degraded,
            HealthStatus::Unhealthy,
            HealthStatus::Healthy,
        ]
    );
}

/// A breaker in front of a real failing endpoint stops hammering it once the
/// failure threshold trips.
#[tokio::test]
async fn test_breaker_shields_failing_endpoint() {
    let backend_addr: SocketAddr = "127.0.0.1:28392".parse().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    common::serve_scripted(backend_addr, move || {
        h.fetch_add(1, Ordering::SeqCst);
        async move { common::Reply::new(500, "broken") }
    })
    .await;

    let registry = CircuitBreakerRegistry::new();
    let breaker = registry.get(
        "backend",
        CircuitBreakerOptions {
            failure_threshold: 3,
            success_threshold: 1,
            reset_timeout: Duration::from_secs(60),
        },
    );
    let client = reqwest::Client::new();
    let url = format!("http://{backend_addr}/leads");

    for _ in 0..10 {
        let client = client.clone();
        let url = url.clone();
        let _ = breaker
            .execute(|| async move {
                let response = client
                    .post(&url)
                    .send()
                    .await
                    .map_err(|e| ResilienceError::Network(e.to_string()))?;
                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(ResilienceError::Backend(response.status().to_string()))
                }
            })
            .await;
    }

    assert_eq!(breaker.state(), CircuitState::Open);
    // Only the calls before the circuit opened reached the backend
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
