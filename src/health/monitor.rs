//! Periodic connection health monitoring.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::HealthCheckConfig;
use crate::health::probe::Probe;
use crate::health::state::{ConnectionHealth, HealthStatus};
use crate::observability::metrics;
use crate::queue::types::epoch_millis;
use crate::resilience::timeout::with_timeout;

type Subscriber = Arc<dyn Fn(&ConnectionHealth) + Send + Sync>;

/// Probes a health surface on a fixed interval and publishes the resulting
/// [`ConnectionHealth`] to subscribers.
///
/// The first probe runs only after one full interval, so monitoring never
/// competes with initial load; until then subscribers see an optimistic
/// Healthy placeholder. The monitor informs, it does not gate: no other
/// operation consults it before proceeding.
pub struct ConnectionMonitor {
    probe: Arc<dyn Probe>,
    config: HealthCheckConfig,
    current: ArcSwap<ConnectionHealth>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber_id: AtomicU64,
    consecutive_failures: AtomicU32,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionMonitor {
    pub fn new(probe: Arc<dyn Probe>, config: HealthCheckConfig) -> Arc<Self> {
        Arc::new(Self {
            probe,
            config,
            current: ArcSwap::from_pointee(ConnectionHealth::unknown()),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
            consecutive_failures: AtomicU32::new(0),
            task: Mutex::new(None),
        })
    }

    /// Begin periodic probing. No-op if already started or disabled.
    pub fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("Connection monitor disabled");
            return;
        }
        let mut task = self.task.lock().expect("monitor mutex poisoned");
        if task.is_some() {
            tracing::warn!("Connection monitor already running");
            return;
        }

        // Optimistic until the first probe lands; monitoring must not
        // compete with initial load for bandwidth
        self.publish(ConnectionHealth {
            status: HealthStatus::Healthy,
            last_check: epoch_millis(),
            latency_ms: None,
            consecutive_failures: 0,
            message: "initializing".to_string(),
        });

        let monitor = self.clone();
        let interval = Duration::from_secs(self.config.interval_secs);
        *task = Some(tokio::spawn(async move {
            loop {
                // First probe deliberately waits out a full interval
                tokio::time::sleep(interval).await;
                monitor.perform_health_check().await;
            }
        }));
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_ms = self.config.timeout_ms,
            "Connection monitor started"
        );
    }

    /// Cancel periodic probing. Safe to call when not started.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().expect("monitor mutex poisoned").take() {
            task.abort();
            tracing::info!("Connection monitor stopped");
        }
    }

    /// Run a single probe and publish the outcome.
    pub async fn perform_health_check(&self) {
        let started = tokio::time::Instant::now();
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let outcome = with_timeout(self.probe.check(), timeout).await;

        let health = match outcome {
            Ok(()) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.consecutive_failures.store(0, Ordering::SeqCst);
                let status = if latency_ms < self.config.healthy_latency_ms {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                };
                ConnectionHealth {
                    status,
                    last_check: epoch_millis(),
                    latency_ms: Some(latency_ms),
                    consecutive_failures: 0,
                    message: format!("probe succeeded in {latency_ms}ms"),
                }
            }
            Err(err) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                let status = if failures >= self.config.max_consecutive_failures {
                    HealthStatus::Unhealthy
                } else {
                    HealthStatus::Degraded
                };
                if status == HealthStatus::Unhealthy {
                    tracing::error!(
                        consecutive_failures = failures,
                        error = %err,
                        "Backend unreachable"
                    );
                } else {
                    tracing::warn!(
                        consecutive_failures = failures,
                        error = %err,
                        "Health probe failed"
                    );
                }
                ConnectionHealth {
                    status,
                    last_check: epoch_millis(),
                    latency_ms: None,
                    consecutive_failures: failures,
                    message: err.to_string(),
                }
            }
        };

        metrics::record_probe(health.status, health.latency_ms);
        self.publish(health);
    }

    /// Current health snapshot.
    pub fn current(&self) -> Arc<ConnectionHealth> {
        self.current.load_full()
    }

    /// Register a listener. The current value is delivered immediately so
    /// late subscribers always have a baseline.
    pub fn subscribe(&self, listener: impl Fn(&ConnectionHealth) + Send + Sync + 'static) -> u64 {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let current = self.current();
        listener(&current);
        self.subscribers
            .lock()
            .expect("monitor mutex poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers
            .lock()
            .expect("monitor mutex poisoned")
            .retain(|(sub_id, _)| *sub_id != id);
    }

    // Swap in the replacement value, then notify synchronously. Listeners
    // run against a snapshot taken with the registration lock released, so
    // a listener may subscribe or unsubscribe during delivery.
    fn publish(&self, health: ConnectionHealth) {
        self.current.store(Arc::new(health.clone()));
        let listeners: Vec<Subscriber> = self
            .subscribers
            .lock()
            .expect("monitor mutex poisoned")
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&health);
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("monitor mutex poisoned").take() {
            task.abort();
        }
    }
}
