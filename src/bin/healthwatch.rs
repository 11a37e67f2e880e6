//! Standalone connection-health watcher.
//!
//! Probes a backend health endpoint on an interval and logs every status
//! transition. Useful for watching a deployment from a shell, and as a
//! working example of wiring the monitor, config and observability stack
//! together.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use client_resilience::config::{load_config, ResilienceConfig};
use client_resilience::health::{ConnectionMonitor, HttpProbe};
use client_resilience::observability::logging;
use client_resilience::HealthStatus;

#[derive(Parser, Debug)]
#[command(name = "healthwatch", about = "Watch a backend health endpoint")]
struct Args {
    /// Path to a TOML config file. Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Health endpoint URL (overrides the config file).
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Probe interval in seconds (overrides the config file).
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.health_check.endpoint = endpoint;
    }
    if let Some(interval) = args.interval {
        config.health_check.interval_secs = interval;
    }
    config.health_check.enabled = true;

    logging::init(&config.observability);

    if config.observability.metrics_enabled {
        let addr: std::net::SocketAddr = config.observability.metrics_bind_address.parse()?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    let endpoint: url::Url = config.health_check.endpoint.parse()?;
    tracing::info!(
        endpoint = %endpoint,
        interval_secs = config.health_check.interval_secs,
        "Watching health endpoint"
    );

    let probe = Arc::new(HttpProbe::new(endpoint));
    let monitor = ConnectionMonitor::new(probe, config.health_check.clone());
    monitor.subscribe(|health| {
        let latency = health.latency_ms.map(|ms| format!("{ms}ms")).unwrap_or_else(|| "-".into());
        match health.status {
            HealthStatus::Healthy => {
                tracing::info!(status = %health.status, %latency, "Backend healthy")
            }
            HealthStatus::Unknown => {
                tracing::info!(status = %health.status, "Waiting for first probe")
            }
            _ => tracing::warn!(
                status = %health.status,
                %latency,
                failures = health.consecutive_failures,
                message = %health.message,
                "Backend degraded"
            ),
        }
    });
    monitor.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    monitor.stop();
    Ok(())
}
