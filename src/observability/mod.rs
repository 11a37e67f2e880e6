//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All components produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Prometheus scrape (exporter installed by binaries)
//! ```
//!
//! # Design Decisions
//! - The library only records through the `metrics` facade; installing an
//!   exporter is the embedding application's decision
//! - Metric updates are cheap enough to call on every event

pub mod logging;
pub mod metrics;
