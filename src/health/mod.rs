//! Connection health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (first tick after one full interval):
//!     → monitor.rs performs a bounded-timeout probe
//!     → probe.rs (generic Probe trait; HttpProbe for real endpoints)
//!     → state.rs (classify latency/failures into a ConnectionHealth value)
//!     → complete replacement value broadcast to all subscribers
//! ```
//!
//! # Design Decisions
//! - The monitor informs the UI only; it never gates other operations
//! - Probe failures are absorbed into the health state, never propagated;
//!   repeated failures emit an error-level log for observability
//! - The first probe waits a full interval so startup traffic is not
//!   competing with the probe; until then `start()` publishes an optimistic
//!   Healthy placeholder

pub mod monitor;
pub mod probe;
pub mod state;

pub use monitor::ConnectionMonitor;
pub use probe::{HttpProbe, Probe};
pub use state::{ConnectionHealth, HealthStatus};
