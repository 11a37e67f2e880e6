//! Network-availability signal.
//!
//! # Data Flow
//! ```text
//! Platform online/offline events
//!     → connectivity.rs (watch channel, current flag)
//!     → Offline Queue (gate processing, resume on online transition)
//!     → UI / binaries (optional display)
//! ```
//!
//! # Design Decisions
//! - A single boolean with change notifications; no reachability probing
//!   here (that is the health monitor's job)
//! - Transitions are logged once, at the point of change

pub mod connectivity;

pub use connectivity::Connectivity;
