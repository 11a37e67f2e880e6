//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file
//!     → loader.rs (read, parse)
//!     → validation.rs (range and cross-field checks)
//!     → schema.rs types consumed by the rest of the crate
//! ```
//!
//! # Design Decisions
//! - Every section has working defaults; a missing file section is fine
//! - Validation reports all violations at once, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, HealthCheckConfig, ObservabilityConfig, OfflineQueueConfig,
    ResilienceConfig, RetryConfig,
};
