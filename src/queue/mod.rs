//! Offline request queue subsystem.
//!
//! # Data Flow
//! ```text
//! Write fails while offline (or caller queues proactively):
//!     → types.rs (QueuedRequest with id, retry ceiling)
//!     → processor.rs (FIFO in-memory queue, reentrancy-guarded replay)
//!     → storage.rs (whole queue re-serialized to a blob on every mutation)
//!
//! Connectivity restored:
//!     net::Connectivity online transition
//!     → processor.rs replays head-first, linear backoff per item
//! ```
//!
//! # Design Decisions
//! - Enqueue never fails the caller; delivery is best-effort with a bounded
//!   retry ceiling per item
//! - Replay is strictly FIFO with a single in-flight item; the next item is
//!   only attempted after the head resolves (success or terminal drop)
//! - Items exceeding their retry ceiling are dropped after an error log;
//!   callers get no completion signal. An optional drop listener is the
//!   additive notification channel for callers that want one.

pub mod processor;
pub mod storage;
pub mod types;

pub use processor::{OfflineQueue, RequestTransport};
pub use storage::{BlobStore, FileStore, MemoryStore};
pub use types::QueuedRequest;
