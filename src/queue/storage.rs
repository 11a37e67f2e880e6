//! Durable storage for the queue blob.
//!
//! # Responsibilities
//! - Get/set a single serialized blob so the queue survives reloads
//! - Absorb storage failures: read/write errors are logged, never fatal
//!
//! # Design Decisions
//! - The whole queue is one blob, rewritten on every mutation; acceptable
//!   for expected sizes of single-digit to low-double-digit pending items
//! - A corrupt or missing blob resets the queue to empty

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key-value persistence surface for a single serialized blob.
pub trait BlobStore: Send + Sync {
    /// Read the stored blob, or `None` if absent or unreadable.
    fn get(&self) -> Option<String>;
    /// Overwrite the stored blob. Failures are absorbed by the impl.
    fn set(&self, blob: &str);
}

/// File-backed store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlobStore for FileStore {
    fn get(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }
        match fs::read_to_string(&self.path) {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read queue blob");
                None
            }
        }
    }

    fn set(&self, blob: &str) {
        if let Err(e) = fs::write(&self.path, blob) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist queue blob");
        }
    }
}

/// In-memory store, for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the stored blob, e.g. to simulate a prior session.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl BlobStore for MemoryStore {
    fn get(&self) -> Option<String> {
        self.blob.lock().expect("store mutex poisoned").clone()
    }

    fn set(&self, blob: &str) {
        *self.blob.lock().expect("store mutex poisoned") = Some(blob.to_string());
    }
}
