//! Queued request record.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;
use uuid::Uuid;

/// A write request parked for later replay.
///
/// Created when a write fails while offline (or is proactively queued),
/// mutated only by incrementing `retry_count` on failed replays, and removed
/// on successful replay or when the retry ceiling is reached. The full queue
/// is persisted on every mutation so it survives reloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Unique id assigned at enqueue time.
    pub id: Uuid,
    pub url: Url,
    pub method: String,
    pub headers: Vec<(String, String)>,
    /// Serialized request body, if any.
    pub body: Option<String>,
    /// Enqueue time, milliseconds since the epoch.
    pub timestamp: u64,
    /// Failed replay attempts so far.
    pub retry_count: u32,
    /// Ceiling after which the request is dropped.
    pub max_retries: u32,
}

impl QueuedRequest {
    pub fn new(
        url: Url,
        method: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Option<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            method: method.into(),
            headers,
            body,
            timestamp: epoch_millis(),
            retry_count: 0,
            max_retries,
        }
    }

    /// Whether the retry ceiling has been reached.
    pub fn exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
