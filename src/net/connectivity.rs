//! Online/offline status with change notifications.

use tokio::sync::watch;

/// Shared online/offline flag.
///
/// Cloning is cheap; all clones observe the same state. Consumers that need
/// to react to transitions subscribe via [`Connectivity::watch`].
#[derive(Clone)]
pub struct Connectivity {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Create a new signal with the given initial state.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: std::sync::Arc::new(tx) }
    }

    /// Current state.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the state. No-op (and no notification) if unchanged.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            if online {
                tracing::info!("Network connection restored");
            } else {
                tracing::warn!("Network connection lost");
            }
        }
    }

    /// Subscribe to state changes.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
