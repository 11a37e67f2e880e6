//! FIFO replay of queued requests.

use futures_util::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::config::OfflineQueueConfig;
use crate::error::ResilienceError;
use crate::net::Connectivity;
use crate::observability::metrics;
use crate::queue::storage::BlobStore;
use crate::queue::types::QueuedRequest;

/// Sends a queued request to its destination.
pub trait RequestTransport: Send + Sync {
    fn send<'a>(&'a self, request: &'a QueuedRequest) -> BoxFuture<'a, Result<(), ResilienceError>>;
}

type DropListener = Arc<dyn Fn(&QueuedRequest) + Send + Sync>;
type ChangeListener = Arc<dyn Fn(&[QueuedRequest]) + Send + Sync>;

/// Persisted FIFO queue of outbound writes, replayed when connectivity
/// allows.
///
/// Enqueue always succeeds synchronously; delivery is best-effort with a
/// per-item retry ceiling. Requests that exhaust their ceiling are dropped
/// after an error log; the optional drop listener is the only completion
/// signal for them.
pub struct OfflineQueue {
    items: Mutex<VecDeque<QueuedRequest>>,
    store: Arc<dyn BlobStore>,
    transport: Arc<dyn RequestTransport>,
    connectivity: Connectivity,
    /// Re-entrancy guard: one logical replay at a time.
    processing: AtomicBool,
    retry_delay: Duration,
    default_max_retries: u32,
    on_drop: Mutex<Option<DropListener>>,
    listeners: Mutex<Vec<(u64, ChangeListener)>>,
    next_listener_id: AtomicU64,
}

impl OfflineQueue {
    /// Build a queue, restoring any persisted items from `store`.
    pub fn new(
        transport: Arc<dyn RequestTransport>,
        store: Arc<dyn BlobStore>,
        connectivity: Connectivity,
        config: &OfflineQueueConfig,
    ) -> Arc<Self> {
        let items = Self::restore(store.as_ref());
        metrics::record_queue_depth(items.len());
        Arc::new(Self {
            items: Mutex::new(items),
            store,
            transport,
            connectivity,
            processing: AtomicBool::new(false),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            default_max_retries: config.max_retries,
            on_drop: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        })
    }

    fn restore(store: &dyn BlobStore) -> VecDeque<QueuedRequest> {
        let Some(blob) = store.get() else {
            return VecDeque::new();
        };
        match serde_json::from_str::<Vec<QueuedRequest>>(&blob) {
            Ok(items) => {
                if !items.is_empty() {
                    tracing::info!(pending = items.len(), "Restored offline queue from storage");
                }
                items.into()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt offline queue blob, resetting to empty");
                VecDeque::new()
            }
        }
    }

    /// Register a listener invoked when a request is dropped after
    /// exhausting its retries. Additive; default behavior is a silent drop.
    pub fn set_on_drop(&self, listener: impl Fn(&QueuedRequest) + Send + Sync + 'static) {
        *self.on_drop.lock().expect("queue mutex poisoned") = Some(Arc::new(listener));
    }

    /// Register a listener invoked with the pending snapshot after every
    /// queue mutation, and immediately with the current snapshot.
    pub fn subscribe(&self, listener: impl Fn(&[QueuedRequest]) + Send + Sync + 'static) -> u64 {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        listener(&self.pending());
        self.listeners
            .lock()
            .expect("queue mutex poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.listeners
            .lock()
            .expect("queue mutex poisoned")
            .retain(|(listener_id, _)| *listener_id != id);
    }

    // Listeners run against a snapshot taken with every queue lock
    // released, so they may call back into the queue.
    fn notify_changed(&self) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .expect("queue mutex poisoned")
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.pending();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Watch for online transitions and replay automatically.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let queue = self.clone();
        let mut rx = self.connectivity.watch();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                if online {
                    queue.process_queue().await;
                }
            }
        })
    }

    /// Park a request for replay. Never fails; returns the assigned id.
    ///
    /// If the network is currently available, replay is triggered
    /// immediately in the background.
    pub fn enqueue(
        self: &Arc<Self>,
        url: Url,
        method: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> Uuid {
        let request =
            QueuedRequest::new(url, method, headers, body, self.default_max_retries);
        let id = request.id;
        let pending = {
            let mut items = self.items.lock().expect("queue mutex poisoned");
            items.push_back(request);
            self.persist(&items);
            items.len()
        };
        tracing::info!(request_id = %id, pending, "Queued request for replay");
        metrics::record_queue_depth(pending);
        self.notify_changed();

        if self.connectivity.is_online() {
            let queue = self.clone();
            tokio::spawn(async move { queue.process_queue().await });
        }
        id
    }

    /// Replay queued requests head-first.
    ///
    /// Idempotent and reentrant-safe: a call while a replay is already
    /// underway is a no-op. Stops as soon as the queue empties or the
    /// network goes offline. The head item is retried in place with linear
    /// backoff (`retry_delay * retry_count`) and dropped once it exhausts
    /// its ceiling, after which processing continues with the next item.
    pub async fn process_queue(self: &Arc<Self>) {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let _guard = ProcessingGuard(&self.processing);

        loop {
            if !self.connectivity.is_online() {
                tracing::debug!("Offline, pausing queue processing");
                break;
            }
            let head = {
                let items = self.items.lock().expect("queue mutex poisoned");
                items.front().cloned()
            };
            let Some(head) = head else { break };

            match self.transport.send(&head).await {
                Ok(()) => {
                    let pending = {
                        let mut items = self.items.lock().expect("queue mutex poisoned");
                        items.pop_front();
                        self.persist(&items);
                        items.len()
                    };
                    tracing::info!(request_id = %head.id, pending, "Replayed queued request");
                    metrics::record_queue_replayed();
                    metrics::record_queue_depth(pending);
                    self.notify_changed();
                }
                Err(err) => {
                    // Only this task pops, so the head is still ours to mutate.
                    let (dropped, retry_count) = {
                        let mut items = self.items.lock().expect("queue mutex poisoned");
                        let front = items.front_mut().expect("head vanished mid-replay");
                        front.retry_count += 1;
                        let retry_count = front.retry_count;
                        let exhausted = front.exhausted();
                        let dropped = if exhausted { items.pop_front() } else { None };
                        self.persist(&items);
                        (dropped, retry_count)
                    };

                    self.notify_changed();
                    if let Some(dropped) = dropped {
                        tracing::error!(
                            request_id = %dropped.id,
                            url = %dropped.url,
                            retries = dropped.retry_count,
                            error = %err,
                            "Dropping queued request after exhausting retries"
                        );
                        metrics::record_queue_dropped();
                        metrics::record_queue_depth(self.len());
                        // Cloned out of its slot so the listener may call
                        // back into the queue
                        let listener = self.on_drop.lock().expect("queue mutex poisoned").clone();
                        if let Some(listener) = listener {
                            listener(&dropped);
                        }
                        // Terminal failure resolved; move on to the next item.
                    } else {
                        tracing::warn!(
                            request_id = %head.id,
                            retry = retry_count,
                            error = %err,
                            "Queued request replay failed, backing off"
                        );
                        tokio::time::sleep(self.retry_delay * retry_count).await;
                    }
                }
            }
        }
    }

    /// Discard every pending request and persist the empty queue.
    pub fn clear(&self) {
        let cleared = {
            let mut items = self.items.lock().expect("queue mutex poisoned");
            let cleared = items.len();
            items.clear();
            self.persist(&items);
            cleared
        };
        if cleared > 0 {
            tracing::info!(cleared, "Cleared offline queue");
        }
        metrics::record_queue_depth(0);
        self.notify_changed();
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of pending requests, head first.
    pub fn pending(&self) -> Vec<QueuedRequest> {
        self.items
            .lock()
            .expect("queue mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    fn persist(&self, items: &VecDeque<QueuedRequest>) {
        match serde_json::to_string(items) {
            Ok(blob) => self.store.set(&blob),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize offline queue"),
        }
    }
}

struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::storage::MemoryStore;
    use std::sync::atomic::AtomicU32;

    struct FnTransport<F>(F);

    impl<F> RequestTransport for FnTransport<F>
    where
        F: Fn(&QueuedRequest) -> Result<(), ResilienceError> + Send + Sync,
    {
        fn send<'a>(
            &'a self,
            request: &'a QueuedRequest,
        ) -> BoxFuture<'a, Result<(), ResilienceError>> {
            Box::pin(async move { (self.0)(request) })
        }
    }

    fn config(max_retries: u32) -> OfflineQueueConfig {
        OfflineQueueConfig {
            max_retries,
            retry_delay_ms: 10,
            storage_path: None,
        }
    }

    fn url(path: &str) -> Url {
        format!("https://api.example.com{path}").parse().unwrap()
    }

    #[tokio::test]
    async fn test_fifo_replay_order() {
        let sent: Arc<Mutex<Vec<Uuid>>> = Arc::new(Mutex::new(Vec::new()));
        let log = sent.clone();
        let transport = Arc::new(FnTransport(move |req: &QueuedRequest| -> Result<(), ResilienceError> {
            log.lock().unwrap().push(req.id);
            Ok(())
        }));
        let conn = Connectivity::new(false);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(3));

        let ids: Vec<Uuid> = (0..3)
            .map(|i| queue.enqueue(url(&format!("/{i}")), "POST", Vec::new(), None))
            .collect();
        assert_eq!(queue.len(), 3);

        conn.set_online(true);
        queue.process_queue().await;

        assert!(queue.is_empty());
        assert_eq!(*sent.lock().unwrap(), ids);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_item_dropped_and_rest_proceed() {
        let sent: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let log = sent.clone();
        let transport = Arc::new(FnTransport(move |req: &QueuedRequest| {
            if req.url.path() == "/poison" {
                Err(ResilienceError::Backend("500".into()))
            } else {
                log.lock().unwrap().push(req.url.path().to_string());
                Ok(())
            }
        }));
        let conn = Connectivity::new(false);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(2));

        let dropped: Arc<Mutex<Vec<Uuid>>> = Arc::new(Mutex::new(Vec::new()));
        let d = dropped.clone();
        queue.set_on_drop(move |req| d.lock().unwrap().push(req.id));

        let poison_id = queue.enqueue(url("/poison"), "POST", Vec::new(), None);
        queue.enqueue(url("/ok"), "POST", Vec::new(), None);

        conn.set_online(true);
        queue.process_queue().await;

        assert!(queue.is_empty());
        assert_eq!(*sent.lock().unwrap(), vec!["/ok".to_string()]);
        assert_eq!(*dropped.lock().unwrap(), vec![poison_id]);
    }

    #[tokio::test]
    async fn test_processing_is_reentrant_safe() {
        let in_flight = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        struct SlowTransport {
            in_flight: Arc<AtomicU32>,
            max_seen: Arc<AtomicU32>,
        }
        impl RequestTransport for SlowTransport {
            fn send<'a>(
                &'a self,
                _request: &'a QueuedRequest,
            ) -> BoxFuture<'a, Result<(), ResilienceError>> {
                Box::pin(async move {
                    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            }
        }

        let transport = Arc::new(SlowTransport {
            in_flight: in_flight.clone(),
            max_seen: max_seen.clone(),
        });
        let conn = Connectivity::new(true);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn, &config(3));

        // enqueue triggers background processing; these explicit calls must
        // be no-ops while it runs
        for i in 0..4 {
            queue.enqueue(url(&format!("/{i}")), "POST", Vec::new(), None);
        }
        tokio::join!(queue.process_queue(), queue.process_queue());

        // Wait out any background task spawned by enqueue
        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1, "replays overlapped");
    }

    #[tokio::test]
    async fn test_processing_stops_when_offline() {
        let conn = Connectivity::new(false);
        let sender_conn = conn.clone();
        let transport = Arc::new(FnTransport(move |_req: &QueuedRequest| -> Result<(), ResilienceError> {
            // Connection drops mid-replay
            sender_conn.set_online(false);
            Ok(())
        }));
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(3));

        queue.enqueue(url("/1"), "POST", Vec::new(), None);
        queue.enqueue(url("/2"), "POST", Vec::new(), None);

        conn.set_online(true);
        queue.process_queue().await;

        // First replay succeeded, second never attempted
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_queue_survives_restart() {
        let store = Arc::new(MemoryStore::new());
        let conn = Connectivity::new(false);
        let transport = Arc::new(FnTransport(|_: &QueuedRequest| -> Result<(), ResilienceError> { Ok(()) }));

        let queue = OfflineQueue::new(transport.clone(), store.clone(), conn.clone(), &config(3));
        let id = queue.enqueue(url("/persisted"), "POST", Vec::new(), Some("{}".into()));
        drop(queue);

        let restored = OfflineQueue::new(transport, store, conn, &config(3));
        let pending = restored.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].url.path(), "/persisted");
    }

    #[tokio::test]
    async fn test_corrupt_blob_resets_to_empty() {
        let store = Arc::new(MemoryStore::with_blob("not json {{{"));
        let conn = Connectivity::new(true);
        let transport = Arc::new(FnTransport(|_: &QueuedRequest| -> Result<(), ResilienceError> { Ok(()) }));
        let queue = OfflineQueue::new(transport, store, conn, &config(3));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_drop_listener_may_replace_itself() {
        let transport = Arc::new(FnTransport(|_: &QueuedRequest| -> Result<(), ResilienceError> {
            Err(ResilienceError::Backend("500".into()))
        }));
        let conn = Connectivity::new(false);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(1));

        // One-shot alert: the listener detaches itself on the first drop
        let drops = Arc::new(AtomicU32::new(0));
        let d = drops.clone();
        let q = queue.clone();
        queue.set_on_drop(move |_req| {
            d.fetch_add(1, Ordering::SeqCst);
            q.set_on_drop(|_: &QueuedRequest| {});
        });

        queue.enqueue(url("/a"), "POST", Vec::new(), None);
        queue.enqueue(url("/b"), "POST", Vec::new(), None);

        conn.set_online(true);
        queue.process_queue().await;

        assert!(queue.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_discards_pending_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let conn = Connectivity::new(false);
        let transport = Arc::new(FnTransport(|_: &QueuedRequest| -> Result<(), ResilienceError> { Ok(()) }));

        let queue = OfflineQueue::new(transport.clone(), store.clone(), conn.clone(), &config(3));
        queue.enqueue(url("/a"), "POST", Vec::new(), None);
        queue.enqueue(url("/b"), "POST", Vec::new(), None);
        queue.clear();
        assert!(queue.is_empty());

        // The empty queue is what restores after a restart
        let restored = OfflineQueue::new(transport, store, conn, &config(3));
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn test_change_listener_sees_every_mutation() {
        let transport = Arc::new(FnTransport(|_: &QueuedRequest| -> Result<(), ResilienceError> { Ok(()) }));
        let conn = Connectivity::new(false);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(3));

        let depths: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let log = depths.clone();
        let id = queue.subscribe(move |pending| log.lock().unwrap().push(pending.len()));

        queue.enqueue(url("/a"), "POST", Vec::new(), None);
        queue.enqueue(url("/b"), "POST", Vec::new(), None);
        conn.set_online(true);
        queue.process_queue().await;

        // Immediate snapshot, two enqueues, two successful replays
        assert_eq!(*depths.lock().unwrap(), vec![0, 1, 2, 1, 0]);

        queue.unsubscribe(id);
        queue.enqueue(url("/c"), "POST", Vec::new(), None);
        assert_eq!(depths.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_online_transition_triggers_replay() {
        let sent = Arc::new(AtomicU32::new(0));
        let s = sent.clone();
        let transport = Arc::new(FnTransport(move |_: &QueuedRequest| -> Result<(), ResilienceError> {
            s.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        let conn = Connectivity::new(false);
        let queue = OfflineQueue::new(transport, Arc::new(MemoryStore::new()), conn.clone(), &config(3));
        let watcher = queue.start();

        queue.enqueue(url("/a"), "POST", Vec::new(), None);
        queue.enqueue(url("/b"), "POST", Vec::new(), None);
        assert_eq!(sent.load(Ordering::SeqCst), 0);

        conn.set_online(true);
        tokio::time::timeout(Duration::from_secs(1), async {
            while !queue.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("queue never drained");
        assert_eq!(sent.load(Ordering::SeqCst), 2);
        watcher.abort();
    }
}
