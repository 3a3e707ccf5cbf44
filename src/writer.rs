//! Write dispatch for settings
//!
//! Writes go through a single FIFO per [`Defaults`](crate::Defaults) handle.
//! In background mode one tokio task drains the queue, so the caller never
//! waits on the store and writes land in the order they were issued.
//! Until a queued write has been applied, reads through the same handle see
//! it from the pending overlay.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::store::KeyValueStore;
use crate::value::StoredValue;

/// When writes reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Queued and applied by a background task (fire-and-forget)
    Background,
    /// Applied on the caller's thread before `set`/`reset` return
    Immediate,
}

impl WritePolicy {
    /// `Background` inside a tokio runtime, `Immediate` otherwise
    pub fn detect() -> Self {
        if Handle::try_current().is_ok() {
            WritePolicy::Background
        } else {
            WritePolicy::Immediate
        }
    }
}

/// Latest queued-but-unapplied write per key. `None` is a pending removal.
#[derive(Debug, Default)]
struct Pending {
    next_seq: u64,
    entries: HashMap<String, (u64, Option<StoredValue>)>,
}

impl Pending {
    fn record(&mut self, key: &str, value: Option<StoredValue>) -> u64 {
        self.next_seq += 1;
        self.entries.insert(key.to_string(), (self.next_seq, value));
        self.next_seq
    }

    // Only the most recent write for a key clears its entry.
    fn settle(&mut self, key: &str, seq: u64) {
        if self.entries.get(key).is_some_and(|(latest, _)| *latest == seq) {
            self.entries.remove(key);
        }
    }
}

pub(crate) enum WriteOp {
    Set {
        key: String,
        value: StoredValue,
        seq: u64,
    },
    Remove {
        key: String,
        seq: u64,
    },
    Flush(oneshot::Sender<()>),
}

impl fmt::Debug for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Set { key, value, seq } => {
                write!(f, "Set#{}({}, {})", seq, key, value.kind())
            }
            WriteOp::Remove { key, seq } => write!(f, "Remove#{}({})", seq, key),
            WriteOp::Flush(_) => write!(f, "Flush"),
        }
    }
}

impl WriteOp {
    fn new(key: &str, value: Option<StoredValue>, seq: u64) -> Self {
        let key = key.to_string();
        match value {
            Some(value) => WriteOp::Set { key, value, seq },
            None => WriteOp::Remove { key, seq },
        }
    }

    /// Apply to the store. Returns the pending entry to settle, if any.
    fn apply(self, store: &dyn KeyValueStore) -> Option<(String, u64)> {
        match self {
            WriteOp::Set { key, value, seq } => {
                let kind = value.kind();
                match store.set(&key, value) {
                    Ok(()) => debug!(key = %key, kind, "Stored value"),
                    Err(e) => warn!(key = %key, error = %e, "Dropped write"),
                }
                Some((key, seq))
            }
            WriteOp::Remove { key, seq } => {
                match store.remove(&key) {
                    Ok(()) => debug!(key = %key, "Removed value"),
                    Err(e) => warn!(key = %key, error = %e, "Dropped removal"),
                }
                Some((key, seq))
            }
            WriteOp::Flush(done) => {
                let _ = done.send(());
                None
            }
        }
    }
}

#[derive(Clone)]
pub(crate) struct WriteQueue {
    store: Arc<dyn KeyValueStore>,
    pending: Arc<Mutex<Pending>>,
    sender: Option<mpsc::UnboundedSender<WriteOp>>,
}

impl fmt::Debug for WriteQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WriteQueue {{ policy: {:?}, pending: {} }}",
            self.policy(),
            self.pending.lock().entries.len()
        )
    }
}

impl WriteQueue {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, policy: WritePolicy) -> Self {
        let pending = Arc::new(Mutex::new(Pending::default()));
        let sender = match (policy, Handle::try_current()) {
            (WritePolicy::Background, Ok(handle)) => {
                let (sender, receiver) = mpsc::unbounded_channel();
                handle.spawn(drain(receiver, Arc::clone(&store), Arc::clone(&pending)));
                Some(sender)
            }
            (WritePolicy::Background, Err(_)) => {
                warn!("No tokio runtime available, writing defaults synchronously");
                None
            }
            (WritePolicy::Immediate, _) => None,
        };

        Self {
            store,
            pending,
            sender,
        }
    }

    pub(crate) fn policy(&self) -> WritePolicy {
        if self.sender.is_some() {
            WritePolicy::Background
        } else {
            WritePolicy::Immediate
        }
    }

    pub(crate) fn set(&self, key: &str, value: StoredValue) {
        self.enqueue(key, Some(value));
    }

    pub(crate) fn remove(&self, key: &str) {
        self.enqueue(key, None);
    }

    /// Queued state of `key`: `Some(None)` for a pending removal, `None`
    /// when nothing is in flight.
    pub(crate) fn pending(&self, key: &str) -> Option<Option<StoredValue>> {
        self.pending
            .lock()
            .entries
            .get(key)
            .map(|(_, value)| value.clone())
    }

    /// Keys with an in-flight write, each with whether it will exist afterwards
    pub(crate) fn pending_keys(&self) -> Vec<(String, bool)> {
        self.pending
            .lock()
            .entries
            .iter()
            .map(|(key, (_, value))| (key.clone(), value.is_some()))
            .collect()
    }

    // The pending lock is held until the op is queued or applied, so the
    // order of sequence numbers is the order writes reach the store.
    fn enqueue(&self, key: &str, value: Option<StoredValue>) {
        let mut pending = self.pending.lock();
        let seq = pending.record(key, value.clone());
        let op = WriteOp::new(key, value, seq);

        let op = match &self.sender {
            Some(sender) => match sender.send(op) {
                Ok(()) => return,
                // The runtime that owned the drain task is gone; nothing
                // queued before this op can still be applied.
                Err(mpsc::error::SendError(op)) => {
                    debug!(?op, "Write queue closed, applying inline");
                    op
                }
            },
            None => op,
        };

        if let Some((key, seq)) = op.apply(self.store.as_ref()) {
            pending.settle(&key, seq);
        }
    }

    pub(crate) async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };

        let (done, wait) = oneshot::channel();
        // A closed queue drops `done`, which ends the wait.
        let _ = sender.send(WriteOp::Flush(done));
        let _ = wait.await;
    }
}

async fn drain(
    mut receiver: mpsc::UnboundedReceiver<WriteOp>,
    store: Arc<dyn KeyValueStore>,
    pending: Arc<Mutex<Pending>>,
) {
    while let Some(op) = receiver.recv().await {
        if let Some((key, seq)) = op.apply(store.as_ref()) {
            pending.lock().settle(&key, seq);
        }
    }
    debug!("Write queue closed");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{WritePolicy, WriteQueue};
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::value::StoredValue;

    fn queue(policy: WritePolicy) -> (Arc<dyn KeyValueStore>, WriteQueue) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let queue = WriteQueue::new(Arc::clone(&store), policy);
        (store, queue)
    }

    #[test]
    fn test_detect_outside_runtime() {
        assert_eq!(WritePolicy::detect(), WritePolicy::Immediate);
    }

    #[test]
    fn test_background_without_runtime_falls_back() {
        let (store, queue) = queue(WritePolicy::Background);
        assert_eq!(queue.policy(), WritePolicy::Immediate);

        queue.set("launchCount", StoredValue::Integer(1));
        assert_eq!(store.get("launchCount"), Some(StoredValue::Integer(1)));
        assert_eq!(queue.pending("launchCount"), None);
    }

    #[tokio::test]
    async fn test_background_applies_in_issue_order() {
        let (store, queue) = queue(WritePolicy::Background);
        assert_eq!(queue.policy(), WritePolicy::Background);

        for value in 0..50 {
            queue.set("launchCount", StoredValue::Integer(value));
        }
        queue.remove("launchCount");
        queue.set("launchCount", StoredValue::Integer(99));
        queue.flush().await;

        assert_eq!(store.get("launchCount"), Some(StoredValue::Integer(99)));
        assert!(queue.pending_keys().is_empty());
    }

    #[tokio::test]
    async fn test_pending_overlay_until_applied() {
        let (store, queue) = queue(WritePolicy::Background);

        queue.set("username", StoredValue::String("Alice".to_string()));
        // the drain task has not run yet on this single-threaded runtime
        assert_eq!(store.get("username"), None);
        assert_eq!(
            queue.pending("username"),
            Some(Some(StoredValue::String("Alice".to_string())))
        );

        queue.remove("username");
        assert_eq!(queue.pending("username"), Some(None));
        assert_eq!(queue.pending_keys(), vec![("username".to_string(), false)]);

        queue.flush().await;
        assert_eq!(queue.pending("username"), None);
        assert_eq!(store.get("username"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writers_agree_with_overlay() {
        let (store, queue) = queue(WritePolicy::Background);

        std::thread::scope(|scope| {
            for writer in 0..4i64 {
                let queue = &queue;
                scope.spawn(move || {
                    for step in 0..200 {
                        queue.set("volume", StoredValue::Integer(writer * 1000 + step));
                    }
                });
            }
        });

        // Whatever the overlay reports as latest is what the store ends with.
        let latest = match queue.pending("volume") {
            Some(queued) => queued,
            None => store.get("volume"),
        };
        queue.flush().await;

        assert!(latest.is_some());
        assert_eq!(store.get("volume"), latest);
        assert_eq!(queue.pending("volume"), None);
    }

    #[test]
    fn test_concurrent_immediate_writers_settle() {
        let (store, queue) = queue(WritePolicy::Immediate);

        std::thread::scope(|scope| {
            for writer in 0..4i64 {
                let queue = &queue;
                scope.spawn(move || {
                    for step in 0..100 {
                        queue.set("launchCount", StoredValue::Integer(writer * 1000 + step));
                    }
                });
            }
        });

        assert!(queue.pending_keys().is_empty());
        let stored = store.get("launchCount").and_then(|value| value.as_integer());
        assert!(stored.is_some_and(|value| value % 1000 == 99));
    }

    #[tokio::test]
    async fn test_flush_immediate_is_noop() {
        let (store, queue) = queue(WritePolicy::Immediate);

        queue.set("launchCount", StoredValue::Integer(5));
        queue.flush().await;
        assert_eq!(store.get("launchCount"), Some(StoredValue::Integer(5)));
    }
}
