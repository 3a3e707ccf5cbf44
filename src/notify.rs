//! Payload-free change signal with callback and channel subscribers

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use parking_lot::RwLock;
use tracing::trace;

/// "Something changed". Receivers re-read whatever they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Changed;

/// Identifies a registered callback so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Observers {
    callbacks: RwLock<Vec<(ObserverId, Callback)>>,
    watchers: RwLock<Vec<UnboundedSender<Changed>>>,
    next_id: AtomicU64,
}

/// Fan-out for change notifications
///
/// Callbacks run synchronously on the thread calling [`notify`](Self::notify).
/// Channel watchers get a [`Changed`] queued at the same moment; watchers
/// whose receiver has been dropped are pruned on the next notification.
/// Clones share the same subscriber lists.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    observers: Arc<Observers>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChangeNotifier {{ callbacks: {}, watchers: {} }}",
            self.observers.callbacks.read().len(),
            self.observers.watchers.read().len()
        )
    }
}

// Identity: two notifiers are equal when they share subscriber lists.
impl PartialEq for ChangeNotifier {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.observers, &other.observers)
    }
}

impl Eq for ChangeNotifier {}

impl Hash for ChangeNotifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.observers).hash(state);
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked on every notification
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.observers.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .callbacks
            .write()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut callbacks = self.observers.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(registered, _)| *registered != id);
        callbacks.len() != before
    }

    /// Open a channel that receives one [`Changed`] per notification
    pub fn watch(&self) -> UnboundedReceiver<Changed> {
        let (sender, receiver) = unbounded();
        self.observers.watchers.write().push(sender);
        receiver
    }

    /// Signal every subscriber
    pub fn notify(&self) {
        // Snapshot so callbacks may subscribe or unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .observers
            .callbacks
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &callbacks {
            callback();
        }

        let mut watchers = self.observers.watchers.write();
        watchers.retain(|sender| sender.unbounded_send(Changed).is_ok());
        trace!(
            callbacks = callbacks.len(),
            watchers = watchers.len(),
            "Change notified"
        );
    }

    /// Number of live callbacks plus channel watchers
    pub fn observer_count(&self) -> usize {
        self.observers.callbacks.read().len() + self.observers.watchers.read().len()
    }
}
