//! Synchronous publish/subscribe for typed events.
//!
//! An [`EventBus<E>`] keeps a set of observers and hands every emitted event
//! to each of them, in subscription order, on the emitting thread.
//!
//! # Reentrancy
//!
//! [`EventBus::emit`] takes a snapshot of the observer set and releases the
//! lock before calling anyone. Observers may therefore subscribe or
//! unsubscribe (themselves or others) while an event is being dispatched.
//! Such changes apply from the next `emit`: an observer removed mid-dispatch
//! still receives the current event, and one added mid-dispatch does not.
//!
//! # Example
//!
//! ```
//! use arbor_core::EventBus;
//!
//! let bus = EventBus::<u32>::new();
//! let id = bus.connect(|n| println!("got {n}"));
//! bus.emit(&7);
//! assert!(bus.unsubscribe(id));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// Identifies one observer registration on an [`EventBus`].
    pub struct SubscriptionId;
}

/// A shared observer callback.
///
/// Observer identity is the `Arc` allocation: subscribing a clone of the same
/// `Arc` twice registers it once.
pub type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A many-to-many event channel with synchronous dispatch.
///
/// `EventBus<E>` is `Send + Sync`, so it can sit behind an `Arc` and be
/// reached from inside its own observers.
pub struct EventBus<E> {
    observers: Mutex<SlotMap<SubscriptionId, Observer<E>>>,
    /// While set, `emit` drops events.
    blocked: AtomicBool,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observer_count", &self.observer_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// Create a bus with no observers.
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Register an observer.
    ///
    /// If the same observer (same `Arc` allocation) is already registered,
    /// its existing ID is returned and nothing else changes.
    pub fn subscribe(&self, observer: Observer<E>) -> SubscriptionId {
        let mut observers = self.observers.lock();
        if let Some(id) = find_observer(&observers, &observer) {
            return id;
        }
        let id = observers.insert(observer);
        tracing::trace!(target: targets::BUS, ?id, count = observers.len(), "observer subscribed");
        id
    }

    /// Register a closure as a new observer.
    ///
    /// Every call registers a distinct observer.
    pub fn connect<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(observer))
    }

    /// Remove an observer by ID.
    ///
    /// Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.observers.lock().remove(id).is_some();
        if removed {
            tracing::trace!(target: targets::BUS, ?id, "observer unsubscribed");
        }
        removed
    }

    /// Remove an observer by identity.
    pub fn unsubscribe_observer(&self, observer: &Observer<E>) -> bool {
        let mut observers = self.observers.lock();
        match find_observer(&observers, observer) {
            Some(id) => observers.remove(id).is_some(),
            None => false,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Block event delivery temporarily.
    ///
    /// While blocked, `emit` and `emit_to` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Deliver an event to every current observer.
    #[tracing::instrument(skip_all, target = "arbor_core::bus", level = "trace")]
    pub fn emit(&self, event: &E) {
        if self.is_blocked() {
            tracing::trace!(target: targets::BUS, "bus blocked, skipping emit");
            return;
        }

        let snapshot: Vec<Observer<E>> = self.observers.lock().values().cloned().collect();
        tracing::trace!(target: targets::BUS, observer_count = snapshot.len(), "emitting event");

        for observer in snapshot {
            observer(event);
        }
    }

    /// Deliver an event to a single observer.
    ///
    /// Returns `false` if the observer is not registered or the bus is blocked.
    pub fn emit_to(&self, id: SubscriptionId, event: &E) -> bool {
        if self.is_blocked() {
            return false;
        }
        let observer = self.observers.lock().get(id).cloned();
        match observer {
            Some(observer) => {
                observer(event);
                true
            }
            None => false,
        }
    }
}

fn find_observer<E>(
    observers: &SlotMap<SubscriptionId, Observer<E>>,
    observer: &Observer<E>,
) -> Option<SubscriptionId> {
    let target = Arc::as_ptr(observer) as *const ();
    observers
        .iter()
        .find(|(_, existing)| Arc::as_ptr(existing) as *const () == target)
        .map(|(id, _)| id)
}

static_assertions::assert_impl_all!(EventBus<String>: Send, Sync);
