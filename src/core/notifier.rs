//! Change notifier: ordered registry of identity observers
//!
//! Delivery is synchronous and in registration order. Each observer runs in
//! its own guarded scope so a panicking observer is logged and skipped.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use super::identity::Identity;

/// Callback invoked with the current identity, or `None` when disconnected.
pub type Observer = Rc<dyn Fn(Option<&Identity>)>;

struct Entry {
    id: u64,
    observer: Observer,
}

#[derive(Clone, Default)]
pub struct ObserverRegistry {
    entries: Rc<RefCell<Vec<Entry>>>,
    next_id: Rc<Cell<u64>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `observer`. The same observer may be registered more than once;
    /// each registration is delivered to and removed independently.
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push(Entry { id, observer });
        Subscription { id, entries: Rc::downgrade(&self.entries) }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Deliver `identity` to every registered observer.
    ///
    /// Iterates a snapshot, so observers may subscribe or unsubscribe from
    /// inside their callback.
    pub fn notify(&self, identity: Option<&Identity>) {
        let snapshot: Vec<(u64, Observer)> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| (entry.id, entry.observer.clone()))
            .collect();

        tracing::debug!(observers = snapshot.len(), identity = ?identity.map(Identity::as_str), "notifying identity change");
        for (id, observer) in snapshot {
            invoke_guarded(id, &observer, identity);
        }
    }
}

/// Run one observer, logging instead of unwinding through the notifier.
pub(crate) fn invoke_guarded(id: u64, observer: &Observer, identity: Option<&Identity>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer(identity)));
    if let Err(payload) = outcome {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(observer = id, %reason, "identity observer panicked");
    }
}

/// Handle returned by a subscription; removes exactly that registration.
pub struct Subscription {
    id: u64,
    entries: Weak<RefCell<Vec<Entry>>>,
}

impl Subscription {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Remove this registration. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(entries) = self.entries.upgrade() else {
            return false;
        };
        let mut entries = entries.borrow_mut();
        match entries.iter().position(|entry| entry.id == self.id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
