//! Subscribe/notify primitives shared by namespaces, writeables and the
//! translation dictionary.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by [`Subscribeable::subscribe`].
    pub struct SubscriptionId;
}

type Callback = Rc<dyn Fn()>;

// ---------------------------------------------------------------------------
// Subscribeable
// ---------------------------------------------------------------------------

/// A set of change callbacks.
///
/// [`notify`](Self::notify) runs over a snapshot of the subscribers taken
/// before the first call, so callbacks may subscribe or unsubscribe freely.
/// A callback removed during the notification is skipped.
#[derive(Default)]
pub struct Subscribeable {
    subscribers: RefCell<SlotMap<SubscriptionId, Callback>>,
}

impl Subscribeable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared subscribeable, as held by observable values.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        self.subscribers.borrow_mut().insert(Rc::new(callback))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow_mut().remove(id).is_some()
    }

    pub fn notify(&self) {
        let snapshot: Vec<(SubscriptionId, Callback)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(id, cb)| (id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            if self.subscribers.borrow().contains_key(id) {
                callback();
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl fmt::Debug for Subscribeable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribeable")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Anything that exposes a [`Subscribeable`] for its changes.
pub trait Observable {
    fn changes(&self) -> &Rc<Subscribeable>;
}

impl Observable for Rc<Subscribeable> {
    fn changes(&self) -> &Rc<Subscribeable> {
        self
    }
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// Owns a set of subscriptions and releases them all on drop.
///
/// Sources are held weakly: a subscriber never keeps the observed value
/// alive.
#[derive(Default)]
pub struct Subscriber {
    subscriptions: Vec<(Weak<Subscribeable>, SubscriptionId)>,
}

impl Subscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_to(&mut self, source: &impl Observable, callback: impl Fn() + 'static) {
        let changes = source.changes();
        let id = changes.subscribe(callback);
        self.subscriptions.push((Rc::downgrade(changes), id));
    }

    /// Drop every subscription made through this subscriber to `source`.
    pub fn unsubscribe_from(&mut self, source: &impl Observable) {
        let target = Rc::downgrade(source.changes());
        self.subscriptions.retain(|(weak, id)| {
            if weak.ptr_eq(&target) {
                if let Some(live) = weak.upgrade() {
                    live.unsubscribe(*id);
                }
                false
            } else {
                true
            }
        });
    }

    pub fn unsubscribe_from_all(&mut self) {
        for (weak, id) in self.subscriptions.drain(..) {
            if let Some(live) = weak.upgrade() {
                live.unsubscribe(id);
            }
        }
    }

    /// Number of subscriptions currently held.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.unsubscribe_from_all();
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_notify_calls_every_subscriber() {
        let source = Subscribeable::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = Rc::clone(&hits);
            source.subscribe(move || hits.set(hits.get() + 1));
        }
        source.notify();
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let source = Subscribeable::new();
        let id = source.subscribe(|| {});
        assert_eq!(source.subscriber_count(), 1);
        assert!(source.unsubscribe(id));
        assert!(!source.unsubscribe(id));
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_callback_may_subscribe_during_notify() {
        let source = Subscribeable::shared();
        let inner = Rc::clone(&source);
        source.subscribe(move || {
            inner.subscribe(|| {});
        });
        source.notify();
        assert_eq!(source.subscriber_count(), 2);
        // The callback added during the first pass is not part of it.
        source.notify();
        assert_eq!(source.subscriber_count(), 4);
    }

    #[test]
    fn test_callback_removed_mid_notify_is_skipped() {
        let source = Subscribeable::shared();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let (src, v) = (Rc::clone(&source), Rc::clone(&victim));
        source.subscribe(move || {
            if let Some(id) = v.get() {
                src.unsubscribe(id);
            }
        });
        let h = Rc::clone(&hits);
        victim.set(Some(source.subscribe(move || h.set(h.get() + 1))));

        source.notify();
        assert_eq!(hits.get(), 0);
        assert_eq!(source.subscriber_count(), 1);
    }

    #[test]
    fn test_subscriber_releases_on_drop() {
        let source = Subscribeable::shared();
        {
            let mut sub = Subscriber::new();
            sub.subscribe_to(&source, || {});
            sub.subscribe_to(&source, || {});
            assert_eq!(sub.len(), 2);
            assert_eq!(source.subscriber_count(), 2);
        }
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_from_one_source() {
        let a = Subscribeable::shared();
        let b = Subscribeable::shared();
        let mut sub = Subscriber::new();
        sub.subscribe_to(&a, || {});
        sub.subscribe_to(&b, || {});
        sub.unsubscribe_from(&a);
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);
        assert_eq!(sub.len(), 1);
    }

    #[test]
    fn test_subscriber_outliving_source() {
        let mut sub = Subscriber::new();
        {
            let source = Subscribeable::shared();
            sub.subscribe_to(&source, || {});
        }
        sub.unsubscribe_from_all();
        assert!(sub.is_empty());
    }
}
