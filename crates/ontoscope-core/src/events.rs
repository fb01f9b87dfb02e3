//! Single-threaded typed publish/subscribe.
//!
//! Every stateful entity of the editor owns one [`EventSource`] per event
//! category and hands out [`Events`] handles for subscription. An
//! [`EventObserver`] collects subscriptions from many sources and removes
//! them all at once, which is how views tear down when they are dropped.
//!
//! # Dispatch rules
//!
//! - Listeners run in subscription order.
//! - The listener list is snapshotted before dispatch: subscribing or
//!   unsubscribing from inside a listener only affects later triggers.
//! - A listener that is already running (re-entrant trigger) is skipped.
//!
//! # Examples
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use ontoscope_core::events::{EventObserver, EventSource};
//!
//! let source = EventSource::<u32>::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let mut observer = EventObserver::new();
//! let sink = Rc::clone(&seen);
//! observer.listen(&source.events(), move |value: &u32| sink.borrow_mut().push(*value));
//!
//! source.trigger(&1);
//! observer.stop_listening();
//! source.trigger(&2);
//!
//! assert_eq!(*seen.borrow(), vec![1]);
//! ```

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use log::trace;

/// Handle returned by [`Events::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Registry<E> {
    fn add(&mut self, listener: Listener<E>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }
}

/// Owner side of an event stream.
pub struct EventSource<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> EventSource<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Returns a subscription handle for this source.
    pub fn events(&self) -> Events<E> {
        Events {
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every current listener.
    pub fn trigger(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut callback) => (*callback)(event),
                Err(_) => trace!("skipping re-entrant listener"),
            }
        }
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<E: 'static> Default for EventSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}

/// Subscription side of an event stream.
///
/// Holds a weak reference: subscribing to a dropped source is a no-op.
pub struct Events<E> {
    registry: Weak<RefCell<Registry<E>>>,
}

impl<E> Clone for Events<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
        }
    }
}

impl<E: 'static> Events<E> {
    /// Subscribes `listener`; returns `None` if the source no longer exists.
    pub fn on(&self, listener: impl FnMut(&E) + 'static) -> Option<ListenerId> {
        let registry = self.registry.upgrade()?;
        let listener: Listener<E> = Rc::new(RefCell::new(listener));
        let id = registry.borrow_mut().add(listener);
        Some(id)
    }

    /// Unsubscribes a listener. Returns whether it was subscribed.
    pub fn off(&self, id: ListenerId) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow_mut().remove(id))
    }
}

/// Group of subscriptions removed together.
#[derive(Default)]
pub struct EventObserver {
    disposers: Vec<Box<dyn FnOnce()>>,
}

impl EventObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `listener` to `events` as part of this group.
    pub fn listen<E: 'static>(&mut self, events: &Events<E>, listener: impl FnMut(&E) + 'static) {
        let Some(id) = events.on(listener) else {
            return;
        };
        let events = events.clone();
        self.disposers.push(Box::new(move || {
            events.off(id);
        }));
    }

    /// Removes every subscription made through this observer.
    pub fn stop_listening(&mut self) {
        for dispose in self.disposers.drain(..) {
            dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }
}

impl Drop for EventObserver {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

impl fmt::Debug for EventObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventObserver")
            .field("subscriptions", &self.disposers.len())
            .finish()
    }
}
