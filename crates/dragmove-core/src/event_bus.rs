//! Ordered publish/subscribe hub.
//!
//! The bus knows nothing about gestures. It dispatches a mutable payload to
//! the listeners registered for an event name, highest priority first and in
//! registration order within a priority. Dispatch is synchronous and
//! re-entrant: a listener may fire further events or register new listeners
//! while it runs.

use crate::error::ListenerError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Priority used by [`EventBus::on`].
pub const DEFAULT_PRIORITY: i32 = 1000;

/// A listener's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Truthy result. Dispatch continues.
    Accept,
    /// Falsy cancel sentinel. Dispatch stops.
    Reject,
}

/// What a listener returns: `Ok(None)` lets dispatch continue.
pub type ListenerResult = Result<Option<Outcome>, ListenerError>;

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Rc<dyn Fn(&mut E) -> ListenerResult>;

struct Listener<E> {
    id: ListenerId,
    priority: i32,
    handler: Handler<E>,
}

struct Inner<E> {
    listeners: RefCell<HashMap<String, Vec<Listener<E>>>>,
    next_id: Cell<u64>,
}

/// Event bus shared by cloning; all clones dispatch to the same listeners.
pub struct EventBus<E> {
    inner: Rc<Inner<E>>,
}

impl<E> EventBus<E> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                listeners: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Register a listener at [`DEFAULT_PRIORITY`].
    pub fn on<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        self.on_with_priority(event, DEFAULT_PRIORITY, handler)
    }

    /// Register a listener with an explicit priority. Higher runs earlier.
    pub fn on_with_priority<F>(&self, event: &str, priority: i32, handler: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let mut listeners = self.inner.listeners.borrow_mut();
        let list = listeners.entry(event.to_string()).or_default();
        let index = list
            .iter()
            .position(|l| l.priority < priority)
            .unwrap_or(list.len());
        list.insert(
            index,
            Listener {
                id,
                priority,
                handler: Rc::new(handler),
            },
        );
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        before != list.len()
    }

    /// Check whether any listener is registered for an event.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(event)
            .is_some_and(|list| !list.is_empty())
    }

    /// Dispatch `payload` to the listeners of `event`.
    ///
    /// Returns the first result a listener produced. `Reject` stops the
    /// dispatch and is returned even after an earlier `Accept`. An error
    /// stops the dispatch as well and is returned tagged with the event name.
    pub fn fire(&self, event: &str, payload: &mut E) -> ListenerResult {
        // Snapshot so listeners can touch the bus without a live borrow.
        let handlers: Vec<Handler<E>> = match self.inner.listeners.borrow().get(event) {
            Some(list) => list.iter().map(|l| Rc::clone(&l.handler)).collect(),
            None => return Ok(None),
        };

        log::trace!("fire {} ({} listeners)", event, handlers.len());

        let mut result = None;
        for handler in handlers {
            match (*handler)(payload) {
                Ok(None) => {}
                Ok(Some(Outcome::Reject)) => return Ok(Some(Outcome::Reject)),
                Ok(Some(Outcome::Accept)) => {
                    result.get_or_insert(Outcome::Accept);
                }
                Err(err) => return Err(err.on_event(event)),
            }
        }
        Ok(result)
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.inner.listeners.borrow();
        let mut events: Vec<_> = listeners.keys().collect();
        events.sort();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}
