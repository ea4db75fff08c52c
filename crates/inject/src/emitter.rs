//! A named-event emitter that survives misbehaving listeners

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
};

/// Callback registered for an event
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Emits named events to registered listeners.
///
/// Listeners are invoked on a snapshot of the registrations taken when the event is emitted, so a
/// listener may register or remove listeners (itself included) while being invoked. A panicking
/// listener is logged and the remaining listeners still run.
///
/// Cloning yields a handle to the same set of listeners.
pub struct EventEmitter<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

struct Registry<T> {
    next_id: u64,
    listeners: HashMap<String, Vec<Registration<T>>>,
}

struct Registration<T> {
    id: u64,
    handler: Handler<T>,
    once: bool,
}

// === impl EventEmitter ===

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(Registry { next_id: 0, listeners: HashMap::new() })) }
    }

    /// Registers `handler` for every emission of `event`
    pub fn on<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), false)
    }

    /// Registers `handler` for the next emission of `event` only
    pub fn once<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), true)
    }

    fn register(&self, event: &str, handler: Handler<T>, once: bool) -> Listener {
        let mut registry = self.inner.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.entry(event.to_string()).or_default().push(Registration {
            id,
            handler,
            once,
        });

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Listener { event: event.to_string(), id, registry: weak }
    }

    /// Removes the listener, returns whether it was still registered
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.inner.remove(&listener.event, listener.id)
    }

    /// Removes every listener of `event`
    pub fn remove_all_listeners(&self, event: &str) -> usize {
        self.inner.lock().listeners.remove(event).map(|removed| removed.len()).unwrap_or_default()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.lock().listeners.get(event).map(Vec::len).unwrap_or_default()
    }

    /// Invokes every listener of `event`, returns whether there were any
    pub fn emit(&self, event: &str, payload: &T) -> bool {
        let handlers = {
            let mut registry = self.inner.lock();
            let Some(listeners) = registry.listeners.get_mut(event) else { return false };
            let handlers = listeners.iter().map(|reg| reg.handler.clone()).collect::<Vec<_>>();
            listeners.retain(|reg| !reg.once);
            if listeners.is_empty() {
                registry.listeners.remove(event);
            }
            handlers
        };

        for handler in &handlers {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                let msg = panic
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("unknown panic");
                error!(target: "inject::emitter", event, %msg, "listener panicked");
            }
        }

        !handlers.is_empty()
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.lock();
        let mut events = registry.listeners.keys().collect::<Vec<_>>();
        events.sort();
        f.debug_struct("EventEmitter").field("events", &events).finish()
    }
}

trait RemoveListener: Send + Sync {
    fn remove(&self, event: &str, id: u64) -> bool;
}

impl<T> RemoveListener for Mutex<Registry<T>> {
    fn remove(&self, event: &str, id: u64) -> bool {
        let mut registry = self.lock();
        let Some(listeners) = registry.listeners.get_mut(event) else { return false };
        let len = listeners.len();
        listeners.retain(|reg| reg.id != id);
        let removed = listeners.len() != len;
        if listeners.is_empty() {
            registry.listeners.remove(event);
        }
        removed
    }
}

/// Handle to a single registration, see [`EventEmitter::on`]
#[derive(Clone)]
pub struct Listener {
    event: String,
    id: u64,
    registry: Weak<dyn RemoveListener>,
}

impl Listener {
    /// The event this listener is registered for
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Unregisters only this listener, returns whether it was still registered
    pub fn remove(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| registry.remove(&self.event, self.id))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("event", &self.event).field("id", &self.id).finish()
    }
}
