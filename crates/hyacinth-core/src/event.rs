//! Event primitive and listener registry.
//!
//! An [`Event`] carries a type name and a cancelable "default prevented"
//! flag. Listeners are registered per type on a [`ListenerRegistry`] and
//! invoked in insertion order, followed by the single-slot `on<type>` handler
//! for the event's [`EventKind`], if one is set.
//!
//! Both listener forms, a plain closure and a shared object implementing
//! [`EventListener`], normalize to one [`Listener`] value at registration.
//! Removal compares the original registration by pointer identity.
//!
//! Any type that owns a registry exposes the `addEventListener` /
//! `removeEventListener` / `dispatchEvent` contract by implementing
//! [`EventSource`]; the upload channel and the fake request share the same
//! implementation this way.
//!
//! # Example
//!
//! ```rust
//! use hyacinth_core::{Event, EventSource, EventTarget, Listener};
//!
//! let target = EventTarget::new();
//! target.add_event_listener("ping", Listener::new(|_target, event: &Event| {
//!     event.prevent_default();
//! }));
//!
//! let prevented = target.dispatch_event(&Event::new("ping")).unwrap();
//! assert!(prevented);
//! ```

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Error a fallible listener may return.
pub type ListenerError = anyhow::Error;

/// Result returned by listeners.
pub type ListenerResult = Result<(), ListenerError>;

/// Lifecycle event kinds with a dedicated `on<type>` handler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `readystatechange`
    ReadyStateChange,
    /// `loadstart`
    LoadStart,
    /// `progress`
    Progress,
    /// `abort`
    Abort,
    /// `error`
    Error,
    /// `load`
    Load,
    /// `timeout`
    Timeout,
    /// `loadend`
    LoadEnd,
}

impl EventKind {
    /// The transfer lifecycle kinds shared by the request and its upload channel.
    pub const TRANSFER: [EventKind; 7] = [
        EventKind::Abort,
        EventKind::Error,
        EventKind::Load,
        EventKind::LoadEnd,
        EventKind::LoadStart,
        EventKind::Progress,
        EventKind::Timeout,
    ];

    /// Returns the event type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadyStateChange => "readystatechange",
            Self::LoadStart => "loadstart",
            Self::Progress => "progress",
            Self::Abort => "abort",
            Self::Error => "error",
            Self::Load => "load",
            Self::Timeout => "timeout",
            Self::LoadEnd => "loadend",
        }
    }

    /// Looks up the kind for an event type name.
    #[must_use]
    pub fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "readystatechange" => Some(Self::ReadyStateChange),
            "loadstart" => Some(Self::LoadStart),
            "progress" => Some(Self::Progress),
            "abort" => Some(Self::Abort),
            "error" => Some(Self::Error),
            "load" => Some(Self::Load),
            "timeout" => Some(Self::Timeout),
            "loadend" => Some(Self::LoadEnd),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatched event.
///
/// Created per dispatch and never reused. The only mutable part is the
/// default-prevented flag.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    default_prevented: Cell<bool>,
}

impl Event {
    /// Creates an event of the given type.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            default_prevented: Cell::new(false),
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns the lifecycle kind of this event, if it has one.
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_type(&self.event_type)
    }

    /// Marks the event's default action as prevented.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Returns true once [`prevent_default`](Self::prevent_default) was called.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind.as_str())
    }
}

/// An object that handles events delivered to a target of type `T`.
pub trait EventListener<T: ?Sized> {
    /// Handles `event`, dispatched on `target`.
    fn handle_event(&self, target: &T, event: &Event) -> ListenerResult;
}

struct FnListener<F>(F);

impl<T: ?Sized, F> EventListener<T> for FnListener<F>
where
    F: Fn(&T, &Event),
{
    fn handle_event(&self, target: &T, event: &Event) -> ListenerResult {
        (self.0)(target, event);
        Ok(())
    }
}

struct TryFnListener<F>(F);

impl<T: ?Sized, F> EventListener<T> for TryFnListener<F>
where
    F: Fn(&T, &Event) -> ListenerResult,
{
    fn handle_event(&self, target: &T, event: &Event) -> ListenerResult {
        (self.0)(target, event)
    }
}

/// A registered listener.
///
/// Cloning a `Listener` yields a handle to the same registration, so a clone
/// can later be passed to `remove_event_listener`.
pub struct Listener<T: ?Sized> {
    inner: Rc<dyn EventListener<T>>,
}

impl<T: ?Sized + 'static> Listener<T> {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &Event) + 'static,
    {
        Self {
            inner: Rc::new(FnListener(f)),
        }
    }

    /// Wraps a closure that may fail.
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&T, &Event) -> ListenerResult + 'static,
    {
        Self {
            inner: Rc::new(TryFnListener(f)),
        }
    }

    /// Wraps a shared listener object.
    ///
    /// Two listeners built from clones of the same `Rc` compare equal.
    pub fn from_handler<L>(handler: Rc<L>) -> Self
    where
        L: EventListener<T> + 'static,
    {
        Self { inner: handler }
    }
}

impl<T: ?Sized> Listener<T> {
    /// Invokes the listener.
    pub fn handle_event(&self, target: &T, event: &Event) -> ListenerResult {
        self.inner.handle_event(target, event)
    }

    /// Returns true if both values refer to the same registration.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner).cast::<()>(),
            Rc::as_ptr(&other.inner).cast::<()>(),
        )
    }
}

impl<T: ?Sized> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<T: ?Sized> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Per-target listener storage.
///
/// Holds the ordered listener sequences keyed by event type, and the
/// single-slot handlers keyed by [`EventKind`]. Dispatch works on a snapshot
/// of the listener sequence, so listeners may register further listeners
/// without invalidating the running dispatch.
pub struct ListenerRegistry<T: ?Sized> {
    listeners: RefCell<IndexMap<String, Vec<Listener<T>>>>,
    handlers: RefCell<IndexMap<EventKind, Option<Listener<T>>>>,
}

impl<T: ?Sized> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ListenerRegistry<T> {
    /// Creates an empty registry without handler slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(IndexMap::new()),
            handlers: RefCell::new(IndexMap::new()),
        }
    }

    /// Creates a registry with empty handler slots for `kinds`.
    #[must_use]
    pub fn with_handler_slots(kinds: &[EventKind]) -> Self {
        let registry = Self::new();
        registry
            .handlers
            .borrow_mut()
            .extend(kinds.iter().map(|kind| (*kind, None)));
        registry
    }

    /// Appends a listener for `event_type`. Duplicates are kept.
    pub fn add(&self, event_type: &str, listener: Listener<T>) {
        self.listeners
            .borrow_mut()
            .entry(event_type.to_string())
            .or_default()
            .push(listener);
    }

    /// Removes the first registration equal to `listener`.
    ///
    /// Returns false when nothing was registered under that identity.
    pub fn remove(&self, event_type: &str, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(registered) = listeners.get_mut(event_type) else {
            return false;
        };
        if let Some(pos) = registered.iter().position(|l| l.same_as(listener)) {
            registered.remove(pos);
            if registered.is_empty() {
                listeners.shift_remove(event_type);
            }
            return true;
        }
        false
    }

    /// Returns a snapshot of the listeners for `event_type`.
    #[must_use]
    pub fn listeners_for(&self, event_type: &str) -> Vec<Listener<T>> {
        self.listeners
            .borrow()
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of listeners registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.borrow().get(event_type).map_or(0, Vec::len)
    }

    /// Returns true if any listener or handler is registered.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.listeners.borrow().is_empty()
            || self.handlers.borrow().values().any(Option::is_some)
    }

    /// Assigns (or clears) the `on<kind>` handler.
    pub fn set_handler(&self, kind: EventKind, handler: Option<Listener<T>>) {
        self.handlers.borrow_mut().insert(kind, handler);
    }

    /// Returns the `on<kind>` handler, if assigned.
    #[must_use]
    pub fn handler(&self, kind: EventKind) -> Option<Listener<T>> {
        self.handlers.borrow().get(&kind).cloned().flatten()
    }

    /// Returns true if the `on<kind>` slot exists, assigned or not.
    #[must_use]
    pub fn has_handler_slot(&self, kind: EventKind) -> bool {
        self.handlers.borrow().contains_key(&kind)
    }

    /// Dispatches `event` to every listener, then to the `on<type>` handler.
    ///
    /// Stops at the first failing listener and returns its error. On success,
    /// returns whether `prevent_default` was called.
    pub fn dispatch(&self, target: &T, event: &Event) -> Result<bool, ListenerError> {
        for listener in self.listeners_for(event.event_type()) {
            listener.handle_event(target, event)?;
        }
        if let Some(handler) = event.kind().and_then(|kind| self.handler(kind)) {
            handler.handle_event(target, event)?;
        }
        Ok(event.default_prevented())
    }
}

impl<T: ?Sized> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let handlers = self.handlers.borrow();
        f.debug_struct("ListenerRegistry")
            .field(
                "listeners",
                &listeners
                    .iter()
                    .map(|(event_type, l)| (event_type.as_str(), l.len()))
                    .collect::<Vec<_>>(),
            )
            .field(
                "handlers",
                &handlers
                    .iter()
                    .filter(|(_, h)| h.is_some())
                    .map(|(kind, _)| kind.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The `EventTarget` contract, for any type owning a [`ListenerRegistry`].
pub trait EventSource {
    /// Returns the registry backing this target.
    fn registry(&self) -> &ListenerRegistry<Self>;

    /// Registers `listener` for `event_type`.
    fn add_event_listener(&self, event_type: &str, listener: Listener<Self>) {
        self.registry().add(event_type, listener);
    }

    /// Removes a listener previously registered for `event_type`.
    ///
    /// Removing an unregistered listener is a no-op.
    fn remove_event_listener(&self, event_type: &str, listener: &Listener<Self>) {
        self.registry().remove(event_type, listener);
    }

    /// Dispatches `event` on this target, see [`ListenerRegistry::dispatch`].
    fn dispatch_event(&self, event: &Event) -> Result<bool, ListenerError> {
        self.registry().dispatch(self, event)
    }

    /// Assigns (or clears) the `on<kind>` handler.
    fn set_handler(&self, kind: EventKind, handler: Option<Listener<Self>>) {
        self.registry().set_handler(kind, handler);
    }

    /// Returns the `on<kind>` handler, if assigned.
    fn handler(&self, kind: EventKind) -> Option<Listener<Self>> {
        self.registry().handler(kind)
    }
}

/// A standalone event target.
#[derive(Debug, Default)]
pub struct EventTarget {
    registry: ListenerRegistry<EventTarget>,
}

impl EventTarget {
    /// Creates a target with no listeners and no handler slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for EventTarget {
    fn registry(&self) -> &ListenerRegistry<Self> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Listener<EventTarget>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let make = move |key: &'static str| {
            let sink = Rc::clone(&sink);
            Listener::new(move |_: &EventTarget, _: &Event| sink.borrow_mut().push(key))
        };
        (calls, make)
    }

    #[test]
    fn test_event_kind_round_trip_names() {
        for kind in EventKind::TRANSFER {
            assert_eq!(EventKind::from_type(kind.as_str()), Some(kind));
        }
        assert_eq!(
            EventKind::from_type("readystatechange"),
            Some(EventKind::ReadyStateChange)
        );
        assert_eq!(EventKind::from_type("dummy"), None);
    }

    #[test]
    fn test_prevent_default_flag() {
        let event = Event::new("dummy");
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_registry_keeps_duplicates() {
        let (calls, make) = recorder();
        let target = EventTarget::new();
        let listener = make("a");
        target.add_event_listener("dummy", listener.clone());
        target.add_event_listener("dummy", listener);

        target.dispatch_event(&Event::new("dummy")).unwrap();

        assert_eq!(*calls.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn test_remove_only_first_duplicate() {
        let (calls, make) = recorder();
        let target = EventTarget::new();
        let listener = make("a");
        target.add_event_listener("dummy", listener.clone());
        target.add_event_listener("dummy", listener.clone());
        target.remove_event_listener("dummy", &listener);

        target.dispatch_event(&Event::new("dummy")).unwrap();

        assert_eq!(*calls.borrow(), vec!["a"]);
    }

    #[test]
    fn test_remove_unregistered_is_noop() {
        let (_calls, make) = recorder();
        let registry: ListenerRegistry<EventTarget> = ListenerRegistry::new();
        assert!(!registry.remove("dummy", &make("a")));
    }

    #[test]
    fn test_handler_runs_after_listeners() {
        let target = EventTarget::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&order);
        target.set_handler(
            EventKind::Load,
            Some(Listener::new(move |_, _| sink.borrow_mut().push("onload"))),
        );
        let sink = Rc::clone(&order);
        target.add_event_listener(
            "load",
            Listener::new(move |_, _| sink.borrow_mut().push("listener")),
        );

        target.dispatch_event(&Event::from(EventKind::Load)).unwrap();

        assert_eq!(*order.borrow(), vec!["listener", "onload"]);
    }

    #[test]
    fn test_failing_listener_stops_dispatch() {
        let (calls, make) = recorder();
        let target = EventTarget::new();
        target.add_event_listener(
            "dummy",
            Listener::try_new(|_, _| Err(anyhow::anyhow!("boom"))),
        );
        target.add_event_listener("dummy", make("after"));

        let result = target.dispatch_event(&Event::new("dummy"));

        assert!(result.is_err());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_handler_slots() {
        let registry: ListenerRegistry<EventTarget> =
            ListenerRegistry::with_handler_slots(&EventKind::TRANSFER);
        for kind in EventKind::TRANSFER {
            assert!(registry.has_handler_slot(kind));
            assert!(registry.handler(kind).is_none());
        }
        assert!(!registry.has_handler_slot(EventKind::ReadyStateChange));
        assert!(!registry.has_any());
    }
}
