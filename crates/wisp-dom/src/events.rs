//! EventTarget and listener registry
//!
//! Listeners live in one page-scoped registry keyed by (target, event type)
//! instead of on each target, since most targets never get a listener.
//! Targets are identified by value ([`EventTarget`]), never by address.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::abort::{AbortSignals, SignalId};
use crate::page::Page;
use crate::{DomError, NodeId};

/// Anything that can receive events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Node(NodeId),
    Window,
    XmlHttpRequest(u32),
    AbortSignal(SignalId),
}

impl EventTarget {
    /// Stable identity packed into 56 bits: kind tag above a 32-bit index
    pub fn pack(self) -> u64 {
        let (tag, index) = match self {
            EventTarget::Node(id) => (1u64, id.to_raw()),
            EventTarget::Window => (2, 0),
            EventTarget::XmlHttpRequest(id) => (3, id),
            EventTarget::AbortSignal(id) => (4, id.to_raw()),
        };
        (tag << 32) | u64::from(index)
    }

    #[inline]
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            EventTarget::Node(id) => Some(id),
            _ => None,
        }
    }
}

impl From<NodeId> for EventTarget {
    fn from(id: NodeId) -> Self {
        EventTarget::Node(id)
    }
}

/// `eventPhase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum EventPhase {
    #[default]
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// `EventInit` dictionary
#[derive(Debug, Clone, Copy, Default)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
}

/// One event, alive for the duration of a dispatch
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    init: EventInit,
    is_trusted: bool,
    pub(crate) phase: EventPhase,
    pub(crate) target: Option<EventTarget>,
    pub(crate) current_target: Option<EventTarget>,
    pub(crate) path: Vec<EventTarget>,
    pub(crate) dispatching: bool,
    pub(crate) stop_propagation: bool,
    pub(crate) stop_immediate: bool,
    pub(crate) in_passive_listener: bool,
    canceled: bool,
}

impl Event {
    /// Untrusted event, as created by `new Event(type, init)`
    pub fn new(event_type: &str, init: EventInit) -> Self {
        Self {
            event_type: event_type.to_string(),
            init,
            is_trusted: false,
            phase: EventPhase::None,
            target: None,
            current_target: None,
            path: Vec::new(),
            dispatching: false,
            stop_propagation: false,
            stop_immediate: false,
            in_passive_listener: false,
            canceled: false,
        }
    }

    /// Event fired by the runtime itself
    pub fn new_trusted(event_type: &str, init: EventInit) -> Self {
        Self { is_trusted: true, ..Self::new(event_type, init) }
    }

    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[inline]
    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    #[inline]
    pub fn cancelable(&self) -> bool {
        self.init.cancelable
    }

    #[inline]
    pub fn composed(&self) -> bool {
        self.init.composed
    }

    #[inline]
    pub fn is_trusted(&self) -> bool {
        self.is_trusted
    }

    #[inline]
    pub fn event_phase(&self) -> EventPhase {
        self.phase
    }

    #[inline]
    pub fn target(&self) -> Option<EventTarget> {
        self.target
    }

    #[inline]
    pub fn current_target(&self) -> Option<EventTarget> {
        self.current_target
    }

    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.canceled
    }

    /// Has no effect on non-cancelable events or inside passive listeners
    pub fn prevent_default(&mut self) {
        if self.init.cancelable && !self.in_passive_listener {
            self.canceled = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.stop_propagation = true;
        self.stop_immediate = true;
    }

    #[inline]
    pub fn propagation_stopped(&self) -> bool {
        self.stop_propagation
    }

    /// Targets the event travels through, target first; empty outside dispatch
    pub fn composed_path(&self) -> &[EventTarget] {
        &self.path
    }
}

/// Failure reported by a listener; logged by the dispatcher
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Callback invoked during dispatch
pub trait EventListener {
    fn handle_event(&self, page: &mut Page, event: &mut Event) -> Result<(), ListenerError>;
}

impl<F> EventListener for F
where
    F: Fn(&mut Page, &mut Event) -> Result<(), ListenerError>,
{
    fn handle_event(&self, page: &mut Page, event: &mut Event) -> Result<(), ListenerError> {
        self(page, event)
    }
}

/// Shared listener handle; identity decides duplicates and removal
pub type ListenerRef = Rc<dyn EventListener>;

/// Wrap a closure as a listener
pub fn listener<F>(f: F) -> ListenerRef
where
    F: Fn(&mut Page, &mut Event) -> Result<(), ListenerError> + 'static,
{
    Rc::new(f)
}

fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// `addEventListener` options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
    pub signal: Option<SignalId>,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true, ..Self::default() }
    }
}

/// Registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) enum Callback {
    Listener(ListenerRef),
    /// Position holder for an `onX` handler; the callback lives in the inline table
    Inline(InlineHandler),
}

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) callback: Callback,
    pub(crate) capture: bool,
    pub(crate) once: bool,
    pub(crate) passive: bool,
    pub(crate) signal: Option<SignalId>,
    pub(crate) removed: Cell<bool>,
}

macro_rules! inline_handlers {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Well-known `onX` event handler slots
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum InlineHandler {
            $($variant),*
        }

        impl InlineHandler {
            pub fn from_event_type(event_type: &str) -> Option<Self> {
                match event_type {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn event_type(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }
        }
    };
}

inline_handlers! {
    Abort => "abort",
    Blur => "blur",
    Change => "change",
    Click => "click",
    DblClick => "dblclick",
    Error => "error",
    Focus => "focus",
    Input => "input",
    KeyDown => "keydown",
    KeyUp => "keyup",
    Load => "load",
    MouseDown => "mousedown",
    MouseUp => "mouseup",
    Reset => "reset",
    Scroll => "scroll",
    Submit => "submit",
}

impl InlineHandler {
    /// `onclick` -> `Click`
    pub fn from_attribute(name: &str) -> Option<Self> {
        name.strip_prefix("on").and_then(Self::from_event_type)
    }
}

fn inline_key(target: EventTarget, handler: InlineHandler) -> u64 {
    (target.pack() << 8) | handler as u64
}

/// Page-scoped listener registry
#[derive(Default)]
pub struct EventRegistry {
    listeners: HashMap<(EventTarget, String), Vec<Rc<ListenerEntry>>>,
    inline: HashMap<u64, ListenerRef>,
    next_id: u64,
    pub(crate) signals: AbortSignals,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("keys", &self.listeners.len())
            .field("inline", &self.inline.len())
            .field("signals", &self.signals)
            .finish()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, target: EventTarget, event_type: &str, callback: Callback, options: ListenerOptions) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        let entry = ListenerEntry {
            id,
            callback,
            capture: options.capture,
            once: options.once,
            passive: options.passive,
            signal: options.signal,
            removed: Cell::new(false),
        };
        self.listeners
            .entry((target, event_type.to_string()))
            .or_default()
            .push(Rc::new(entry));
        id
    }

    /// `addEventListener`; `None` for a duplicate or an already aborted signal
    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        event_type: &str,
        callback: ListenerRef,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        if let Some(signal) = options.signal {
            if self.signals.is_aborted(signal) {
                return None;
            }
        }
        let duplicate = self
            .listeners
            .get(&(target, event_type.to_string()))
            .is_some_and(|list| {
                list.iter().any(|e| {
                    e.capture == options.capture
                        && matches!(&e.callback, Callback::Listener(l) if same_listener(l, &callback))
                })
            });
        if duplicate {
            return None;
        }
        let id = self.push(target, event_type, Callback::Listener(callback), options);
        if let Some(signal) = options.signal {
            self.signals.link(signal, target, event_type, id);
        }
        Some(id)
    }

    /// `removeEventListener`
    pub fn remove_event_listener(
        &mut self,
        target: EventTarget,
        event_type: &str,
        callback: &ListenerRef,
        capture: bool,
    ) -> bool {
        let found = self.listeners.get(&(target, event_type.to_string())).and_then(|list| {
            list.iter().find(|e| {
                e.capture == capture && matches!(&e.callback, Callback::Listener(l) if same_listener(l, callback))
            })
            .map(|e| e.id)
        });
        found.is_some_and(|id| self.remove_listener_by_id(target, event_type, id))
    }

    /// Remove one registration; an in-flight dispatch will skip it
    pub fn remove_listener_by_id(&mut self, target: EventTarget, event_type: &str, id: ListenerId) -> bool {
        let key = (target, event_type.to_string());
        let Some(list) = self.listeners.get_mut(&key) else {
            return false;
        };
        let Some(pos) = list.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = list.remove(pos);
        entry.removed.set(true);
        if list.is_empty() {
            self.listeners.remove(&key);
        }
        if let Some(signal) = entry.signal {
            self.signals.unlink(signal, id);
        }
        true
    }

    /// Registrations for (target, type), inline placeholders included
    pub fn listener_count(&self, target: EventTarget, event_type: &str) -> usize {
        self.listeners
            .get(&(target, event_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Set or clear an `onX` handler
    ///
    /// The first set reserves the handler's position among the target's
    /// listeners; later sets replace the callback in place. Clearing drops
    /// the position.
    pub fn set_inline_handler(&mut self, target: EventTarget, handler: InlineHandler, callback: Option<ListenerRef>) {
        let key = inline_key(target, handler);
        let event_type = handler.event_type();
        let placeholder = self
            .listeners
            .get(&(target, event_type.to_string()))
            .and_then(|list| {
                list.iter()
                    .find(|e| matches!(e.callback, Callback::Inline(h) if h == handler))
                    .map(|e| e.id)
            });
        match callback {
            Some(callback) => {
                self.inline.insert(key, callback);
                if placeholder.is_none() {
                    self.push(target, event_type, Callback::Inline(handler), ListenerOptions::default());
                }
            }
            None => {
                self.inline.remove(&key);
                if let Some(id) = placeholder {
                    self.remove_listener_by_id(target, event_type, id);
                }
            }
        }
    }

    /// Current `onX` handler
    pub fn inline_handler(&self, target: EventTarget, handler: InlineHandler) -> Option<ListenerRef> {
        self.inline.get(&inline_key(target, handler)).cloned()
    }

    /// Drop every listener and inline handler of `target`
    pub fn clear_target(&mut self, target: EventTarget) {
        self.listeners.retain(|(t, _), list| {
            if *t == target {
                list.iter().for_each(|e| e.removed.set(true));
                false
            } else {
                true
            }
        });
        let packed = target.pack();
        self.inline.retain(|key, _| key >> 8 != packed);
    }

    pub(crate) fn snapshot(&self, target: EventTarget, event_type: &str) -> Vec<Rc<ListenerEntry>> {
        self.listeners
            .get(&(target, event_type.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn resolve(&self, target: EventTarget, entry: &ListenerEntry) -> Option<ListenerRef> {
        match &entry.callback {
            Callback::Listener(l) => Some(Rc::clone(l)),
            Callback::Inline(h) => self.inline_handler(target, *h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ListenerRef {
        listener(|_, _| Ok(()))
    }

    #[test]
    fn test_pack_distinguishes_kinds() {
        let a = EventTarget::Node(NodeId(3)).pack();
        let b = EventTarget::XmlHttpRequest(3).pack();
        let c = EventTarget::Window.pack();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a < 1 << 56);
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut reg = EventRegistry::new();
        let target = EventTarget::Node(NodeId(1));
        let cb = noop();
        assert!(reg.add_event_listener(target, "click", cb.clone(), ListenerOptions::default()).is_some());
        assert!(reg.add_event_listener(target, "click", cb.clone(), ListenerOptions::default()).is_none());
        assert!(reg.add_event_listener(target, "click", cb.clone(), ListenerOptions::capture()).is_some());
        assert_eq!(reg.listener_count(target, "click"), 2);
    }

    #[test]
    fn test_remove_event_listener() {
        let mut reg = EventRegistry::new();
        let target = EventTarget::Window;
        let cb = noop();
        reg.add_event_listener(target, "load", cb.clone(), ListenerOptions::default());
        assert!(!reg.remove_event_listener(target, "load", &cb, true));
        assert!(reg.remove_event_listener(target, "load", &cb, false));
        assert_eq!(reg.listener_count(target, "load"), 0);
    }

    #[test]
    fn test_removed_entry_flagged_for_snapshots() {
        let mut reg = EventRegistry::new();
        let target = EventTarget::Node(NodeId(2));
        let id = reg.add_event_listener(target, "x", noop(), ListenerOptions::default()).unwrap();
        let snapshot = reg.snapshot(target, "x");
        reg.remove_listener_by_id(target, "x", id);
        assert!(snapshot[0].removed.get());
    }

    #[test]
    fn test_inline_handler_slot() {
        let mut reg = EventRegistry::new();
        let target = EventTarget::Node(NodeId(4));
        reg.set_inline_handler(target, InlineHandler::Click, Some(noop()));
        reg.set_inline_handler(target, InlineHandler::Click, Some(noop()));
        assert_eq!(reg.listener_count(target, "click"), 1);
        assert!(reg.inline_handler(target, InlineHandler::Click).is_some());

        reg.set_inline_handler(target, InlineHandler::Click, None);
        assert_eq!(reg.listener_count(target, "click"), 0);
        assert!(reg.inline_handler(target, InlineHandler::Click).is_none());
    }

    #[test]
    fn test_inline_handler_names() {
        assert_eq!(InlineHandler::from_attribute("onclick"), Some(InlineHandler::Click));
        assert_eq!(InlineHandler::from_attribute("click"), None);
        assert_eq!(InlineHandler::Submit.event_type(), "submit");
    }

    #[test]
    fn test_prevent_default_rules() {
        let mut ev = Event::new("x", EventInit::default());
        ev.prevent_default();
        assert!(!ev.default_prevented());

        let mut ev = Event::new("x", EventInit { cancelable: true, ..Default::default() });
        ev.in_passive_listener = true;
        ev.prevent_default();
        assert!(!ev.default_prevented());
        ev.in_passive_listener = false;
        ev.prevent_default();
        assert!(ev.default_prevented());
    }

    #[test]
    fn test_clear_target() {
        let mut reg = EventRegistry::new();
        let target = EventTarget::Node(NodeId(9));
        reg.add_event_listener(target, "a", noop(), ListenerOptions::default());
        reg.set_inline_handler(target, InlineHandler::Input, Some(noop()));
        reg.clear_target(target);
        assert_eq!(reg.listener_count(target, "a"), 0);
        assert!(reg.inline_handler(target, InlineHandler::Input).is_none());
    }
}
