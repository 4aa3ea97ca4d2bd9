//! Event dispatch
//!
//! Three-phase walk over a path built once when dispatch starts:
//! capture listeners root to target, then non-capture listeners target to
//! root (the target itself is visited in both passes at `AT_TARGET`).
//! Dispatch never performs default actions; the caller reads the result.

use crate::events::{Event, EventPhase, EventTarget};
use crate::node::NodeKind;
use crate::page::Page;
use crate::{DomError, DomResult, NodeId};

struct PathItem {
    item: EventTarget,
    /// Event target as seen from `item` after retargeting
    target: EventTarget,
}

impl Page {
    /// `dispatchEvent`; returns false if a listener canceled the event
    pub fn dispatch_event(&mut self, target: EventTarget, event: &mut Event) -> DomResult<bool> {
        if event.dispatching {
            return Err(DomError::InvalidState("event is already being dispatched"));
        }
        if let Some(node) = target.as_node() {
            self.dom.node(node)?;
        }
        event.dispatching = true;

        let path = self.event_path(target, event);
        event.path = path.iter().map(|p| p.item).collect();
        tracing::trace!(event = event.event_type(), ?target, len = path.len(), "dispatch");

        for item in path.iter().rev() {
            let phase = if item.item == item.target { EventPhase::AtTarget } else { EventPhase::Capturing };
            if !self.invoke(item, event, phase, true) {
                break;
            }
        }
        if !event.stop_propagation {
            for item in &path {
                let phase = if item.item == item.target {
                    EventPhase::AtTarget
                } else if event.bubbles() {
                    EventPhase::Bubbling
                } else {
                    continue;
                };
                if !self.invoke(item, event, phase, false) {
                    break;
                }
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;
        event.path.clear();
        event.dispatching = false;
        event.stop_propagation = false;
        event.stop_immediate = false;
        let in_shadow = target
            .as_node()
            .is_some_and(|n| self.dom.kind(self.dom.root(n)) == Some(NodeKind::ShadowRoot));
        event.target = if in_shadow { None } else { Some(target) };
        Ok(!event.default_prevented())
    }

    /// Parent of `node` in the event path
    fn event_parent(&self, node: NodeId, origin: NodeId, event: &Event) -> Option<EventTarget> {
        match self.dom.kind(node)? {
            NodeKind::ShadowRoot => {
                let crosses = event.composed() || self.dom.root(origin) != node;
                if crosses { self.dom.host(node).map(EventTarget::Node) } else { None }
            }
            NodeKind::Document => {
                let to_window = node == self.document() && event.event_type() != "load";
                to_window.then_some(EventTarget::Window)
            }
            _ => self.dom.parent(node).map(EventTarget::Node),
        }
    }

    fn event_path(&self, target: EventTarget, event: &Event) -> Vec<PathItem> {
        let mut items = vec![target];
        if let Some(origin) = target.as_node() {
            let mut cur = origin;
            while let Some(next) = self.event_parent(cur, origin, event) {
                items.push(next);
                match next {
                    EventTarget::Node(n) => cur = n,
                    _ => break,
                }
            }
        }
        items
            .into_iter()
            .map(|item| PathItem { item, target: self.retarget(target, item) })
            .collect()
    }

    /// Retarget `target` against `item`: hop out of shadow trees that
    /// `item` is not inside of
    fn retarget(&self, target: EventTarget, item: EventTarget) -> EventTarget {
        let EventTarget::Node(mut node) = target else {
            return target;
        };
        loop {
            let root = self.dom.root(node);
            if self.dom.kind(root) != Some(NodeKind::ShadowRoot) {
                return EventTarget::Node(node);
            }
            if let EventTarget::Node(other) = item {
                if self.dom.is_shadow_including_inclusive_ancestor(root, other) {
                    return EventTarget::Node(node);
                }
            }
            match self.dom.host(root) {
                Some(host) => node = host,
                None => return EventTarget::Node(node),
            }
        }
    }

    /// Run the listeners of one path item; false once propagation stopped
    fn invoke(&mut self, item: &PathItem, event: &mut Event, phase: EventPhase, capture: bool) -> bool {
        if event.stop_propagation {
            return false;
        }
        event.target = Some(item.target);
        event.current_target = Some(item.item);
        event.phase = phase;

        let ty = event.event_type().to_string();
        for entry in self.events.snapshot(item.item, &ty) {
            if entry.removed.get() || entry.capture != capture {
                continue;
            }
            if entry.once {
                self.events.remove_listener_by_id(item.item, &ty, entry.id);
            }
            let Some(callback) = self.events.resolve(item.item, &entry) else {
                continue;
            };
            event.in_passive_listener = entry.passive;
            if let Err(err) = callback.handle_event(self, event) {
                tracing::error!(event = %ty, target = ?item.item, %err, "listener failed");
            }
            event.in_passive_listener = false;
            if event.stop_immediate {
                break;
            }
        }
        !event.stop_propagation
    }
}
