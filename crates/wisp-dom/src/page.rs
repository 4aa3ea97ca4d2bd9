//! Page
//!
//! A page owns one node tree and its event registry. Everything created for
//! the page lives until the page is dropped, so node and signal handles stay
//! valid for as long as the page does.

use crate::arena::ArenaLimits;
use crate::events::{EventRegistry, EventTarget, ListenerId, ListenerOptions, ListenerRef};
use crate::node::DocumentKind;
use crate::{DomResult, DomTree, NodeId};

/// Tree, listeners and signals of one browsing context
#[derive(Debug)]
pub struct Page {
    pub dom: DomTree,
    pub events: EventRegistry,
    document: NodeId,
}

impl Page {
    /// Empty page holding an HTML document at `url`
    pub fn new(limits: ArenaLimits, url: &str) -> DomResult<Self> {
        let mut dom = DomTree::with_limits(limits);
        let document = dom.create_document(DocumentKind::Html, url)?;
        Ok(Self::from_tree(dom, document))
    }

    /// Wrap an existing tree; `document` becomes the window's document
    pub fn from_tree(dom: DomTree, document: NodeId) -> Self {
        Self { dom, events: EventRegistry::default(), document }
    }

    /// Document whose parent in event paths is the window
    #[inline]
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn set_document(&mut self, document: NodeId) {
        self.document = document;
    }

    /// `addEventListener` on a node
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: ListenerRef,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        self.events.add_event_listener(EventTarget::Node(node), event_type, callback, options)
    }

    /// `removeEventListener` on a node
    pub fn remove_event_listener(&mut self, node: NodeId, event_type: &str, callback: &ListenerRef, capture: bool) -> bool {
        self.events.remove_event_listener(EventTarget::Node(node), event_type, callback, capture)
    }

    /// Number of nodes allocated for this page
    pub fn node_count(&self) -> usize {
        self.dom.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener;

    #[test]
    fn test_new_page_has_document() {
        let page = Page::new(ArenaLimits::default(), "https://example.com/").unwrap();
        let doc = page.document();
        assert_eq!(page.dom.document_url(doc), Some("https://example.com/"));
        assert_eq!(page.node_count(), 1);
    }

    #[test]
    fn test_node_listener_helpers() {
        let mut page = Page::new(ArenaLimits::default(), "about:blank").unwrap();
        let doc = page.document();
        let cb = listener(|_, _| Ok(()));
        assert!(page.add_event_listener(doc, "click", cb.clone(), ListenerOptions::default()).is_some());
        assert!(page.remove_event_listener(doc, "click", &cb, false));
    }

    #[test]
    fn test_page_limits_apply() {
        let limits = ArenaLimits { max_nodes: 1, ..Default::default() };
        let mut page = Page::new(limits, "about:blank").unwrap();
        let doc = page.document();
        let err = page.dom.create_element(doc, "div").unwrap_err();
        assert!(err.is_out_of_resources());
    }
}
