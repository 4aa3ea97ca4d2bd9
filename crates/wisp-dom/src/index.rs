//! Id Index
//!
//! Each document and shadow root maps element ids to the first element in
//! tree order carrying that id. When the indexed element for an id leaves
//! the tree, the id is remembered so the next lookup re-scans for a
//! surviving duplicate instead of reporting a miss.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::node::NodeKind;
use crate::{DomTree, NodeId};

/// Id to element map for one document or shadow root
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    map: RefCell<HashMap<String, NodeId>>,
    removed_ids: RefCell<HashSet<String>>,
}

impl IdIndex {
    /// Number of ids with a known element
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    fn get(&self, id: &str) -> Option<NodeId> {
        self.map.borrow().get(id).copied()
    }
}

impl DomTree {
    /// Document or shadow root whose index covers `node`
    pub(crate) fn index_scope(&self, node: NodeId) -> Option<NodeId> {
        let root = self.root(node);
        match self.kind(root)? {
            NodeKind::Document | NodeKind::ShadowRoot => Some(root),
            _ => None,
        }
    }

    fn index_of_scope(&self, scope: NodeId) -> Option<&IdIndex> {
        self.get(scope)?.id_index()
    }

    /// Record `element` under `id`, keeping the earliest element in tree order
    pub(crate) fn index_id_added(&self, scope: NodeId, id: &str, element: NodeId) {
        if id.is_empty() {
            return;
        }
        let Some(index) = self.index_of_scope(scope) else {
            return;
        };
        // an earlier duplicate may exist; leave it to the re-scan
        if index.removed_ids.borrow().contains(id) {
            return;
        }
        let existing = index.get(id);
        let replace = match existing {
            None => true,
            Some(current) if current == element => false,
            Some(current) => self.compare_tree_order(element, current) == Some(Ordering::Less),
        };
        if replace {
            index.map.borrow_mut().insert(id.to_string(), element);
        }
    }

    /// Forget `element` under `id`
    pub(crate) fn index_id_removed(&self, scope: NodeId, id: &str, element: NodeId) {
        let Some(index) = self.index_of_scope(scope) else {
            return;
        };
        if index.get(id) == Some(element) {
            index.map.borrow_mut().remove(id);
            index.removed_ids.borrow_mut().insert(id.to_string());
        }
    }

    pub(crate) fn index_subtree_added(&self, scope: NodeId, subtree: NodeId) {
        for n in self.inclusive_descendants(subtree) {
            if let Some(id) = self.element(n).and_then(|e| e.id()) {
                self.index_id_added(scope, id, n);
            }
        }
    }

    pub(crate) fn index_subtree_removed(&self, scope: NodeId, subtree: NodeId) {
        for n in self.inclusive_descendants(subtree) {
            if let Some(id) = self.element(n).and_then(|e| e.id()) {
                self.index_id_removed(scope, id, n);
            }
        }
    }

    fn scan_for_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root)
            .find(|&n| self.element(n).and_then(|e| e.id()) == Some(id))
    }

    /// `getElementById` on a document, shadow root or fragment
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        let Some(index) = self.index_of_scope(root) else {
            return self.scan_for_id(root, id);
        };
        if let Some(hit) = index.get(id) {
            return Some(hit);
        }
        if !index.removed_ids.borrow_mut().remove(id) {
            return None;
        }

        tracing::debug!(id, "id index re-scan");
        let found = self.scan_for_id(root, id);
        if let Some(el) = found {
            index.map.borrow_mut().insert(id.to_string(), el);
        }
        found
    }
}
