//! DOM Node Operations
//!
//! Core node manipulation: appendChild, insertBefore, removeChild,
//! replaceChild, cloneNode, adoption and normalization. Validation runs to
//! completion before the first link changes, so a failed operation leaves
//! the tree untouched.

use crate::node::{NodeData, NodeKind};
use crate::{DomError, DomResult, DomTree, NodeId};

impl DomTree {
    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.pre_insert(node, parent, None)
    }

    /// Insert `node` before `child`, or append when `child` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.pre_insert(node, parent, child)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound("node is not a child of parent"));
        }
        self.remove(child);
        Ok(child)
    }

    /// `ChildNode.remove()`: detach from the parent if there is one
    pub fn remove_node(&mut self, node: NodeId) {
        self.remove(node);
    }

    /// Replace `child` with `node`, returning `child`
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: NodeId,
    ) -> DomResult<NodeId> {
        let parent_kind = self.node(parent)?.kind();
        let node_kind = self.node(node)?.kind();
        if !parent_kind.is_container() {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.is_host_including_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of parent"));
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound("node is not a child of parent"));
        }
        self.check_node_kind(parent_kind, node_kind)?;
        if parent_kind == NodeKind::Document {
            self.check_document_child(parent, node, node_kind, Some(child), true)?;
        }

        let mut reference = self.next_sibling(child);
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        self.remove(child);
        self.insert(node, parent, reference)?;
        Ok(child)
    }

    /// Remove every child of `parent`, then insert `node` if given
    pub fn replace_all(&mut self, parent: NodeId, node: Option<NodeId>) -> DomResult<()> {
        self.node(parent)?;
        if let Some(node) = node {
            self.ensure_pre_insertion_validity(node, parent, None)?;
        }
        while let Some(child) = self.first_child(parent) {
            self.remove(child);
        }
        if let Some(node) = node {
            self.insert(node, parent, None)?;
        }
        Ok(())
    }

    /// `cloneNode`
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let doc = self.node(node)?.owner_document;
        let copy = self.alloc_copy(node, doc)?;
        let is_document = self.kind(copy) == Some(NodeKind::Document);
        let target_doc = if is_document { copy } else { doc };

        if deep {
            let mut stack = vec![(node, copy)];
            while let Some((orig, dup)) = stack.pop() {
                let template = |tree: &DomTree, id| tree.element(id).and_then(|e| e.template_contents());
                if let (Some(src), Some(dst)) = (template(&*self, orig), template(&*self, dup)) {
                    stack.push((src, dst));
                }
                let children: Vec<_> = self.children(orig).collect();
                for child in children {
                    let child_copy = self.alloc_copy(child, target_doc)?;
                    self.link(child_copy, dup, None);
                    stack.push((child, child_copy));
                }
            }
        }
        if is_document {
            self.index_subtree_added(copy, copy);
        }
        Ok(copy)
    }

    /// `importNode`: clone into `doc`
    pub fn import_node(&mut self, doc: NodeId, node: NodeId, deep: bool) -> DomResult<NodeId> {
        match self.node(node)?.kind() {
            NodeKind::Document | NodeKind::ShadowRoot => {
                return Err(DomError::NotSupported("node cannot be imported".into()));
            }
            _ => {}
        }
        if self.node(doc)?.as_document().is_none() {
            return Err(DomError::InvalidNodeType("not a document"));
        }
        let copy = self.clone_node(node, deep)?;
        self.set_subtree_owner(copy, doc);
        Ok(copy)
    }

    /// `adoptNode`: detach `node` and move its subtree into `doc`
    pub fn adopt_node(&mut self, doc: NodeId, node: NodeId) -> DomResult<NodeId> {
        match self.node(node)?.kind() {
            NodeKind::Document => {
                return Err(DomError::NotSupported("documents cannot be adopted".into()));
            }
            NodeKind::ShadowRoot => {
                return Err(DomError::HierarchyRequest("shadow roots cannot be adopted"));
            }
            _ => {}
        }
        if self.node(doc)?.as_document().is_none() {
            return Err(DomError::InvalidNodeType("not a document"));
        }
        self.adopt_into(node, doc);
        Ok(node)
    }

    /// `textContent` setter
    pub fn set_text_content(&mut self, node: NodeId, value: Option<&str>) -> DomResult<()> {
        let kind = self.node(node)?.kind();
        match kind {
            NodeKind::Element | NodeKind::DocumentFragment | NodeKind::ShadowRoot => {
                let doc = self.node(node)?.owner_document;
                let text = match value.filter(|v| !v.is_empty()) {
                    Some(v) => Some(self.create_text_node(doc, v)?),
                    None => None,
                };
                self.replace_all(node, text)
            }
            k if k.is_character_data() => self.set_data(node, value.unwrap_or("")),
            _ => Ok(()),
        }
    }

    /// `normalize`: drop empty text nodes and merge adjacent ones
    pub fn normalize(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        let texts: Vec<NodeId> = self
            .descendants(node)
            .filter(|&n| self.get(n).is_some_and(|n| n.is_text()))
            .collect();

        for text in texts {
            let Some(parent) = self.parent(text) else {
                continue;
            };
            let mut length = self.node_length(text);
            if length == 0 {
                self.remove(text);
                continue;
            }

            let mut merged = String::new();
            while let Some(next) = self.next_sibling(text).filter(|&n| self.get(n).is_some_and(|n| n.is_text())) {
                let data = self.node_value(next).unwrap_or("").to_string();
                self.ranges_on_merge(text, next, parent, length);
                length += data.chars().count();
                merged.push_str(&data);
                self.remove(next);
            }
            if !merged.is_empty() {
                if let Some(data) = self.arena.get_mut(text).and_then(|n| n.character_data_mut()) {
                    data.push_str(&merged);
                }
            }
        }
        let doc = self.node(node)?.owner_document;
        self.bump_generation(doc);
        Ok(())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Like inclusive ancestry, but a shadow root's parent is its host
    pub(crate) fn is_host_including_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_shadow_including_inclusive_ancestor(ancestor, node)
    }

    fn check_node_kind(&self, parent_kind: NodeKind, node_kind: NodeKind) -> DomResult<()> {
        match node_kind {
            NodeKind::Document | NodeKind::ShadowRoot => {
                Err(DomError::HierarchyRequest("node cannot be inserted"))
            }
            NodeKind::Text if parent_kind == NodeKind::Document => {
                Err(DomError::HierarchyRequest("text cannot be a child of a document"))
            }
            NodeKind::DocumentType if parent_kind != NodeKind::Document => {
                Err(DomError::HierarchyRequest("doctype must be a child of a document"))
            }
            _ => Ok(()),
        }
    }

    /// Document child rules: one element, one doctype, doctype first
    fn check_document_child(
        &self,
        doc: NodeId,
        node: NodeId,
        node_kind: NodeKind,
        child: Option<NodeId>,
        replacing: bool,
    ) -> DomResult<()> {
        let excluded = child.filter(|_| replacing);
        let has_other = |kind: NodeKind| {
            self.children(doc)
                .any(|c| Some(c) != excluded && self.kind(c) == Some(kind))
        };
        let doctype_after = |c: NodeId| {
            std::iter::successors(self.next_sibling(c), |&n| self.next_sibling(n))
                .any(|n| self.kind(n) == Some(NodeKind::DocumentType))
        };
        let element_before = |c: NodeId| {
            std::iter::successors(self.prev_sibling(c), |&n| self.prev_sibling(n))
                .any(|n| self.is_element(n))
        };
        let child_is_doctype =
            !replacing && child.is_some_and(|c| self.kind(c) == Some(NodeKind::DocumentType));

        let invalid = match node_kind {
            NodeKind::DocumentFragment => {
                let elements = self.child_elements(node).count();
                let has_text = self.children(node).any(|c| self.kind(c) == Some(NodeKind::Text));
                elements > 1
                    || has_text
                    || (elements == 1
                        && (has_other(NodeKind::Element)
                            || child_is_doctype
                            || child.is_some_and(doctype_after)))
            }
            NodeKind::Element => {
                has_other(NodeKind::Element) || child_is_doctype || child.is_some_and(doctype_after)
            }
            NodeKind::DocumentType => {
                has_other(NodeKind::DocumentType)
                    || child.is_some_and(element_before)
                    || (child.is_none() && has_other(NodeKind::Element))
            }
            _ => false,
        };
        if invalid {
            Err(DomError::HierarchyRequest("document child constraints violated"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn ensure_pre_insertion_validity(
        &self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_kind = self.node(parent)?.kind();
        let node_kind = self.node(node)?.kind();
        if !parent_kind.is_container() {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.is_host_including_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of parent"));
        }
        if let Some(child) = child {
            if self.parent(child) != Some(parent) {
                return Err(DomError::NotFound("reference node is not a child of parent"));
            }
        }
        self.check_node_kind(parent_kind, node_kind)?;
        if parent_kind == NodeKind::Document {
            self.check_document_child(parent, node, node_kind, child, false)?;
        }
        Ok(())
    }

    pub(crate) fn pre_insert(
        &mut self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.ensure_pre_insertion_validity(node, parent, child)?;
        let mut reference = child;
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        self.insert(node, parent, reference)?;
        Ok(node)
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// Insert without validation; fragments contribute their children
    pub(crate) fn insert(
        &mut self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<()> {
        let is_fragment = self.node(node)?.kind() == NodeKind::DocumentFragment;
        let nodes: Vec<NodeId> = if is_fragment {
            self.children(node).collect()
        } else {
            vec![node]
        };
        if nodes.is_empty() {
            return Ok(());
        }
        if is_fragment {
            for &n in &nodes {
                self.remove(n);
            }
        }

        let doc = self.node(parent)?.owner_document;
        let index = match child {
            Some(c) => self.index_of(c),
            None => self.child_count(parent),
        };
        self.ranges_on_insert(parent, index, nodes.len());

        let scope = self.index_scope(parent);
        for &n in &nodes {
            self.adopt_into(n, doc);
            self.link(n, parent, child);
            if let Some(scope) = scope {
                self.index_subtree_added(scope, n);
            }
        }
        self.bump_generation(doc);
        tracing::trace!(parent = %parent, count = nodes.len(), "inserted nodes");
        Ok(())
    }

    /// Detach `node` from its parent, keeping ranges and indexes current
    pub(crate) fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let index = self.index_of(node);
        self.ranges_on_remove(node, parent, index);
        if let Some(scope) = self.index_scope(parent) {
            self.index_subtree_removed(scope, node);
        }
        self.unlink(node, parent);
        if let Some(doc) = self.owner_document(parent) {
            self.bump_generation(doc);
        }
        tracing::trace!(parent = %parent, node = %node, "removed node");
    }

    /// Detach from any parent and move the subtree to `doc`
    fn adopt_into(&mut self, node: NodeId, doc: NodeId) {
        self.remove(node);
        let old_doc = self.owner_document(node);
        if old_doc != Some(doc) {
            self.set_subtree_owner(node, doc);
            if let Some(old) = old_doc {
                self.bump_generation(old);
            }
            self.bump_generation(doc);
        }
    }

    /// Set the owner document of every shadow-including inclusive descendant
    fn set_subtree_owner(&mut self, root: NodeId, doc: NodeId) {
        let mut stack = vec![root];
        while let Some(start) = stack.pop() {
            let nodes: Vec<NodeId> = self.inclusive_descendants(start).collect();
            for n in nodes {
                if let Some(el) = self.element(n) {
                    stack.extend(el.shadow_root());
                    stack.extend(el.template_contents());
                }
                if let Some(node) = self.arena.get_mut(n) {
                    if !matches!(node.data, NodeData::Document(_)) {
                        node.owner_document = doc;
                    }
                }
            }
        }
    }

    fn link(&mut self, node: NodeId, parent: NodeId, before: Option<NodeId>) {
        let prev = match before {
            Some(b) => self.prev_sibling(b),
            None => self.last_child(parent),
        };
        if let Some(n) = self.arena.get_mut(node) {
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = before;
        }
        if let Some(p) = prev.and_then(|p| self.arena.get_mut(p)) {
            p.next_sibling = Some(node);
        }
        if let Some(b) = before.and_then(|b| self.arena.get_mut(b)) {
            b.prev_sibling = Some(node);
        }
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.inserted(node, prev, before);
        }
    }

    fn unlink(&mut self, node: NodeId, parent: NodeId) {
        let Some((prev, next)) = self.get(node).map(|n| (n.prev_sibling, n.next_sibling)) else {
            return;
        };
        if let Some(p) = prev.and_then(|p| self.arena.get_mut(p)) {
            p.next_sibling = next;
        }
        if let Some(n) = next.and_then(|n| self.arena.get_mut(n)) {
            n.prev_sibling = prev;
        }
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.removed(node, prev, next);
        }
        if let Some(n) = self.arena.get_mut(node) {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
    }
}
