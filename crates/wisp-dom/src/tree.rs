//! DOM Tree - Arena-based storage
//!
//! [`DomTree`] owns the node arena together with everything that must stay
//! in step with tree mutations: live ranges, per-document selections and
//! the id indexes held by documents and shadow roots.

use std::collections::HashMap;

use crate::arena::{ArenaLimits, NodeArena};
use crate::element::{validate_name, validate_qualified_name, Attribute, ElementData, Namespace, Tag};
use crate::generation::Generation;
use crate::node::{DocumentData, DocumentKind, Node, NodeData, NodeKind, QuirksMode};
use crate::range::RangeRegistry;
use crate::selection::Selection;
use crate::{DomError, DomResult, NodeId};

/// DOM tree with arena allocation
#[derive(Debug)]
pub struct DomTree {
    pub(crate) arena: NodeArena,
    pub(crate) ranges: RangeRegistry,
    pub(crate) selections: HashMap<NodeId, Selection>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create an empty tree with default limits
    pub fn new() -> Self {
        Self::with_limits(ArenaLimits::default())
    }

    /// Create an empty tree with explicit arena limits
    pub fn with_limits(limits: ArenaLimits) -> Self {
        Self {
            arena: NodeArena::new(limits),
            ranges: RangeRegistry::default(),
            selections: HashMap::new(),
        }
    }

    /// Number of allocated nodes, attached or not
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Approximate bytes held by the arena
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    /// Get a node
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.arena.get(id).ok_or(DomError::NotFound("no such node"))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.arena.get_mut(id).ok_or(DomError::NotFound("no such node"))
    }

    pub(crate) fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    fn alloc(&mut self, owner: NodeId, data: NodeData) -> DomResult<NodeId> {
        self.arena.alloc(Node::new(data, owner))
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// Create an empty document
    pub fn create_document(&mut self, kind: DocumentKind, url: &str) -> DomResult<NodeId> {
        let id = self.alloc(NodeId(0), NodeData::Document(DocumentData::new(kind, url)))?;
        self.node_mut(id)?.owner_document = id;
        tracing::debug!(document = %id, ?kind, url, "created document");
        Ok(id)
    }

    /// Create an HTML document with `html`, `head`, optional `title` and `body`
    pub fn create_html_document(&mut self, title: Option<&str>) -> DomResult<NodeId> {
        let doc = self.create_document(DocumentKind::Html, "about:blank")?;
        let doctype = self.create_document_type(doc, "html", "", "")?;
        self.append_child(doc, doctype)?;
        let html = self.create_element(doc, "html")?;
        self.append_child(doc, html)?;
        let head = self.create_element(doc, "head")?;
        self.append_child(html, head)?;
        if let Some(title) = title {
            let title_el = self.create_element(doc, "title")?;
            self.append_child(head, title_el)?;
            let text = self.create_text_node(doc, title)?;
            self.append_child(title_el, text)?;
        }
        let body = self.create_element(doc, "body")?;
        self.append_child(html, body)?;
        Ok(doc)
    }

    fn document_kind(&self, doc: NodeId) -> DomResult<DocumentKind> {
        self.node(doc)?
            .as_document()
            .map(DocumentData::kind)
            .ok_or(DomError::InvalidNodeType("not a document"))
    }

    /// `createElement`: HTML documents lowercase the name into the HTML namespace
    pub fn create_element(&mut self, doc: NodeId, local_name: &str) -> DomResult<NodeId> {
        validate_name(local_name)?;
        let el = match self.document_kind(doc)? {
            DocumentKind::Html => {
                ElementData::new(Namespace::Html, None, local_name.to_ascii_lowercase())
            }
            DocumentKind::Xml => ElementData::new(Namespace::None, None, local_name.to_string()),
        };
        self.alloc_element(doc, el)
    }

    /// `createElementNS`
    pub fn create_element_ns(
        &mut self,
        doc: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> DomResult<NodeId> {
        let (prefix, local) = validate_qualified_name(qualified_name)?;
        self.document_kind(doc)?;
        let ns = Namespace::from_uri(namespace.unwrap_or(""));
        let el = ElementData::new(ns, prefix.map(str::to_string), local.to_string());
        self.alloc_element(doc, el)
    }

    /// Create an element from tokenizer output, skipping name validation
    pub fn create_parsed_element(
        &mut self,
        doc: NodeId,
        namespace: Namespace,
        prefix: Option<String>,
        local_name: String,
        attrs: Vec<Attribute>,
    ) -> DomResult<NodeId> {
        let mut el = ElementData::new(namespace, prefix, local_name);
        for attr in attrs {
            if el.attr(&attr.name).is_none() {
                el.attrs.push(attr);
            }
        }
        self.alloc_element(doc, el)
    }

    fn alloc_element(&mut self, doc: NodeId, mut el: ElementData) -> DomResult<NodeId> {
        if el.is(Tag::Template) {
            el.template_contents = Some(self.alloc(doc, NodeData::DocumentFragment)?);
        }
        self.alloc(doc, NodeData::Element(el))
    }

    pub fn create_text_node(&mut self, doc: NodeId, data: &str) -> DomResult<NodeId> {
        self.alloc(doc, NodeData::Text(data.to_string()))
    }

    pub fn create_comment(&mut self, doc: NodeId, data: &str) -> DomResult<NodeId> {
        self.alloc(doc, NodeData::Comment(data.to_string()))
    }

    /// `createProcessingInstruction`; data may not contain `?>`
    pub fn create_processing_instruction(
        &mut self,
        doc: NodeId,
        target: &str,
        data: &str,
    ) -> DomResult<NodeId> {
        validate_name(target)?;
        if data.contains("?>") {
            return Err(DomError::InvalidCharacter(data.to_string()));
        }
        self.alloc(
            doc,
            NodeData::ProcessingInstruction { target: target.to_string(), data: data.to_string() },
        )
    }

    pub fn create_document_type(
        &mut self,
        doc: NodeId,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> DomResult<NodeId> {
        self.alloc(
            doc,
            NodeData::DocumentType {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            },
        )
    }

    pub fn create_document_fragment(&mut self, doc: NodeId) -> DomResult<NodeId> {
        self.alloc(doc, NodeData::DocumentFragment)
    }

    pub(crate) fn alloc_shadow_root(
        &mut self,
        doc: NodeId,
        data: crate::shadow::ShadowRootData,
    ) -> DomResult<NodeId> {
        self.alloc(doc, NodeData::ShadowRoot(data))
    }

    /// Copy of a node's own data with fresh links; shadow roots cannot be copied
    pub(crate) fn alloc_copy(&mut self, id: NodeId, owner: NodeId) -> DomResult<NodeId> {
        let data = match &self.node(id)?.data {
            NodeData::ShadowRoot(_) => {
                return Err(DomError::NotSupported("shadow roots cannot be cloned".into()));
            }
            NodeData::Document(doc) => {
                let mut copy = DocumentData::new(doc.kind, &doc.url);
                copy.content_type = doc.content_type.clone();
                copy.quirks_mode = doc.quirks_mode;
                NodeData::Document(copy)
            }
            NodeData::Element(el) => {
                let mut copy = ElementData::new(el.namespace.clone(), el.prefix.clone(), el.local_name.clone());
                copy.attrs = el.attrs.clone();
                NodeData::Element(copy)
            }
            other => other.clone(),
        };
        let is_document = matches!(data, NodeData::Document(_));
        let copy = match data {
            NodeData::Element(el) => self.alloc_element(owner, el)?,
            data => self.alloc(owner, data)?,
        };
        if is_document {
            self.node_mut(copy)?.owner_document = copy;
        }
        Ok(copy)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child()
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child()
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling
    }

    #[inline]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.get(id).map_or(0, Node::child_count)
    }

    /// Document that owns `id`
    #[inline]
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(Node::owner_document)
    }

    /// Parent if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Element data of `id`
    #[inline]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    /// Iterate child nodes
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter { tree: self, next: self.first_child(id) }
    }

    /// Iterate element children
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|&c| self.is_element(c))
    }

    /// Child at `index`
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Position among siblings
    pub fn index_of(&self, id: NodeId) -> usize {
        let mut index = 0;
        let mut cur = self.prev_sibling(id);
        while let Some(prev) = cur {
            index += 1;
            cur = self.prev_sibling(prev);
        }
        index
    }

    /// Iterate ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Iterate `id` and then its ancestors
    pub fn inclusive_ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.get(id).map(|_| id) }
    }

    /// Iterate descendants in tree order, excluding `root`
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants { tree: self, root, next: self.first_child(root) }
    }

    /// Iterate `root` and its descendants in tree order
    pub fn inclusive_descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants { tree: self, root, next: self.get(root).map(|_| root) }
    }

    /// Next node in tree order without leaving `root`
    pub(crate) fn following_within(&self, node: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(node) {
            return Some(child);
        }
        let mut cur = node;
        loop {
            if cur == root {
                return None;
            }
            if let Some(next) = self.next_sibling(cur) {
                return Some(next);
            }
            cur = self.parent(cur)?;
        }
    }

    /// Whether `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.is_ancestor(ancestor, node)
    }

    /// `contains`
    #[inline]
    pub fn contains(&self, node: NodeId, other: NodeId) -> bool {
        self.is_inclusive_ancestor(node, other)
    }

    /// Root of the tree containing `id`, not crossing shadow boundaries
    pub fn root(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            cur = parent;
        }
        cur
    }

    /// Root reached by walking through shadow hosts
    pub fn shadow_including_root(&self, id: NodeId) -> NodeId {
        let mut root = self.root(id);
        while let Some(host) = self.get(root).and_then(Node::as_shadow_root).map(|s| s.host) {
            root = self.root(host);
        }
        root
    }

    /// `getRootNode({ composed })`
    pub fn get_root_node(&self, id: NodeId, composed: bool) -> NodeId {
        if composed { self.shadow_including_root(id) } else { self.root(id) }
    }

    /// Whether `ancestor` is a shadow-including inclusive ancestor of `node`
    pub fn is_shadow_including_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = match self.parent(n) {
                Some(parent) => Some(parent),
                None => self.host(n),
            };
        }
        false
    }

    /// `isConnected`
    pub fn is_connected(&self, id: NodeId) -> bool {
        let root = self.shadow_including_root(id);
        self.kind(root) == Some(NodeKind::Document)
    }

    /// DOM length: characters for character data, 0 for doctypes, else child count
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.get(id) {
            Some(node) => match node.kind() {
                NodeKind::DocumentType => 0,
                k if k.is_character_data() => {
                    node.character_data().map_or(0, |s| s.chars().count())
                }
                _ => node.child_count(),
            },
            None => 0,
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub(crate) fn document_data_mut(&mut self, doc: NodeId) -> Option<&mut DocumentData> {
        match &mut self.arena.get_mut(doc)?.data {
            NodeData::Document(data) => Some(data),
            _ => None,
        }
    }

    /// Mutation generation of the document owning `id`
    pub fn generation(&self, id: NodeId) -> Generation {
        self.owner_document(id)
            .and_then(|doc| self.get(doc))
            .and_then(Node::as_document)
            .map_or(Generation::INITIAL, DocumentData::generation)
    }

    /// Advance the mutation generation of `doc`
    pub(crate) fn bump_generation(&mut self, doc: NodeId) {
        if let Some(data) = self.document_data_mut(doc) {
            data.generation = data.generation.next();
        }
    }

    /// `documentElement`
    pub fn document_element(&self, doc: NodeId) -> Option<NodeId> {
        self.child_elements(doc).next()
    }

    /// `doctype`
    pub fn doctype(&self, doc: NodeId) -> Option<NodeId> {
        self.children(doc)
            .find(|&c| self.kind(c) == Some(NodeKind::DocumentType))
    }

    /// `head`
    pub fn head(&self, doc: NodeId) -> Option<NodeId> {
        let html = self.document_element(doc)?;
        self.child_elements(html)
            .find(|&c| self.element(c).is_some_and(|e| e.is(Tag::Head)))
    }

    /// `body`
    pub fn body(&self, doc: NodeId) -> Option<NodeId> {
        let html = self.document_element(doc)?;
        self.child_elements(html)
            .find(|&c| self.element(c).is_some_and(|e| e.is(Tag::Body) || e.local_name() == "frameset"))
    }

    /// `title`: text of the first `<title>`, whitespace collapsed
    pub fn title(&self, doc: NodeId) -> String {
        let Some(title) = self
            .descendants(doc)
            .find(|&n| self.element(n).is_some_and(|e| e.is(Tag::Title)))
        else {
            return String::new();
        };
        self.text_content(title)
            .unwrap_or_default()
            .split_ascii_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Document URL
    pub fn document_url(&self, doc: NodeId) -> Option<&str> {
        self.get(doc)?.as_document().map(DocumentData::url)
    }

    pub fn set_document_url(&mut self, doc: NodeId, url: &str) {
        if let Some(data) = self.document_data_mut(doc) {
            data.url = url.to_string();
        }
    }

    pub fn set_quirks_mode(&mut self, doc: NodeId, mode: QuirksMode) {
        if let Some(data) = self.document_data_mut(doc) {
            data.quirks_mode = mode;
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// `nodeValue`
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.character_data()
    }

    /// `textContent`: `None` for documents and doctypes
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        let node = self.get(id)?;
        match node.kind() {
            NodeKind::Document | NodeKind::DocumentType => None,
            k if k.is_character_data() => node.character_data().map(str::to_string),
            _ => {
                let mut out = String::new();
                for n in self.descendants(id) {
                    if let Some(NodeData::Text(text)) = self.get(n).map(Node::data) {
                        out.push_str(text);
                    }
                }
                Some(out)
            }
        }
    }
}

/// Child iterator
pub struct ChildIter<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Ancestor iterator
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator bounded by a subtree root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.following_within(current, self.root);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_html_document() {
        let mut tree = DomTree::new();
        let doc = tree.create_html_document(Some("  Hello   World ")).unwrap();

        let html = tree.document_element(doc).unwrap();
        assert_eq!(tree.element(html).unwrap().local_name(), "html");
        assert!(tree.head(doc).is_some());
        assert!(tree.body(doc).is_some());
        assert!(tree.doctype(doc).is_some());
        assert_eq!(tree.title(doc), "Hello World");
    }

    #[test]
    fn test_create_element_lowercases_in_html() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let el = tree.create_element(doc, "DIV").unwrap();
        assert_eq!(tree.element(el).unwrap().local_name(), "div");
        assert_eq!(tree.element(el).unwrap().tag(), Tag::Div);
        assert_eq!(tree.owner_document(el), Some(doc));
    }

    #[test]
    fn test_create_element_keeps_case_in_xml() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Xml, "about:blank").unwrap();
        let el = tree.create_element(doc, "Item").unwrap();
        assert_eq!(tree.element(el).unwrap().local_name(), "Item");
        assert_eq!(tree.element(el).unwrap().namespace(), &Namespace::None);
    }

    #[test]
    fn test_invalid_element_name() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let err = tree.create_element(doc, "no spaces").unwrap_err();
        assert_eq!(err.exception_name(), Some("InvalidCharacterError"));
    }

    #[test]
    fn test_template_has_contents() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let template = tree.create_element(doc, "template").unwrap();
        let contents = tree.element(template).unwrap().template_contents().unwrap();
        assert_eq!(tree.kind(contents), Some(NodeKind::DocumentFragment));
        assert_eq!(tree.parent(contents), None);
    }

    #[test]
    fn test_descendants_stay_in_subtree() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let a = tree.create_element(doc, "a").unwrap();
        let b = tree.create_element(doc, "b").unwrap();
        let c = tree.create_element(doc, "c").unwrap();
        let d = tree.create_element(doc, "d").unwrap();
        tree.append_child(doc, a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();
        tree.append_child(a, d).unwrap();

        let under_b: Vec<_> = tree.descendants(b).collect();
        assert_eq!(under_b, vec![c]);
        let all: Vec<_> = tree.inclusive_descendants(a).collect();
        assert_eq!(all, vec![a, b, c, d]);
    }

    #[test]
    fn test_node_length() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let text = tree.create_text_node(doc, "héllo").unwrap();
        let dt = tree.create_document_type(doc, "html", "", "").unwrap();
        assert_eq!(tree.node_length(text), 5);
        assert_eq!(tree.node_length(dt), 0);
        assert_eq!(tree.node_length(doc), 0);
    }
}
