//! DOM Node - Compact representation
//!
//! Nodes live in the [`NodeArena`](crate::arena::NodeArena) and refer to
//! each other through [`NodeId`] handles. Parent and sibling links are
//! non-owning; the arena owns every node for the lifetime of the tree.

use crate::children::Children;
use crate::element::ElementData;
use crate::generation::Generation;
use crate::index::IdIndex;
use crate::shadow::ShadowRootData;
use crate::NodeId;

/// Numeric DOM node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

impl NodeType {
    /// `nodeType` value
    #[inline]
    pub fn value(self) -> u16 {
        self as u16
    }
}

/// Kind of node, distinguishing shadow roots from plain fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    DocumentType,
    DocumentFragment,
    ShadowRoot,
    Element,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// DOM `nodeType`; shadow roots report as fragments
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::DocumentType => NodeType::DocumentType,
            Self::DocumentFragment | Self::ShadowRoot => NodeType::DocumentFragment,
            Self::Element => NodeType::Element,
            Self::Text => NodeType::Text,
            Self::Comment => NodeType::Comment,
            Self::ProcessingInstruction => NodeType::ProcessingInstruction,
        }
    }

    /// Text, comment or processing instruction
    #[inline]
    pub fn is_character_data(self) -> bool {
        matches!(self, Self::Text | Self::Comment | Self::ProcessingInstruction)
    }

    /// Kinds that may have children
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Document | Self::DocumentFragment | Self::ShadowRoot | Self::Element
        )
    }
}

/// Document flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Html,
    Xml,
}

/// Parser quirks mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    LimitedQuirks,
    Quirks,
}

/// Document-specific data
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub(crate) kind: DocumentKind,
    pub(crate) content_type: String,
    pub(crate) url: String,
    pub(crate) quirks_mode: QuirksMode,
    pub(crate) generation: Generation,
    pub(crate) id_index: IdIndex,
}

impl DocumentData {
    pub(crate) fn new(kind: DocumentKind, url: &str) -> Self {
        let content_type = match kind {
            DocumentKind::Html => "text/html",
            DocumentKind::Xml => "application/xml",
        };
        Self {
            kind,
            content_type: content_type.to_string(),
            url: url.to_string(),
            quirks_mode: QuirksMode::NoQuirks,
            generation: Generation::INITIAL,
            id_index: IdIndex::default(),
        }
    }

    #[inline]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// Current mutation generation
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    Document(DocumentData),
    DocumentType {
        name: String,
        public_id: String,
        system_id: String,
    },
    DocumentFragment,
    ShadowRoot(ShadowRootData),
    Element(ElementData),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) owner_document: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) children: Children,
}

impl Node {
    pub(crate) fn new(data: NodeData, owner_document: NodeId) -> Self {
        Self {
            data,
            owner_document,
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            children: Children::Empty,
        }
    }

    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Document(_) => NodeKind::Document,
            NodeData::DocumentType { .. } => NodeKind::DocumentType,
            NodeData::DocumentFragment => NodeKind::DocumentFragment,
            NodeData::ShadowRoot(_) => NodeKind::ShadowRoot,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.kind().node_type()
    }

    /// `nodeName`
    pub fn node_name(&self) -> String {
        match &self.data {
            NodeData::Document(_) => "#document".into(),
            NodeData::DocumentType { name, .. } => name.clone(),
            NodeData::DocumentFragment | NodeData::ShadowRoot(_) => "#document-fragment".into(),
            NodeData::Element(el) => el.tag_name(),
            NodeData::Text(_) => "#text".into(),
            NodeData::Comment(_) => "#comment".into(),
            NodeData::ProcessingInstruction { target, .. } => target.clone(),
        }
    }

    /// Document this node belongs to; a document owns itself
    #[inline]
    pub fn owner_document(&self) -> NodeId {
        self.owner_document
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    #[inline]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first()
    }

    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.children.last()
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Get document data if this is a document
    #[inline]
    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.data {
            NodeData::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Get shadow root data if this is a shadow root
    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.data {
            NodeData::ShadowRoot(shadow) => Some(shadow),
            _ => None,
        }
    }

    /// Data of a text, comment or processing instruction
    pub fn character_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    pub(crate) fn character_data_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            NodeData::Text(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Index owned by a document or shadow root
    pub(crate) fn id_index(&self) -> Option<&IdIndex> {
        match &self.data {
            NodeData::Document(doc) => Some(&doc.id_index),
            NodeData::ShadowRoot(shadow) => Some(&shadow.id_index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Namespace;

    #[test]
    fn test_node_types() {
        let text = Node::new(NodeData::Text("hi".into()), NodeId(0));
        assert_eq!(text.node_type().value(), 3);
        assert_eq!(text.node_name(), "#text");
        assert!(text.kind().is_character_data());

        let frag = Node::new(NodeData::DocumentFragment, NodeId(0));
        assert_eq!(frag.node_type(), NodeType::DocumentFragment);
        assert!(frag.kind().is_container());
    }

    #[test]
    fn test_element_node_name() {
        let el = Node::new(
            NodeData::Element(ElementData::new(Namespace::Html, None, "section".into())),
            NodeId(0),
        );
        assert_eq!(el.node_name(), "SECTION");
        assert!(el.is_element());
        assert!(el.as_element().is_some());
    }

    #[test]
    fn test_character_data_access() {
        let pi = Node::new(
            NodeData::ProcessingInstruction { target: "xml".into(), data: "v=1".into() },
            NodeId(0),
        );
        assert_eq!(pi.character_data(), Some("v=1"));
        assert_eq!(pi.node_name(), "xml");
    }
}
