//! Live Collections
//!
//! `HTMLCollection` and `NodeList` views over the tree. A live collection
//! remembers the owning document's generation when it last materialized its
//! members; repeated reads with no intervening mutation reuse that result.

use std::cell::RefCell;

use crate::element::{ElementData, Namespace, Tag};
use crate::generation::Cached;
use crate::{DomTree, NodeId};

/// Element name match for `getElementsByTagName`
#[derive(Debug, Clone)]
pub struct TagMatcher {
    qualified: String,
    lowercase: String,
    tag: Tag,
}

impl TagMatcher {
    pub fn new(qualified_name: &str) -> Self {
        let lowercase = qualified_name.to_ascii_lowercase();
        Self {
            tag: Tag::from_local_name(&lowercase),
            qualified: qualified_name.to_string(),
            lowercase,
        }
    }

    fn matches(&self, el: &ElementData) -> bool {
        if self.qualified == "*" {
            return true;
        }
        if el.namespace() == &Namespace::Html {
            if self.tag != Tag::Other && el.prefix().is_none() {
                return el.tag() == self.tag;
            }
            el.qualified_name() == self.lowercase
        } else {
            el.qualified_name() == self.qualified
        }
    }
}

/// Membership test for a collection
#[derive(Debug, Clone)]
pub enum CollectionFilter {
    /// Every descendant element
    AllElements,
    /// `getElementsByTagName`
    TagName(TagMatcher),
    /// `getElementsByTagNameNS`; `None` is the `*` wildcard
    TagNameNs {
        namespace: Option<Namespace>,
        local_name: Option<String>,
    },
    /// `getElementsByClassName`: every listed class must be present
    ClassNames(Vec<String>),
    /// `getElementsByName`
    Name(String),
    /// `children`: element children only
    ChildElements,
}

impl CollectionFilter {
    fn recursive(&self) -> bool {
        !matches!(self, Self::ChildElements)
    }

    fn matches(&self, el: &ElementData) -> bool {
        match self {
            Self::AllElements | Self::ChildElements => true,
            Self::TagName(matcher) => matcher.matches(el),
            Self::TagNameNs { namespace, local_name } => {
                namespace.as_ref().is_none_or(|ns| el.namespace() == ns)
                    && local_name.as_deref().is_none_or(|l| el.local_name() == l)
            }
            Self::ClassNames(classes) => {
                !classes.is_empty() && classes.iter().all(|c| el.has_class(c))
            }
            Self::Name(name) => el.attr("name") == Some(name.as_str()),
        }
    }
}

/// Live element collection
#[derive(Debug)]
pub struct HtmlCollection {
    root: NodeId,
    filter: CollectionFilter,
    cache: RefCell<Cached<Vec<NodeId>>>,
}

impl HtmlCollection {
    pub fn new(root: NodeId, filter: CollectionFilter) -> Self {
        Self { root, filter, cache: RefCell::new(Cached::default()) }
    }

    /// Node the collection is rooted at
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn compute(&self, tree: &DomTree) -> Vec<NodeId> {
        let matches = |n: &NodeId| tree.element(*n).is_some_and(|el| self.filter.matches(el));
        if self.filter.recursive() {
            tree.descendants(self.root).filter(matches).collect()
        } else {
            tree.children(self.root).filter(matches).collect()
        }
    }

    fn with_members<R>(&self, tree: &DomTree, f: impl FnOnce(&[NodeId]) -> R) -> R {
        let stamp = (tree.owner_document(self.root).unwrap_or(self.root), tree.generation(self.root));
        let mut cache = self.cache.borrow_mut();
        if !cache.is_valid(stamp) {
            tracing::trace!(root = %self.root, "collection refresh");
            cache.update(self.compute(tree), stamp);
        }
        f(cache.get_if_valid(stamp).map_or(&[][..], Vec::as_slice))
    }

    /// `length`
    pub fn len(&self, tree: &DomTree) -> usize {
        self.with_members(tree, <[NodeId]>::len)
    }

    pub fn is_empty(&self, tree: &DomTree) -> bool {
        self.len(tree) == 0
    }

    /// `item(index)`
    pub fn item(&self, tree: &DomTree, index: usize) -> Option<NodeId> {
        self.with_members(tree, |m| m.get(index).copied())
    }

    /// `namedItem`: first member whose id, or HTML `name`, equals `name`
    pub fn named_item(&self, tree: &DomTree, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.with_members(tree, |members| {
            members.iter().copied().find(|&n| {
                tree.element(n).is_some_and(|el| {
                    el.id() == Some(name)
                        || (el.namespace() == &Namespace::Html && el.attr("name") == Some(name))
                })
            })
        })
    }

    /// Current members in tree order
    pub fn to_vec(&self, tree: &DomTree) -> Vec<NodeId> {
        self.with_members(tree, <[NodeId]>::to_vec)
    }
}

#[derive(Debug)]
enum NodeListSource {
    ChildNodes(NodeId),
    Static(Vec<NodeId>),
}

/// `NodeList`: live `childNodes` or a static query result
#[derive(Debug)]
pub struct NodeList {
    source: NodeListSource,
    cache: RefCell<Cached<Vec<NodeId>>>,
}

impl NodeList {
    /// Live view of `parent`'s children
    pub fn child_nodes(parent: NodeId) -> Self {
        Self {
            source: NodeListSource::ChildNodes(parent),
            cache: RefCell::new(Cached::default()),
        }
    }

    /// Snapshot that never changes
    pub fn from_static(nodes: Vec<NodeId>) -> Self {
        Self {
            source: NodeListSource::Static(nodes),
            cache: RefCell::new(Cached::default()),
        }
    }

    /// Whether this list tracks the tree
    pub fn is_live(&self) -> bool {
        matches!(self.source, NodeListSource::ChildNodes(_))
    }

    /// `length`
    pub fn len(&self, tree: &DomTree) -> usize {
        match &self.source {
            NodeListSource::ChildNodes(parent) => tree.child_count(*parent),
            NodeListSource::Static(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self, tree: &DomTree) -> bool {
        self.len(tree) == 0
    }

    /// `item(index)`
    pub fn item(&self, tree: &DomTree, index: usize) -> Option<NodeId> {
        match &self.source {
            NodeListSource::Static(nodes) => nodes.get(index).copied(),
            NodeListSource::ChildNodes(parent) => {
                let stamp = (tree.owner_document(*parent).unwrap_or(*parent), tree.generation(*parent));
                let mut cache = self.cache.borrow_mut();
                if !cache.is_valid(stamp) {
                    cache.update(tree.children(*parent).collect(), stamp);
                }
                cache.get_if_valid(stamp).and_then(|m| m.get(index).copied())
            }
        }
    }

    /// Current members in order
    pub fn to_vec(&self, tree: &DomTree) -> Vec<NodeId> {
        match &self.source {
            NodeListSource::Static(nodes) => nodes.clone(),
            NodeListSource::ChildNodes(parent) => tree.children(*parent).collect(),
        }
    }
}

impl DomTree {
    /// `getElementsByTagName`
    pub fn get_elements_by_tag_name(&self, root: NodeId, qualified_name: &str) -> HtmlCollection {
        HtmlCollection::new(root, CollectionFilter::TagName(TagMatcher::new(qualified_name)))
    }

    /// `getElementsByTagNameNS`
    pub fn get_elements_by_tag_name_ns(
        &self,
        root: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> HtmlCollection {
        let namespace = match namespace {
            Some("*") => None,
            ns => Some(Namespace::from_uri(ns.unwrap_or(""))),
        };
        let local_name = (local_name != "*").then(|| local_name.to_string());
        HtmlCollection::new(root, CollectionFilter::TagNameNs { namespace, local_name })
    }

    /// `getElementsByClassName`
    pub fn get_elements_by_class_name(&self, root: NodeId, class_names: &str) -> HtmlCollection {
        let classes = class_names
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect();
        HtmlCollection::new(root, CollectionFilter::ClassNames(classes))
    }

    /// `getElementsByName`
    pub fn get_elements_by_name(&self, doc: NodeId, name: &str) -> HtmlCollection {
        HtmlCollection::new(doc, CollectionFilter::Name(name.to_string()))
    }

    /// `children`
    pub fn element_children(&self, parent: NodeId) -> HtmlCollection {
        HtmlCollection::new(parent, CollectionFilter::ChildElements)
    }

    /// `childNodes`
    pub fn child_nodes(&self, parent: NodeId) -> NodeList {
        NodeList::child_nodes(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocumentKind;

    fn setup() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let body = tree.create_element(doc, "body").unwrap();
        tree.append_child(doc, body).unwrap();
        (tree, doc, body)
    }

    #[test]
    fn test_live_tag_collection() {
        let (mut tree, doc, body) = setup();
        let spans = tree.get_elements_by_tag_name(doc, "SPAN");
        assert_eq!(spans.len(&tree), 0);

        let span = tree.create_element(doc, "span").unwrap();
        tree.append_child(body, span).unwrap();
        assert_eq!(spans.len(&tree), 1);
        assert_eq!(spans.item(&tree, 0), Some(span));

        tree.remove_child(body, span).unwrap();
        assert_eq!(spans.len(&tree), 0);
    }

    #[test]
    fn test_class_collection_tracks_attribute() {
        let (mut tree, doc, body) = setup();
        let el = tree.create_element(doc, "div").unwrap();
        tree.append_child(body, el).unwrap();
        let hits = tree.get_elements_by_class_name(doc, "a b");
        assert!(hits.is_empty(&tree));
        tree.set_attribute(el, "class", "b c a").unwrap();
        assert_eq!(hits.to_vec(&tree), vec![el]);
        assert!(tree.get_elements_by_class_name(doc, "  ").is_empty(&tree));
    }

    #[test]
    fn test_children_collection_is_shallow() {
        let (mut tree, doc, body) = setup();
        let outer = tree.create_element(doc, "div").unwrap();
        let inner = tree.create_element(doc, "div").unwrap();
        let text = tree.create_text_node(doc, "t").unwrap();
        tree.append_child(body, outer).unwrap();
        tree.append_child(outer, inner).unwrap();
        tree.append_child(body, text).unwrap();

        assert_eq!(tree.element_children(body).to_vec(&tree), vec![outer]);
        assert_eq!(tree.child_nodes(body).len(&tree), 2);
        assert_eq!(tree.child_nodes(body).item(&tree, 1), Some(text));
    }

    #[test]
    fn test_named_item() {
        let (mut tree, doc, body) = setup();
        let form = tree.create_element(doc, "form").unwrap();
        tree.set_attribute(form, "name", "login").unwrap();
        tree.append_child(body, form).unwrap();
        let forms = tree.get_elements_by_tag_name(doc, "form");
        assert_eq!(forms.named_item(&tree, "login"), Some(form));
        assert_eq!(forms.named_item(&tree, ""), None);
    }

    #[test]
    fn test_tag_name_ns() {
        let (mut tree, doc, body) = setup();
        let circle = tree.create_element_ns(doc, Some(Namespace::SVG_URI), "circle").unwrap();
        tree.append_child(body, circle).unwrap();
        let by_ns = tree.get_elements_by_tag_name_ns(doc, Some(Namespace::SVG_URI), "*");
        assert_eq!(by_ns.to_vec(&tree), vec![circle]);
        let html_only = tree.get_elements_by_tag_name_ns(doc, Some(Namespace::HTML_URI), "circle");
        assert!(html_only.is_empty(&tree));
    }

    #[test]
    fn test_static_node_list() {
        let list = NodeList::from_static(vec![NodeId(3), NodeId(1)]);
        let tree = DomTree::new();
        assert!(!list.is_live());
        assert_eq!(list.len(&tree), 2);
        assert_eq!(list.item(&tree, 1), Some(NodeId(1)));
    }
}
