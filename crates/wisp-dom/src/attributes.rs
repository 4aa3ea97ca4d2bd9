//! Element Attributes
//!
//! Attribute reads and writes on elements in the tree. Writes keep the id
//! index current and advance the document generation, since class, name and
//! id changes all affect live collections.

use std::borrow::Cow;

use crate::element::{validate_name, Namespace};
use crate::node::DocumentKind;
use crate::{DomError, DomResult, DomTree, NodeId};

impl DomTree {
    /// HTML elements in HTML documents match attribute names case-insensitively
    fn attribute_name<'a>(&self, element: NodeId, name: &'a str) -> Cow<'a, str> {
        let html_element = self
            .element(element)
            .is_some_and(|e| e.namespace() == &Namespace::Html);
        let html_document = self
            .owner_document(element)
            .and_then(|d| self.get(d))
            .and_then(|d| d.as_document())
            .is_some_and(|d| d.kind() == DocumentKind::Html);
        if html_element && html_document && name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(name.to_ascii_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    /// `getAttribute`
    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        let name = self.attribute_name(element, name);
        self.element(element)?.attr(&name)
    }

    /// `hasAttribute`
    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.get_attribute(element, name).is_some()
    }

    /// `getAttributeNames`
    pub fn attribute_names(&self, element: NodeId) -> Vec<String> {
        self.element(element)
            .map(|e| e.attributes().iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// `setAttribute`
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        validate_name(name)?;
        let name = self.attribute_name(element, name).into_owned();
        let old = self
            .node_mut(element)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType("not an element"))?
            .set_attr(&name, value);
        self.attribute_changed(element, &name, old.as_deref(), Some(value));
        Ok(())
    }

    /// `removeAttribute`; removing a missing attribute is not an error
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<()> {
        let name = self.attribute_name(element, name).into_owned();
        let old = self
            .node_mut(element)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType("not an element"))?
            .remove_attr(&name);
        if old.is_some() {
            self.attribute_changed(element, &name, old.as_deref(), None);
        }
        Ok(())
    }

    /// `toggleAttribute`, returning whether the attribute is now present
    pub fn toggle_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        force: Option<bool>,
    ) -> DomResult<bool> {
        validate_name(name)?;
        let present = self.has_attribute(element, name);
        match (present, force) {
            (false, None | Some(true)) => {
                self.set_attribute(element, name, "")?;
                Ok(true)
            }
            (true, None | Some(false)) => {
                self.remove_attribute(element, name)?;
                Ok(false)
            }
            (present, _) => Ok(present),
        }
    }

    fn attribute_changed(&mut self, element: NodeId, name: &str, old: Option<&str>, new: Option<&str>) {
        if name == "id" && old != new {
            if let Some(scope) = self.index_scope(element) {
                if let Some(old) = old {
                    self.index_id_removed(scope, old, element);
                }
                if let Some(new) = new {
                    self.index_id_added(scope, new, element);
                }
            }
        }
        if let Some(doc) = self.owner_document(element) {
            self.bump_generation(doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::DocumentKind;
    use crate::DomTree;

    #[test]
    fn test_case_insensitive_in_html() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let el = tree.create_element(doc, "div").unwrap();
        tree.set_attribute(el, "Data-Role", "nav").unwrap();
        assert_eq!(tree.get_attribute(el, "data-role"), Some("nav"));
        assert_eq!(tree.get_attribute(el, "DATA-ROLE"), Some("nav"));
        assert_eq!(tree.attribute_names(el), vec!["data-role".to_string()]);
    }

    #[test]
    fn test_toggle_attribute() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let el = tree.create_element(doc, "input").unwrap();
        assert!(tree.toggle_attribute(el, "disabled", None).unwrap());
        assert!(tree.has_attribute(el, "disabled"));
        assert!(tree.toggle_attribute(el, "disabled", Some(true)).unwrap());
        assert!(!tree.toggle_attribute(el, "disabled", None).unwrap());
        assert!(!tree.has_attribute(el, "disabled"));
    }

    #[test]
    fn test_invalid_attribute_name() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let el = tree.create_element(doc, "div").unwrap();
        let err = tree.set_attribute(el, "a b", "x").unwrap_err();
        assert_eq!(err.exception_name(), Some("InvalidCharacterError"));
    }

    #[test]
    fn test_attribute_on_text_node() {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let text = tree.create_text_node(doc, "x").unwrap();
        assert!(tree.set_attribute(text, "id", "t").is_err());
    }
}
