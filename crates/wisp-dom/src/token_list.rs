//! DOMTokenList (classList)
//!
//! Live ordered-set view over a whitespace-separated attribute. Reads parse
//! the attribute on demand; writes serialize the set back into it.

use crate::{DomError, DomResult, DomTree, NodeId};

/// Token list bound to one attribute of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTokenList {
    element: NodeId,
    attribute: String,
}

fn validate_token(token: &str) -> DomResult<()> {
    if token.is_empty() {
        return Err(DomError::Syntax("token must not be empty".into()));
    }
    if token.chars().any(|c| c.is_ascii_whitespace()) {
        return Err(DomError::InvalidCharacter(token.to_string()));
    }
    Ok(())
}

impl DomTokenList {
    pub fn new(element: NodeId, attribute: &str) -> Self {
        Self { element, attribute: attribute.to_string() }
    }

    #[inline]
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Parsed tokens, duplicates dropped
    pub fn tokens(&self, tree: &DomTree) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let value = tree.get_attribute(self.element, &self.attribute).unwrap_or("");
        for token in value.split_ascii_whitespace() {
            if !out.iter().any(|t| t == token) {
                out.push(token.to_string());
            }
        }
        out
    }

    /// Get number of tokens
    pub fn length(&self, tree: &DomTree) -> usize {
        self.tokens(tree).len()
    }

    /// Get token at index
    pub fn item(&self, tree: &DomTree, index: usize) -> Option<String> {
        self.tokens(tree).into_iter().nth(index)
    }

    /// Check if token exists
    pub fn contains(&self, tree: &DomTree, token: &str) -> bool {
        self.tokens(tree).iter().any(|t| t == token)
    }

    /// Raw attribute value
    pub fn value(&self, tree: &DomTree) -> String {
        tree.get_attribute(self.element, &self.attribute)
            .unwrap_or("")
            .to_string()
    }

    pub fn set_value(&self, tree: &mut DomTree, value: &str) -> DomResult<()> {
        tree.set_attribute(self.element, &self.attribute, value)
    }

    fn write(&self, tree: &mut DomTree, tokens: &[String]) -> DomResult<()> {
        if !tree.has_attribute(self.element, &self.attribute) && tokens.is_empty() {
            return Ok(());
        }
        tree.set_attribute(self.element, &self.attribute, &tokens.join(" "))
    }

    /// Add token(s)
    pub fn add(&self, tree: &mut DomTree, tokens: &[&str]) -> DomResult<()> {
        for token in tokens {
            validate_token(token)?;
        }
        let mut set = self.tokens(tree);
        for token in tokens {
            if !set.iter().any(|t| t == token) {
                set.push(token.to_string());
            }
        }
        self.write(tree, &set)
    }

    /// Remove token(s)
    pub fn remove(&self, tree: &mut DomTree, tokens: &[&str]) -> DomResult<()> {
        for token in tokens {
            validate_token(token)?;
        }
        let mut set = self.tokens(tree);
        set.retain(|t| !tokens.contains(&t.as_str()));
        self.write(tree, &set)
    }

    /// Toggle token, returns new state
    pub fn toggle(&self, tree: &mut DomTree, token: &str, force: Option<bool>) -> DomResult<bool> {
        validate_token(token)?;
        let present = self.contains(tree, token);
        match (present, force) {
            (true, None | Some(false)) => {
                self.remove(tree, &[token])?;
                Ok(false)
            }
            (false, None | Some(true)) => {
                self.add(tree, &[token])?;
                Ok(true)
            }
            (present, _) => Ok(present),
        }
    }

    /// Replace token, returns whether `old` was present
    pub fn replace(&self, tree: &mut DomTree, old: &str, new: &str) -> DomResult<bool> {
        validate_token(old)?;
        validate_token(new)?;
        let mut set = self.tokens(tree);
        let Some(pos) = set.iter().position(|t| t == old) else {
            return Ok(false);
        };
        if set.iter().any(|t| t == new) {
            set.remove(pos);
        } else {
            set[pos] = new.to_string();
        }
        self.write(tree, &set)?;
        Ok(true)
    }
}

impl DomTree {
    /// `classList`
    pub fn class_list(&self, element: NodeId) -> DomTokenList {
        DomTokenList::new(element, "class")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocumentKind;

    fn element() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let el = tree.create_element(doc, "div").unwrap();
        (tree, el)
    }

    #[test]
    fn test_add_and_serialize() {
        let (mut tree, el) = element();
        let list = tree.class_list(el);
        list.add(&mut tree, &["a", "b", "a"]).unwrap();
        assert_eq!(tree.get_attribute(el, "class"), Some("a b"));
        assert_eq!(list.length(&tree), 2);
        assert_eq!(list.item(&tree, 1).as_deref(), Some("b"));
    }

    #[test]
    fn test_duplicates_collapsed_on_read() {
        let (mut tree, el) = element();
        tree.set_attribute(el, "class", "x  y x").unwrap();
        let list = tree.class_list(el);
        assert_eq!(list.tokens(&tree), vec!["x", "y"]);
    }

    #[test]
    fn test_token_validation() {
        let (mut tree, el) = element();
        let list = tree.class_list(el);
        let err = list.add(&mut tree, &[""]).unwrap_err();
        assert_eq!(err.exception_name(), Some("SyntaxError"));
        let err = list.add(&mut tree, &["a b"]).unwrap_err();
        assert_eq!(err.exception_name(), Some("InvalidCharacterError"));
        assert!(!tree.has_attribute(el, "class"));
    }

    #[test]
    fn test_toggle_and_replace() {
        let (mut tree, el) = element();
        let list = tree.class_list(el);
        assert!(list.toggle(&mut tree, "on", None).unwrap());
        assert!(list.toggle(&mut tree, "on", Some(true)).unwrap());
        assert!(list.replace(&mut tree, "on", "off").unwrap());
        assert!(!list.replace(&mut tree, "missing", "x").unwrap());
        assert_eq!(list.value(&tree), "off");
        assert!(!list.toggle(&mut tree, "off", None).unwrap());
        assert_eq!(tree.get_attribute(el, "class"), Some(""));
    }

    #[test]
    fn test_remove_without_attribute_is_silent() {
        let (mut tree, el) = element();
        let list = tree.class_list(el);
        list.remove(&mut tree, &["ghost"]).unwrap();
        assert!(!tree.has_attribute(el, "class"));
    }
}
