//! Selector engine interface
//!
//! Matching is supplied from outside the core. The core owns traversal:
//! `querySelector*` walk descendants in tree order and ask a compiled
//! selector about each element.

use crate::collections::NodeList;
use crate::{DomResult, DomTree, NodeId};

/// Parses selector text
pub trait SelectorEngine {
    /// Compile `selectors`; invalid input is a `Syntax` error
    fn compile(&self, selectors: &str) -> DomResult<Box<dyn CompiledSelector>>;
}

/// A parsed selector list
pub trait CompiledSelector {
    fn matches(&self, tree: &DomTree, element: NodeId) -> bool;
}

impl DomTree {
    /// `querySelector`: first matching descendant element in tree order
    pub fn query_selector(
        &self,
        engine: &dyn SelectorEngine,
        root: NodeId,
        selectors: &str,
    ) -> DomResult<Option<NodeId>> {
        let compiled = engine.compile(selectors)?;
        Ok(self
            .descendants(root)
            .find(|&n| self.is_element(n) && compiled.matches(self, n)))
    }

    /// `querySelectorAll`: static snapshot, does not follow later mutations
    pub fn query_selector_all(
        &self,
        engine: &dyn SelectorEngine,
        root: NodeId,
        selectors: &str,
    ) -> DomResult<NodeList> {
        let compiled = engine.compile(selectors)?;
        let found = self
            .descendants(root)
            .filter(|&n| self.is_element(n) && compiled.matches(self, n))
            .collect();
        Ok(NodeList::from_static(found))
    }

    /// `Element.matches`
    pub fn matches(&self, engine: &dyn SelectorEngine, element: NodeId, selectors: &str) -> DomResult<bool> {
        let compiled = engine.compile(selectors)?;
        Ok(self.is_element(element) && compiled.matches(self, element))
    }

    /// `Element.closest`
    pub fn closest(&self, engine: &dyn SelectorEngine, element: NodeId, selectors: &str) -> DomResult<Option<NodeId>> {
        let compiled = engine.compile(selectors)?;
        Ok(self
            .inclusive_ancestors(element)
            .find(|&n| self.is_element(n) && compiled.matches(self, n)))
    }
}
