//! Shadow DOM v1
//!
//! Shadow roots attached to host elements, and named slot assignment.
//!
//! A shadow root is a separate tree whose parent link is empty; its host is
//! recorded on both sides. Event paths and connectedness cross from the
//! shadow root to the host, plain tree walks do not.

use crate::element::{Namespace, Tag};
use crate::index::IdIndex;
use crate::node::NodeKind;
use crate::{DomError, DomResult, DomTree, NodeId};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Slot assignment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotAssignmentMode {
    #[default]
    Named,
    Manual,
}

/// Shadow root initialization options
#[derive(Debug, Clone, Default)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
    pub slot_assignment: SlotAssignmentMode,
    /// Cloneable (for declarative shadow DOM)
    pub clonable: bool,
    /// Serializable (for getHTML())
    pub serializable: bool,
}

/// Shadow-root-specific node data
#[derive(Debug, Clone)]
pub struct ShadowRootData {
    pub(crate) host: NodeId,
    pub(crate) init: ShadowRootInit,
    pub(crate) id_index: IdIndex,
}

impl ShadowRootData {
    #[inline]
    pub fn host(&self) -> NodeId {
        self.host
    }

    #[inline]
    pub fn mode(&self) -> ShadowRootMode {
        self.init.mode
    }

    #[inline]
    pub fn delegates_focus(&self) -> bool {
        self.init.delegates_focus
    }

    #[inline]
    pub fn slot_assignment(&self) -> SlotAssignmentMode {
        self.init.slot_assignment
    }

    #[inline]
    pub fn clonable(&self) -> bool {
        self.init.clonable
    }

    #[inline]
    pub fn serializable(&self) -> bool {
        self.init.serializable
    }
}

const VALID_HOSTS: &[Tag] = &[
    Tag::Article,
    Tag::Aside,
    Tag::Blockquote,
    Tag::Body,
    Tag::Div,
    Tag::Footer,
    Tag::H1,
    Tag::H2,
    Tag::H3,
    Tag::H4,
    Tag::H5,
    Tag::H6,
    Tag::Header,
    Tag::Main,
    Tag::Nav,
    Tag::P,
    Tag::Section,
    Tag::Span,
];

fn is_custom_element_name(name: &str) -> bool {
    name.contains('-')
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && !name.chars().any(|c| c.is_ascii_uppercase())
}

impl DomTree {
    /// `attachShadow`
    pub fn attach_shadow(&mut self, host: NodeId, init: ShadowRootInit) -> DomResult<NodeId> {
        let node = self.node(host)?;
        let el = node
            .as_element()
            .ok_or(DomError::NotSupported("only elements can host a shadow root".into()))?;
        let valid = el.namespace() == &Namespace::Html
            && (VALID_HOSTS.contains(&el.tag()) || is_custom_element_name(el.local_name()));
        if !valid {
            return Err(DomError::NotSupported(format!(
                "<{}> cannot host a shadow root",
                el.local_name()
            )));
        }
        if el.shadow_root().is_some() {
            return Err(DomError::NotSupported("element already hosts a shadow root".into()));
        }

        let doc = node.owner_document;
        let shadow = self.alloc_shadow_root(
            doc,
            ShadowRootData { host, init, id_index: IdIndex::default() },
        )?;
        if let Some(el) = self.node_mut(host)?.as_element_mut() {
            el.shadow_root = Some(shadow);
        }
        tracing::debug!(host = %host, shadow = %shadow, "attached shadow root");
        Ok(shadow)
    }

    /// `shadowRoot`: only open roots are visible
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let shadow = self.element(host)?.shadow_root()?;
        let data = self.get(shadow)?.as_shadow_root()?;
        (data.mode() == ShadowRootMode::Open).then_some(shadow)
    }

    /// Shadow root data, whatever the mode
    pub fn shadow_root_data(&self, shadow: NodeId) -> Option<&ShadowRootData> {
        self.get(shadow)?.as_shadow_root()
    }

    /// `host` of a shadow root
    pub fn host(&self, shadow: NodeId) -> Option<NodeId> {
        self.shadow_root_data(shadow).map(ShadowRootData::host)
    }

    /// Slot name a slottable asks for; `None` if not slottable
    fn slottable_name(&self, node: NodeId) -> Option<String> {
        match self.kind(node)? {
            NodeKind::Element => Some(self.get_attribute(node, "slot").unwrap_or("").to_string()),
            NodeKind::Text => Some(String::new()),
            _ => None,
        }
    }

    fn slot_name(&self, slot: NodeId) -> String {
        self.get_attribute(slot, "name").unwrap_or("").to_string()
    }

    fn is_slot(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|e| e.is(Tag::Slot))
    }

    /// First slot in `shadow` with the given name
    pub fn find_slot(&self, shadow: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(shadow)
            .find(|&n| self.is_slot(n) && self.slot_name(n) == name)
    }

    /// `assignedSlot`: only slots in open shadow roots are reported
    pub fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        let name = self.slottable_name(node)?;
        let host = self.parent(node)?;
        let shadow = self.shadow_root(host)?;
        if self.shadow_root_data(shadow)?.slot_assignment() != SlotAssignmentMode::Named {
            return None;
        }
        self.find_slot(shadow, &name)
    }

    /// `assignedNodes`: host children distributed into `slot`
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        if !self.is_slot(slot) {
            return Vec::new();
        }
        let root = self.root(slot);
        let Some(data) = self.shadow_root_data(root) else {
            return Vec::new();
        };
        if data.slot_assignment() != SlotAssignmentMode::Named {
            return Vec::new();
        }
        let name = self.slot_name(slot);
        if self.find_slot(root, &name) != Some(slot) {
            return Vec::new();
        }
        self.children(data.host())
            .filter(|&c| self.slottable_name(c).as_deref() == Some(name.as_str()))
            .collect()
    }
}
