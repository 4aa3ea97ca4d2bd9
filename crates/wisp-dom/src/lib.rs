//! Wisp DOM - Document Object Model core
//!
//! Arena-backed node graph for one page, with live collections, the id
//! index, shadow roots, live ranges and selections, and the event registry
//! with three-phase dispatch.
//!
//! Nodes are addressed by [`NodeId`] handles into a [`DomTree`]. Nothing is
//! freed individually: removal only unlinks, and storage goes away with the
//! tree. Handles therefore never dangle while the tree is alive.

mod abort;
mod arena;
mod attributes;
mod character_data;
mod children;
mod collections;
mod dispatch;
mod element;
mod error;
mod events;
mod generation;
mod index;
mod mutation;
mod node;
mod order;
mod page;
mod range;
mod scheduler;
mod selection;
mod selector;
mod shadow;
mod token_list;
mod tree;

use std::fmt;

pub use abort::{AbortController, AbortReason, AbortSignals, SignalId};
pub use arena::{ArenaLimits, NodeArena};
pub use children::Children;
pub use collections::{CollectionFilter, HtmlCollection, NodeList, TagMatcher};
pub use element::{validate_name, validate_qualified_name, Attribute, ElementData, Namespace, Tag};
pub use error::{DomError, DomResult};
pub use events::{
    listener, Event, EventInit, EventListener, EventPhase, EventRegistry, EventTarget, InlineHandler,
    ListenerError, ListenerId, ListenerOptions, ListenerRef,
};
pub use generation::{Cached, Generation};
pub use index::IdIndex;
pub use node::{DocumentData, DocumentKind, Node, NodeData, NodeKind, NodeType, QuirksMode};
pub use order::{BoundaryPoint, DocumentPosition};
pub use page::Page;
pub use range::{How, Range, RangeId, RangeMut};
pub use scheduler::{Scheduler, Task};
pub use selection::{Direction, Selection, SelectionMut, SelectionType};
pub use selector::{CompiledSelector, SelectorEngine};
pub use shadow::{ShadowRootData, ShadowRootInit, ShadowRootMode, SlotAssignmentMode};
pub use token_list::DomTokenList;
pub use tree::{Ancestors, ChildIter, Descendants, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw value, stable for the tree's lifetime
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
