//! Tree Order
//!
//! Ordering of nodes and boundary points. Comparisons walk parent links in
//! place, lifting the deeper node to the other's depth first.

use std::cmp::Ordering;

use crate::{DomTree, NodeId};

/// `compareDocumentPosition` result bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentPosition(u16);

impl DocumentPosition {
    pub const DISCONNECTED: u16 = 0x01;
    pub const PRECEDING: u16 = 0x02;
    pub const FOLLOWING: u16 = 0x04;
    pub const CONTAINS: u16 = 0x08;
    pub const CONTAINED_BY: u16 = 0x10;
    pub const IMPLEMENTATION_SPECIFIC: u16 = 0x20;

    /// Raw bitmask
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }
}

/// A (node, offset) position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    #[inline]
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl DomTree {
    /// Number of ancestors and the root they end at
    fn depth_and_root(&self, node: NodeId) -> (usize, NodeId) {
        let mut depth = 0;
        let mut root = node;
        while let Some(parent) = self.parent(root) {
            depth += 1;
            root = parent;
        }
        (depth, root)
    }

    /// Tree order of two nodes, `None` when they are in different trees
    pub fn compare_tree_order(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        self.get(a)?;
        self.get(b)?;
        if a == b {
            return Some(Ordering::Equal);
        }
        let (depth_a, root_a) = self.depth_and_root(a);
        let (depth_b, root_b) = self.depth_and_root(b);
        if root_a != root_b {
            return None;
        }

        let (mut x, mut y) = (a, b);
        for _ in depth_b..depth_a {
            x = self.parent(x)?;
        }
        for _ in depth_a..depth_b {
            y = self.parent(y)?;
        }
        // one is an inclusive ancestor of the other: ancestors precede descendants
        if x == y {
            return Some(depth_a.cmp(&depth_b));
        }
        loop {
            let (px, py) = (self.parent(x)?, self.parent(y)?);
            if px == py {
                break;
            }
            x = px;
            y = py;
        }

        let mut cur = self.next_sibling(x);
        while let Some(sibling) = cur {
            if sibling == y {
                return Some(Ordering::Less);
            }
            cur = self.next_sibling(sibling);
        }
        Some(Ordering::Greater)
    }

    /// `compareDocumentPosition(other)` relative to `reference`
    pub fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition {
        if reference == other {
            return DocumentPosition::default();
        }
        match self.compare_tree_order(reference, other) {
            None => {
                let direction = if other < reference {
                    DocumentPosition::PRECEDING
                } else {
                    DocumentPosition::FOLLOWING
                };
                DocumentPosition(
                    DocumentPosition::DISCONNECTED
                        | DocumentPosition::IMPLEMENTATION_SPECIFIC
                        | direction,
                )
            }
            Some(_) if self.is_ancestor(other, reference) => {
                DocumentPosition(DocumentPosition::CONTAINS | DocumentPosition::PRECEDING)
            }
            Some(_) if self.is_ancestor(reference, other) => {
                DocumentPosition(DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING)
            }
            Some(Ordering::Greater) => DocumentPosition(DocumentPosition::PRECEDING),
            Some(_) => DocumentPosition(DocumentPosition::FOLLOWING),
        }
    }

    /// Position of boundary point `a` relative to `b`, `None` across trees
    pub fn compare_boundary_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Option<Ordering> {
        if a.node == b.node {
            return Some(a.offset.cmp(&b.offset));
        }
        match self.compare_tree_order(a.node, b.node)? {
            Ordering::Greater => self.compare_boundary_points(b, a).map(Ordering::reverse),
            _ if self.is_ancestor(a.node, b.node) => {
                let mut child = b.node;
                while let Some(parent) = self.parent(child) {
                    if parent == a.node {
                        break;
                    }
                    child = parent;
                }
                if self.index_of(child) < a.offset {
                    Some(Ordering::Greater)
                } else {
                    Some(Ordering::Less)
                }
            }
            _ => Some(Ordering::Less),
        }
    }
}
