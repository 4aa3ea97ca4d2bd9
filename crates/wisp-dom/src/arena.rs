//! Node Arena
//!
//! Page-lifetime storage for every node. Nodes are never freed one at a
//! time: removing a node from the tree only unlinks it, and all storage goes
//! away together with the owning [`DomTree`](crate::DomTree).

use crate::node::Node;
use crate::{DomError, DomResult, NodeId};

/// Capacity limits for a node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaLimits {
    /// Hard cap on allocated nodes; allocation past it is `OutOfResources`
    pub max_nodes: usize,
    /// Nodes reserved up front
    pub initial_capacity: usize,
}

impl Default for ArenaLimits {
    fn default() -> Self {
        Self {
            max_nodes: u32::MAX as usize,
            initial_capacity: 256,
        }
    }
}

/// Arena of nodes addressed by [`NodeId`]
#[derive(Debug)]
pub struct NodeArena {
    nodes: Vec<Node>,
    limits: ArenaLimits,
}

impl NodeArena {
    /// Create an arena with the given limits
    pub fn new(limits: ArenaLimits) -> Self {
        let capacity = limits.initial_capacity.min(limits.max_nodes);
        Self {
            nodes: Vec::with_capacity(capacity),
            limits,
        }
    }

    /// Store a node and return its handle
    pub fn alloc(&mut self, node: Node) -> DomResult<NodeId> {
        let cap = self.limits.max_nodes.min(u32::MAX as usize);
        if self.nodes.len() >= cap {
            tracing::error!(nodes = self.nodes.len(), "node arena exhausted");
            return Err(DomError::OutOfResources("node arena exhausted"));
        }
        if self.nodes.try_reserve(1).is_err() {
            tracing::error!(nodes = self.nodes.len(), "node allocation failed");
            return Err(DomError::OutOfResources("node allocation failed"));
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        Ok(id)
    }

    /// Get a node
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a node mutably
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of allocated nodes, attached or not
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Limits this arena enforces
    pub fn limits(&self) -> ArenaLimits {
        self.limits
    }

    /// Approximate bytes held by node slots
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>()
    }
}
