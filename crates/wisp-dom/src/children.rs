//! Child Lists
//!
//! Compact record of a node's children. Sibling order itself lives in the
//! per-node sibling links; this only keeps the ends and the count so that
//! `firstChild`, `lastChild` and `childNodes.length` are O(1).

use crate::NodeId;

/// Children of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Children {
    /// No children
    #[default]
    Empty,
    /// Exactly one child
    One(NodeId),
    /// Two or more children
    List { first: NodeId, last: NodeId, len: u32 },
}

impl Children {
    /// First child
    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        match *self {
            Self::Empty => None,
            Self::One(id) => Some(id),
            Self::List { first, .. } => Some(first),
        }
    }

    /// Last child
    #[inline]
    pub fn last(&self) -> Option<NodeId> {
        match *self {
            Self::Empty => None,
            Self::One(id) => Some(id),
            Self::List { last, .. } => Some(last),
        }
    }

    /// Number of children
    #[inline]
    pub fn len(&self) -> usize {
        match *self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::List { len, .. } => len as usize,
        }
    }

    /// Whether there are no children
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn from_parts(first: NodeId, last: NodeId, len: usize) -> Self {
        match len {
            0 => Self::Empty,
            1 => Self::One(first),
            n => Self::List { first, last, len: n as u32 },
        }
    }

    /// Record `child` linked between `prev` and `next`
    pub(crate) fn inserted(&mut self, child: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        let first = if prev.is_none() { child } else { self.first().unwrap_or(child) };
        let last = if next.is_none() { child } else { self.last().unwrap_or(child) };
        *self = Self::from_parts(first, last, self.len() + 1);
    }

    /// Record `child`, formerly between `prev` and `next`, as unlinked
    pub(crate) fn removed(&mut self, child: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        let len = self.len().saturating_sub(1);
        let first = match prev {
            None => next,
            Some(_) => self.first(),
        };
        let last = match next {
            None => prev,
            Some(_) => self.last(),
        };
        *self = match (first, last) {
            (Some(first), Some(last)) if len > 0 => Self::from_parts(first, last, len),
            _ => {
                debug_assert!(len == 0, "child list lost its ends removing {child}");
                Self::Empty
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sequence() {
        let mut c = Children::default();
        assert!(c.is_empty());

        c.inserted(NodeId(1), None, None);
        assert_eq!(c, Children::One(NodeId(1)));

        c.inserted(NodeId(2), Some(NodeId(1)), None);
        assert_eq!(c.first(), Some(NodeId(1)));
        assert_eq!(c.last(), Some(NodeId(2)));
        assert_eq!(c.len(), 2);

        c.inserted(NodeId(3), None, Some(NodeId(1)));
        assert_eq!(c.first(), Some(NodeId(3)));
        assert_eq!(c.last(), Some(NodeId(2)));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_remove_back_to_one() {
        let mut c = Children::List { first: NodeId(1), last: NodeId(2), len: 2 };
        c.removed(NodeId(1), None, Some(NodeId(2)));
        assert_eq!(c, Children::One(NodeId(2)));

        c.removed(NodeId(2), None, None);
        assert_eq!(c, Children::Empty);
    }

    #[test]
    fn test_remove_middle_keeps_ends() {
        let mut c = Children::List { first: NodeId(1), last: NodeId(3), len: 3 };
        c.removed(NodeId(2), Some(NodeId(1)), Some(NodeId(3)));
        assert_eq!(c, Children::List { first: NodeId(1), last: NodeId(3), len: 2 });
    }
}
