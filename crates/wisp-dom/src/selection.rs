//! Selection API
//!
//! Each document has at most one selection, holding zero or one live range
//! plus a direction. Anchor and focus are derived from the range ends.

use std::cmp::Ordering;

use crate::node::NodeKind;
use crate::order::BoundaryPoint;
use crate::range::{Range, RangeId};
use crate::{DomError, DomResult, DomTree, NodeId};

/// Selection direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Forward,
    Backward,
}

/// `type` of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionType {
    None,
    Caret,
    Range,
}

/// Stored selection state of one document
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    range: Option<RangeId>,
    direction: Direction,
    /// Range was created by the selection itself
    owned: bool,
}

/// Mutable access to a document's selection
pub struct SelectionMut<'a> {
    tree: &'a mut DomTree,
    doc: NodeId,
}

impl DomTree {
    /// Selection of `doc`, created empty on first access
    pub fn selection_mut(&mut self, doc: NodeId) -> DomResult<SelectionMut<'_>> {
        if self.node(doc)?.kind() != NodeKind::Document {
            return Err(DomError::InvalidNodeType("not a document"));
        }
        self.selections.entry(doc).or_default();
        Ok(SelectionMut { tree: self, doc })
    }
}

impl SelectionMut<'_> {
    fn state(&self) -> Selection {
        self.tree.selections.get(&self.doc).copied().unwrap_or_default()
    }

    fn store(&mut self, range: Option<RangeId>, direction: Direction, owned: bool) {
        let old = self.state();
        if old.owned && old.range.is_some() && old.range != range {
            if let Some(id) = old.range {
                self.tree.release_range(id);
            }
        }
        self.tree.selections.insert(self.doc, Selection { range, direction, owned });
    }

    fn current(&self) -> Option<Range> {
        self.state().range.and_then(|id| self.tree.range(id).copied())
    }

    /// Tree the selection lives in
    pub fn tree(&self) -> &DomTree {
        self.tree
    }

    /// `rangeCount`
    pub fn range_count(&self) -> usize {
        usize::from(self.current().is_some())
    }

    /// `getRangeAt`
    pub fn get_range_at(&self, index: usize) -> DomResult<RangeId> {
        match self.state().range {
            Some(id) if index == 0 && self.current().is_some() => Ok(id),
            _ => Err(DomError::IndexSize { offset: index, length: self.range_count() }),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.state().direction
    }

    /// `type`
    pub fn selection_type(&self) -> SelectionType {
        match self.current() {
            None => SelectionType::None,
            Some(r) if r.collapsed() => SelectionType::Caret,
            Some(_) => SelectionType::Range,
        }
    }

    fn anchor(&self) -> Option<BoundaryPoint> {
        let range = self.current()?;
        Some(match self.direction() {
            Direction::Backward => range.end(),
            _ => range.start(),
        })
    }

    fn focus(&self) -> Option<BoundaryPoint> {
        let range = self.current()?;
        Some(match self.direction() {
            Direction::Backward => range.start(),
            _ => range.end(),
        })
    }

    pub fn anchor_node(&self) -> Option<NodeId> {
        self.anchor().map(|p| p.node)
    }

    pub fn anchor_offset(&self) -> usize {
        self.anchor().map_or(0, |p| p.offset)
    }

    pub fn focus_node(&self) -> Option<NodeId> {
        self.focus().map(|p| p.node)
    }

    pub fn focus_offset(&self) -> usize {
        self.focus().map_or(0, |p| p.offset)
    }

    /// `isCollapsed`
    pub fn is_collapsed(&self) -> bool {
        self.current().is_none_or(|r| r.collapsed())
    }

    fn in_document(&self, node: NodeId) -> bool {
        self.tree.root(node) == self.doc
    }

    fn check_point(&self, node: NodeId, offset: usize) -> DomResult<()> {
        if self.tree.node(node)?.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType("doctype cannot hold a selection"));
        }
        let length = self.tree.node_length(node);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        Ok(())
    }

    /// Select the range between two points, moving the owned range when
    /// there is one
    fn select(&mut self, anchor: BoundaryPoint, focus: BoundaryPoint) -> DomResult<()> {
        let backward = self.tree.compare_boundary_points(focus, anchor) == Some(Ordering::Less);
        let (start, end) = if backward { (focus, anchor) } else { (anchor, focus) };
        let state = self.state();
        let owned = state.range.filter(|&id| state.owned && self.tree.range(id).is_some());
        let id = match owned {
            Some(id) => id,
            None => self.tree.create_range(self.doc)?,
        };
        if let Some(mut range) = self.tree.range_mut(id) {
            range.set_start(start.node, start.offset)?;
            range.set_end(end.node, end.offset)?;
        }
        let direction = if backward { Direction::Backward } else { Direction::Forward };
        self.store(Some(id), direction, true);
        Ok(())
    }

    /// `addRange`: ignored while a range is already selected
    pub fn add_range(&mut self, id: RangeId) {
        let Some(range) = self.tree.range(id).copied() else {
            return;
        };
        if self.range_count() != 0 || !self.in_document(range.start_container()) {
            return;
        }
        self.store(Some(id), Direction::Forward, false);
    }

    /// `removeRange`
    pub fn remove_range(&mut self, id: RangeId) -> DomResult<()> {
        if self.state().range == Some(id) {
            self.store(None, Direction::None, false);
            Ok(())
        } else {
            Err(DomError::NotFound("range is not selected"))
        }
    }

    /// `removeAllRanges` / `empty`
    pub fn remove_all_ranges(&mut self) {
        self.store(None, Direction::None, false);
    }

    /// `collapse(node, offset)`; `None` empties the selection
    pub fn collapse(&mut self, node: Option<NodeId>, offset: usize) -> DomResult<()> {
        let Some(node) = node else {
            self.remove_all_ranges();
            return Ok(());
        };
        self.check_point(node, offset)?;
        if !self.in_document(node) {
            return Ok(());
        }
        let point = BoundaryPoint::new(node, offset);
        self.select(point, point)?;
        self.store(self.state().range, Direction::None, true);
        Ok(())
    }

    /// `collapseToStart`
    pub fn collapse_to_start(&mut self) -> DomResult<()> {
        let range = self.current().ok_or(DomError::InvalidState("selection is empty"))?;
        self.collapse(Some(range.start_container()), range.start_offset())
    }

    /// `collapseToEnd`
    pub fn collapse_to_end(&mut self) -> DomResult<()> {
        let range = self.current().ok_or(DomError::InvalidState("selection is empty"))?;
        self.collapse(Some(range.end_container()), range.end_offset())
    }

    /// `extend`: move the focus, keeping the anchor
    pub fn extend(&mut self, node: NodeId, offset: usize) -> DomResult<()> {
        let anchor = self.anchor().ok_or(DomError::InvalidState("selection is empty"))?;
        self.check_point(node, offset)?;
        if !self.in_document(node) {
            return Ok(());
        }
        self.select(anchor, BoundaryPoint::new(node, offset))
    }

    /// `setBaseAndExtent`
    pub fn set_base_and_extent(
        &mut self,
        anchor_node: NodeId,
        anchor_offset: usize,
        focus_node: NodeId,
        focus_offset: usize,
    ) -> DomResult<()> {
        self.check_point(anchor_node, anchor_offset)?;
        self.check_point(focus_node, focus_offset)?;
        if !self.in_document(anchor_node) || !self.in_document(focus_node) {
            return Ok(());
        }
        self.select(
            BoundaryPoint::new(anchor_node, anchor_offset),
            BoundaryPoint::new(focus_node, focus_offset),
        )
    }

    /// `selectAllChildren`
    pub fn select_all_children(&mut self, node: NodeId) -> DomResult<()> {
        if self.tree.node(node)?.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType("doctype has no children"));
        }
        if !self.in_document(node) {
            return Ok(());
        }
        let length = self.tree.node_length(node);
        self.select(BoundaryPoint::new(node, 0), BoundaryPoint::new(node, length))
    }

    /// `containsNode`
    pub fn contains_node(&self, node: NodeId, allow_partial: bool) -> bool {
        let Some(range) = self.current() else {
            return false;
        };
        if !self.in_document(node) {
            return false;
        }
        let first = BoundaryPoint::new(node, 0);
        let last = BoundaryPoint::new(node, self.tree.node_length(node));
        let cmp = |a, b| self.tree.compare_boundary_points(a, b);
        if allow_partial {
            cmp(range.start(), last) != Some(Ordering::Greater)
                && cmp(range.end(), first) != Some(Ordering::Less)
        } else {
            cmp(range.start(), first) != Some(Ordering::Greater)
                && cmp(range.end(), last) != Some(Ordering::Less)
        }
    }

    /// `deleteFromDocument`
    pub fn delete_from_document(&mut self) -> DomResult<()> {
        if let Some(mut range) = self.state().range.and_then(|id| self.tree.range_mut(id)) {
            range.delete_contents()?;
        }
        Ok(())
    }

    /// `toString`
    pub fn text(&self) -> String {
        self.current().map(|r| r.text(self.tree)).unwrap_or_default()
    }
}
