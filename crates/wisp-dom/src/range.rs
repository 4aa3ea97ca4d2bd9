//! Range API
//!
//! A range is a pair of boundary points in one tree. Ranges are live: the
//! tree keeps every unreleased range in a registry and repairs its
//! boundaries on insertion, removal, data replacement, text splitting and
//! normalization. Read-only algorithms live on [`Range`]; editing goes
//! through [`RangeMut`], which borrows the tree mutably.

use std::cmp::Ordering;

use crate::node::NodeKind;
use crate::order::BoundaryPoint;
use crate::{DomError, DomResult, DomTree, NodeId};

/// Handle to a live range
///
/// Slots are reused once released; the generation tells a stale handle
/// apart from the range that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeId {
    index: u32,
    generation: u32,
}

/// `compareBoundaryPoints` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum How {
    StartToStart = 0,
    StartToEnd = 1,
    EndToEnd = 2,
    EndToStart = 3,
}

/// Range - a contiguous part of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

#[derive(Debug)]
struct RangeSlot {
    range: Range,
    generation: u32,
    live: bool,
}

/// Slab of live ranges with a free list
#[derive(Debug, Default)]
pub(crate) struct RangeRegistry {
    slots: Vec<RangeSlot>,
    free: Vec<u32>,
}

impl RangeRegistry {
    fn insert(&mut self, range: Range) -> RangeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.generation = slot.generation.wrapping_add(1);
                slot.range = range;
                slot.live = true;
                return RangeId { index, generation: slot.generation };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(RangeSlot { range, generation: 0, live: true });
        RangeId { index, generation: 0 }
    }

    fn slot(&self, id: RangeId) -> Option<&RangeSlot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: RangeId) -> Option<&mut RangeSlot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    fn remove(&mut self, id: RangeId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.live = false;
            self.free.push(id.index);
        }
    }

    fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Allocated slots, live or free
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Range {
    #[inline]
    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    #[inline]
    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    #[inline]
    pub fn start_container(&self) -> NodeId {
        self.start.node
    }

    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start.offset
    }

    #[inline]
    pub fn end_container(&self) -> NodeId {
        self.end.node
    }

    #[inline]
    pub fn end_offset(&self) -> usize {
        self.end.offset
    }

    /// Check if the range is collapsed
    #[inline]
    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Root of the tree the range lives in
    pub fn root(&self, tree: &DomTree) -> NodeId {
        tree.root(self.start.node)
    }

    /// `commonAncestorContainer`
    pub fn common_ancestor_container(&self, tree: &DomTree) -> NodeId {
        tree.common_ancestor(self.start.node, self.end.node)
    }

    fn check_point(tree: &DomTree, node: NodeId, offset: usize) -> DomResult<()> {
        if tree.node(node)?.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType("doctype cannot hold a boundary point"));
        }
        let length = tree.node_length(node);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        Ok(())
    }

    /// `comparePoint`: `Less` before the range, `Greater` after it
    pub fn compare_point(&self, tree: &DomTree, node: NodeId, offset: usize) -> DomResult<Ordering> {
        if tree.root(node) != self.root(tree) {
            return Err(DomError::WrongDocument("point is in a different tree"));
        }
        Self::check_point(tree, node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        if tree.compare_boundary_points(point, self.start) == Some(Ordering::Less) {
            return Ok(Ordering::Less);
        }
        if tree.compare_boundary_points(point, self.end) == Some(Ordering::Greater) {
            return Ok(Ordering::Greater);
        }
        Ok(Ordering::Equal)
    }

    /// `isPointInRange`
    pub fn is_point_in_range(&self, tree: &DomTree, node: NodeId, offset: usize) -> DomResult<bool> {
        if tree.root(node) != self.root(tree) {
            return Ok(false);
        }
        Self::check_point(tree, node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        let before = tree.compare_boundary_points(point, self.start) == Some(Ordering::Less);
        let after = tree.compare_boundary_points(point, self.end) == Some(Ordering::Greater);
        Ok(!before && !after)
    }

    /// `intersectsNode`
    pub fn intersects_node(&self, tree: &DomTree, node: NodeId) -> bool {
        if tree.get(node).is_none() || tree.root(node) != self.root(tree) {
            return false;
        }
        let Some(parent) = tree.parent(node) else {
            return true;
        };
        let offset = tree.index_of(node);
        tree.compare_boundary_points(BoundaryPoint::new(parent, offset), self.end) == Some(Ordering::Less)
            && tree.compare_boundary_points(BoundaryPoint::new(parent, offset + 1), self.start)
                == Some(Ordering::Greater)
    }

    /// `compareBoundaryPoints` against `source`
    pub fn compare_boundary_points(&self, tree: &DomTree, how: How, source: &Range) -> DomResult<Ordering> {
        if self.root(tree) != source.root(tree) {
            return Err(DomError::WrongDocument("ranges are in different trees"));
        }
        let (this, other) = match how {
            How::StartToStart => (self.start, source.start),
            How::StartToEnd => (self.end, source.start),
            How::EndToEnd => (self.end, source.end),
            How::EndToStart => (self.start, source.end),
        };
        tree.compare_boundary_points(this, other)
            .ok_or(DomError::WrongDocument("ranges are in different trees"))
    }

    /// `toString`: text covered by the range
    pub fn text(&self, tree: &DomTree) -> String {
        let (start, end) = (self.start, self.end);
        let is_text = |n: NodeId| tree.kind(n) == Some(NodeKind::Text);
        let substring = |n: NodeId, from: usize, count: usize| {
            tree.substring_data(n, from, count).unwrap_or_default()
        };
        if start.node == end.node && is_text(start.node) {
            return substring(start.node, start.offset, end.offset.saturating_sub(start.offset));
        }

        let mut out = String::new();
        if is_text(start.node) {
            out.push_str(&substring(start.node, start.offset, usize::MAX));
        }
        let ancestor = tree.common_ancestor(start.node, end.node);
        for n in tree.descendants(ancestor) {
            if is_text(n) && tree.is_contained(n, start, end) {
                out.push_str(tree.data(n).unwrap_or(""));
            }
        }
        if is_text(end.node) {
            out.push_str(&substring(end.node, 0, end.offset));
        }
        out
    }
}

/// Mutable access to one live range
pub struct RangeMut<'a> {
    tree: &'a mut DomTree,
    id: RangeId,
}

impl DomTree {
    /// `createRange`: collapsed at the start of `doc`
    pub fn create_range(&mut self, doc: NodeId) -> DomResult<RangeId> {
        self.node(doc)?;
        let point = BoundaryPoint::new(doc, 0);
        Ok(self.register_range(Range { start: point, end: point }))
    }

    pub(crate) fn register_range(&mut self, range: Range) -> RangeId {
        self.ranges.insert(range)
    }

    /// Current boundaries of a live range
    pub fn range(&self, id: RangeId) -> Option<&Range> {
        self.ranges.slot(id).map(|slot| &slot.range)
    }

    /// Editing handle for a live range
    pub fn range_mut(&mut self, id: RangeId) -> Option<RangeMut<'_>> {
        self.range(id)?;
        Some(RangeMut { tree: self, id })
    }

    /// Stop tracking a range; its handle becomes invalid
    pub fn release_range(&mut self, id: RangeId) {
        self.ranges.remove(id);
    }

    /// Number of ranges still repaired on mutation
    pub fn live_range_count(&self) -> usize {
        self.ranges.live()
    }

    pub(crate) fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        self.inclusive_ancestors(a)
            .find(|&anc| self.is_inclusive_ancestor(anc, b))
            .unwrap_or(a)
    }

    /// Whole node lies between `start` and `end`
    pub(crate) fn is_contained(&self, node: NodeId, start: BoundaryPoint, end: BoundaryPoint) -> bool {
        self.root(node) == self.root(start.node)
            && self.compare_boundary_points(BoundaryPoint::new(node, 0), start) == Some(Ordering::Greater)
            && self.compare_boundary_points(BoundaryPoint::new(node, self.node_length(node)), end)
                == Some(Ordering::Less)
    }

    /// Node holds exactly one of the two boundaries
    fn is_partially_contained(&self, node: NodeId, start: BoundaryPoint, end: BoundaryPoint) -> bool {
        self.is_inclusive_ancestor(node, start.node) != self.is_inclusive_ancestor(node, end.node)
    }

    fn is_character_data(&self, node: NodeId) -> bool {
        self.kind(node).is_some_and(NodeKind::is_character_data)
    }

    /// Where a range collapses after its contents leave the tree
    fn collapse_point(&self, start: BoundaryPoint, end: BoundaryPoint) -> BoundaryPoint {
        if self.is_inclusive_ancestor(start.node, end.node) {
            return start;
        }
        let mut reference = start.node;
        while let Some(parent) = self.parent(reference) {
            if self.is_inclusive_ancestor(parent, end.node) {
                return BoundaryPoint::new(parent, self.index_of(reference) + 1);
            }
            reference = parent;
        }
        start
    }

    /// Shallow copy of a character data node holding `data`
    fn copy_with_data(&mut self, node: NodeId, data: &str) -> DomResult<NodeId> {
        let doc = self.node(node)?.owner_document;
        let copy = self.alloc_copy(node, doc)?;
        self.set_data(copy, data)?;
        Ok(copy)
    }

    fn delete_between(&mut self, start: BoundaryPoint, end: BoundaryPoint) -> DomResult<BoundaryPoint> {
        if start == end {
            return Ok(start);
        }
        if start.node == end.node && self.is_character_data(start.node) {
            self.replace_data(start.node, start.offset, end.offset - start.offset, "")?;
            return Ok(start);
        }

        let ancestor = self.common_ancestor(start.node, end.node);
        let to_remove: Vec<NodeId> = self
            .descendants(ancestor)
            .filter(|&n| {
                self.is_contained(n, start, end)
                    && !self.parent(n).is_some_and(|p| self.is_contained(p, start, end))
            })
            .collect();
        let point = self.collapse_point(start, end);

        if self.is_character_data(start.node) {
            let length = self.node_length(start.node);
            self.replace_data(start.node, start.offset, length - start.offset, "")?;
        }
        for node in to_remove {
            self.remove(node);
        }
        if self.is_character_data(end.node) {
            self.replace_data(end.node, 0, end.offset, "")?;
        }
        Ok(point)
    }

    /// Extract or clone the contents between two points into a new fragment
    fn transfer_between(
        &mut self,
        start: BoundaryPoint,
        end: BoundaryPoint,
        extract: bool,
    ) -> DomResult<(NodeId, BoundaryPoint)> {
        let doc = self.node(start.node)?.owner_document;
        let fragment = self.create_document_fragment(doc)?;
        if start == end {
            return Ok((fragment, start));
        }

        if start.node == end.node && self.is_character_data(start.node) {
            let count = end.offset - start.offset;
            let data = self.substring_data(start.node, start.offset, count)?;
            let copy = self.copy_with_data(start.node, &data)?;
            self.insert(copy, fragment, None)?;
            if extract {
                self.replace_data(start.node, start.offset, count, "")?;
            }
            return Ok((fragment, start));
        }

        let ancestor = self.common_ancestor(start.node, end.node);
        let first_partial = if self.is_inclusive_ancestor(start.node, end.node) {
            None
        } else {
            self.children(ancestor)
                .find(|&c| self.is_partially_contained(c, start, end))
        };
        let last_partial = if self.is_inclusive_ancestor(end.node, start.node) {
            None
        } else {
            self.children(ancestor)
                .filter(|&c| self.is_partially_contained(c, start, end))
                .last()
        };
        let contained: Vec<NodeId> = self
            .children(ancestor)
            .filter(|&c| self.is_contained(c, start, end))
            .collect();
        if contained.iter().any(|&c| self.kind(c) == Some(NodeKind::DocumentType)) {
            return Err(DomError::HierarchyRequest("range contains a doctype"));
        }
        let point = self.collapse_point(start, end);

        if let Some(first) = first_partial {
            if self.is_character_data(first) {
                let count = self.node_length(start.node) - start.offset;
                let data = self.substring_data(start.node, start.offset, count)?;
                let copy = self.copy_with_data(start.node, &data)?;
                self.insert(copy, fragment, None)?;
                if extract {
                    self.replace_data(start.node, start.offset, count, "")?;
                }
            } else {
                let copy = self.alloc_copy(first, doc)?;
                self.insert(copy, fragment, None)?;
                let inner_end = BoundaryPoint::new(first, self.node_length(first));
                let (inner, _) = self.transfer_between(start, inner_end, extract)?;
                self.insert(inner, copy, None)?;
            }
        }

        for child in contained {
            let moved = if extract { child } else { self.clone_node(child, true)? };
            self.insert(moved, fragment, None)?;
        }

        if let Some(last) = last_partial {
            if self.is_character_data(last) {
                let data = self.substring_data(end.node, 0, end.offset)?;
                let copy = self.copy_with_data(end.node, &data)?;
                self.insert(copy, fragment, None)?;
                if extract {
                    self.replace_data(end.node, 0, end.offset, "")?;
                }
            } else {
                let copy = self.alloc_copy(last, doc)?;
                self.insert(copy, fragment, None)?;
                let inner_start = BoundaryPoint::new(last, 0);
                let (inner, _) = self.transfer_between(inner_start, end, extract)?;
                self.insert(inner, copy, None)?;
            }
        }
        Ok((fragment, point))
    }

    fn update_boundaries(&mut self, mut update: impl FnMut(&DomTree, &mut BoundaryPoint)) {
        for i in 0..self.ranges.slots.len() {
            if !self.ranges.slots[i].live {
                continue;
            }
            let mut range = self.ranges.slots[i].range;
            update(self, &mut range.start);
            update(self, &mut range.end);
            self.ranges.slots[i].range = range;
        }
    }

    pub(crate) fn ranges_on_insert(&mut self, parent: NodeId, index: usize, count: usize) {
        self.update_boundaries(|_, bp| {
            if bp.node == parent && bp.offset > index {
                bp.offset += count;
            }
        });
    }

    pub(crate) fn ranges_on_remove(&mut self, node: NodeId, parent: NodeId, index: usize) {
        self.update_boundaries(|tree, bp| {
            if tree.is_inclusive_ancestor(node, bp.node) {
                *bp = BoundaryPoint::new(parent, index);
            } else if bp.node == parent && bp.offset > index {
                bp.offset -= 1;
            }
        });
    }

    pub(crate) fn ranges_on_replace_data(&mut self, node: NodeId, offset: usize, count: usize, added: usize) {
        self.update_boundaries(|_, bp| {
            if bp.node != node {
                return;
            }
            if bp.offset > offset && bp.offset <= offset + count {
                bp.offset = offset;
            } else if bp.offset > offset + count {
                bp.offset = bp.offset + added - count;
            }
        });
    }

    pub(crate) fn ranges_on_split(&mut self, node: NodeId, new_node: NodeId, parent: NodeId, offset: usize) {
        let after = self.index_of(node) + 1;
        self.update_boundaries(|_, bp| {
            if bp.node == node && bp.offset > offset {
                *bp = BoundaryPoint::new(new_node, bp.offset - offset);
            } else if bp.node == parent && bp.offset == after {
                bp.offset += 1;
            }
        });
    }

    pub(crate) fn ranges_on_merge(&mut self, text: NodeId, next: NodeId, parent: NodeId, length: usize) {
        let index = self.index_of(next);
        self.update_boundaries(|_, bp| {
            if bp.node == next {
                *bp = BoundaryPoint::new(text, length + bp.offset);
            } else if bp.node == parent && bp.offset == index {
                *bp = BoundaryPoint::new(text, length);
            }
        });
    }
}

impl RangeMut<'_> {
    #[inline]
    pub fn id(&self) -> RangeId {
        self.id
    }

    /// Current boundaries
    pub fn range(&self) -> Range {
        self.tree.ranges.slots[self.id.index as usize].range
    }

    /// Tree the range lives in
    pub fn tree(&self) -> &DomTree {
        self.tree
    }

    fn set(&mut self, start: BoundaryPoint, end: BoundaryPoint) {
        if let Some(slot) = self.tree.ranges.slot_mut(self.id) {
            slot.range = Range { start, end };
        }
    }

    /// `setStart`: an end before the new start collapses onto it
    pub fn set_start(&mut self, node: NodeId, offset: usize) -> DomResult<()> {
        Range::check_point(self.tree, node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        let range = self.range();
        let end = if self.tree.root(node) != range.root(self.tree)
            || self.tree.compare_boundary_points(point, range.end) == Some(Ordering::Greater)
        {
            point
        } else {
            range.end
        };
        self.set(point, end);
        Ok(())
    }

    /// `setEnd`: a start after the new end collapses onto it
    pub fn set_end(&mut self, node: NodeId, offset: usize) -> DomResult<()> {
        Range::check_point(self.tree, node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        let range = self.range();
        let start = if self.tree.root(node) != range.root(self.tree)
            || self.tree.compare_boundary_points(point, range.start) == Some(Ordering::Less)
        {
            point
        } else {
            range.start
        };
        self.set(start, point);
        Ok(())
    }

    fn parent_point(&self, node: NodeId) -> DomResult<(NodeId, usize)> {
        let parent = self
            .tree
            .parent(node)
            .ok_or(DomError::InvalidNodeType("node has no parent"))?;
        Ok((parent, self.tree.index_of(node)))
    }

    pub fn set_start_before(&mut self, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_point(node)?;
        self.set_start(parent, index)
    }

    pub fn set_start_after(&mut self, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_point(node)?;
        self.set_start(parent, index + 1)
    }

    pub fn set_end_before(&mut self, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_point(node)?;
        self.set_end(parent, index)
    }

    pub fn set_end_after(&mut self, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_point(node)?;
        self.set_end(parent, index + 1)
    }

    /// `collapse(toStart)`
    pub fn collapse(&mut self, to_start: bool) {
        let range = self.range();
        let point = if to_start { range.start } else { range.end };
        self.set(point, point);
    }

    /// `selectNode`
    pub fn select_node(&mut self, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_point(node)?;
        self.set(BoundaryPoint::new(parent, index), BoundaryPoint::new(parent, index + 1));
        Ok(())
    }

    /// `selectNodeContents`
    pub fn select_node_contents(&mut self, node: NodeId) -> DomResult<()> {
        if self.tree.node(node)?.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType("doctype has no contents"));
        }
        let length = self.tree.node_length(node);
        self.set(BoundaryPoint::new(node, 0), BoundaryPoint::new(node, length));
        Ok(())
    }

    /// `deleteContents`
    pub fn delete_contents(&mut self) -> DomResult<()> {
        let range = self.range();
        let point = self.tree.delete_between(range.start, range.end)?;
        self.set(point, point);
        Ok(())
    }

    /// `extractContents`: move the covered content into a new fragment
    pub fn extract_contents(&mut self) -> DomResult<NodeId> {
        let range = self.range();
        let (fragment, point) = self.tree.transfer_between(range.start, range.end, true)?;
        self.set(point, point);
        Ok(fragment)
    }

    /// `cloneContents`
    pub fn clone_contents(&mut self) -> DomResult<NodeId> {
        let range = self.range();
        let (fragment, _) = self.tree.transfer_between(range.start, range.end, false)?;
        Ok(fragment)
    }

    /// `insertNode`: insert at the start boundary, splitting text if needed
    pub fn insert_node(&mut self, node: NodeId) -> DomResult<()> {
        let start = self.range().start;
        let start_kind = self.tree.node(start.node)?.kind();
        let detached_text =
            start_kind == NodeKind::Text && self.tree.parent(start.node).is_none();
        if matches!(start_kind, NodeKind::ProcessingInstruction | NodeKind::Comment)
            || detached_text
            || start.node == node
        {
            return Err(DomError::HierarchyRequest("cannot insert at this boundary"));
        }

        let mut reference = if start_kind == NodeKind::Text {
            Some(start.node)
        } else {
            self.tree.child_at(start.node, start.offset)
        };
        let parent = match reference {
            Some(r) => self
                .tree
                .parent(r)
                .ok_or(DomError::HierarchyRequest("cannot insert at this boundary"))?,
            None => start.node,
        };
        self.tree.ensure_pre_insertion_validity(node, parent, reference)?;

        if start_kind == NodeKind::Text {
            reference = Some(self.tree.split_text(start.node, start.offset)?);
        }
        if reference == Some(node) {
            reference = self.tree.next_sibling(node);
        }
        self.tree.remove(node);

        let mut new_offset = match reference {
            Some(r) => self.tree.index_of(r),
            None => self.tree.child_count(parent),
        };
        new_offset += if self.tree.kind(node) == Some(NodeKind::DocumentFragment) {
            self.tree.child_count(node)
        } else {
            1
        };
        self.tree.pre_insert(node, parent, reference)?;

        let range = self.range();
        if range.collapsed() {
            self.set(range.start, BoundaryPoint::new(parent, new_offset));
        }
        Ok(())
    }

    /// `surroundContents`: wrap the covered content in `new_parent`
    pub fn surround_contents(&mut self, new_parent: NodeId) -> DomResult<()> {
        let range = self.range();
        let tree = &*self.tree;
        let partial_non_text = |from: NodeId, other: NodeId| {
            tree.inclusive_ancestors(from).any(|a| {
                !tree.is_inclusive_ancestor(a, other) && tree.kind(a) != Some(NodeKind::Text)
            })
        };
        if partial_non_text(range.start.node, range.end.node)
            || partial_non_text(range.end.node, range.start.node)
        {
            return Err(DomError::InvalidState("range partially contains a non-text node"));
        }
        match self.tree.node(new_parent)?.kind() {
            NodeKind::Document
            | NodeKind::DocumentType
            | NodeKind::DocumentFragment
            | NodeKind::ShadowRoot => {
                return Err(DomError::InvalidNodeType("cannot surround with this node"));
            }
            _ => {}
        }

        let fragment = self.extract_contents()?;
        if self.tree.first_child(new_parent).is_some() {
            self.tree.replace_all(new_parent, None)?;
        }
        self.insert_node(new_parent)?;
        self.tree.append_child(new_parent, fragment)?;
        self.select_node(new_parent)
    }

    /// `cloneRange`
    pub fn clone_range(&mut self) -> RangeId {
        let range = self.range();
        self.tree.register_range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocumentKind;

    /// doc > body > p > ("Hello ", b > "bold", " world")
    fn paragraph() -> (DomTree, NodeId, NodeId, [NodeId; 4]) {
        let mut tree = DomTree::new();
        let doc = tree.create_document(DocumentKind::Html, "about:blank").unwrap();
        let body = tree.create_element(doc, "body").unwrap();
        tree.append_child(doc, body).unwrap();
        let p = tree.create_element(doc, "p").unwrap();
        tree.append_child(body, p).unwrap();
        let hello = tree.create_text_node(doc, "Hello ").unwrap();
        let b = tree.create_element(doc, "b").unwrap();
        let bold = tree.create_text_node(doc, "bold").unwrap();
        let world = tree.create_text_node(doc, " world").unwrap();
        tree.append_child(p, hello).unwrap();
        tree.append_child(p, b).unwrap();
        tree.append_child(b, bold).unwrap();
        tree.append_child(p, world).unwrap();
        (tree, doc, p, [hello, b, bold, world])
    }

    #[test]
    fn test_new_range_collapsed_at_document() {
        let (mut tree, doc, _, _) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let range = tree.range(r).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start_container(), doc);
        assert_eq!(range.start_offset(), 0);
    }

    #[test]
    fn test_set_end_before_start_collapses() {
        let (mut tree, doc, p, _) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(p, 2).unwrap();
        range.set_end(p, 1).unwrap();
        let range = range.range();
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(p, 1));
    }

    #[test]
    fn test_offset_validation() {
        let (mut tree, doc, p, [hello, ..]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        assert!(matches!(range.set_start(p, 4), Err(DomError::IndexSize { .. })));
        assert!(range.set_start(hello, 6).is_ok());
        assert!(range.set_start(hello, 7).is_err());
    }

    #[test]
    fn test_text_across_nodes() {
        let (mut tree, doc, _, [hello, _, _, world]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 2).unwrap();
        range.set_end(world, 3).unwrap();
        assert_eq!(tree.range(r).unwrap().text(&tree), "llo bold wo");
    }

    #[test]
    fn test_delete_contents_across_containers() {
        let (mut tree, doc, p, [hello, b, _, world]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 2).unwrap();
        range.set_end(world, 3).unwrap();
        range.delete_contents().unwrap();

        assert_eq!(tree.text_content(p).as_deref(), Some("Herld"));
        assert_eq!(tree.parent(b), None);
        let range = tree.range(r).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(p, 1));
    }

    #[test]
    fn test_extract_contents_builds_fragment() {
        let (mut tree, doc, p, [hello, _, bold, _]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 3).unwrap();
        range.set_end(bold, 2).unwrap();
        let frag = range.extract_contents().unwrap();

        assert_eq!(tree.text_content(frag).as_deref(), Some("lo bo"));
        assert_eq!(tree.text_content(p).as_deref(), Some("Helld world"));
        // the partially selected <b> is cloned into the fragment and kept in place
        let copied_b = tree.last_child(frag).unwrap();
        assert_eq!(tree.element(copied_b).unwrap().local_name(), "b");
        assert_eq!(tree.range(r).unwrap().start(), BoundaryPoint::new(p, 1));
    }

    #[test]
    fn test_clone_contents_leaves_tree() {
        let (mut tree, doc, p, [hello, _, _, world]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 0).unwrap();
        range.set_end(world, 6).unwrap();
        let frag = range.clone_contents().unwrap();
        assert_eq!(tree.text_content(frag).as_deref(), Some("Hello bold world"));
        assert_eq!(tree.text_content(p).as_deref(), Some("Hello bold world"));
    }

    #[test]
    fn test_insert_node_splits_text() {
        let (mut tree, doc, p, [hello, ..]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let img = tree.create_element(doc, "img").unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 2).unwrap();
        range.collapse(true);
        range.insert_node(img).unwrap();

        assert_eq!(tree.data(hello), Some("He"));
        assert_eq!(tree.next_sibling(hello), Some(img));
        assert_eq!(tree.child_count(p), 5);
        let range = tree.range(r).unwrap();
        assert_eq!(range.start(), BoundaryPoint::new(hello, 2));
        assert_eq!(range.end(), BoundaryPoint::new(p, 2));
    }

    #[test]
    fn test_surround_contents() {
        let (mut tree, doc, p, [hello, ..]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let em = tree.create_element(doc, "em").unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 0).unwrap();
        range.set_end(hello, 5).unwrap();
        range.surround_contents(em).unwrap();

        assert_eq!(tree.text_content(em).as_deref(), Some("Hello"));
        assert_eq!(tree.parent(em), Some(p));
        let range = tree.range(r).unwrap();
        assert_eq!(range.start_container(), p);
        assert_eq!(range.end_offset(), range.start_offset() + 1);
    }

    #[test]
    fn test_surround_rejects_partial_element() {
        let (mut tree, doc, _, [hello, _, bold, _]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        let em = tree.create_element(doc, "em").unwrap();
        let mut range = tree.range_mut(r).unwrap();
        range.set_start(hello, 1).unwrap();
        range.set_end(bold, 1).unwrap();
        let err = range.surround_contents(em).unwrap_err();
        assert_eq!(err.exception_name(), Some("InvalidStateError"));
    }

    #[test]
    fn test_live_repair_on_remove() {
        let (mut tree, doc, p, [_, b, bold, _]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        tree.range_mut(r).unwrap().set_start(bold, 2).unwrap();
        tree.range_mut(r).unwrap().set_end(p, 3).unwrap();

        tree.remove_child(p, b).unwrap();
        let range = tree.range(r).unwrap();
        assert_eq!(range.start(), BoundaryPoint::new(p, 1));
        assert_eq!(range.end(), BoundaryPoint::new(p, 2));
    }

    #[test]
    fn test_live_repair_on_insert_and_data() {
        let (mut tree, doc, p, [hello, ..]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        tree.range_mut(r).unwrap().set_start(hello, 4).unwrap();
        tree.range_mut(r).unwrap().set_end(p, 3).unwrap();

        tree.insert_data(hello, 0, "Oh, ").unwrap();
        assert_eq!(tree.range(r).unwrap().start_offset(), 8);
        tree.delete_data(hello, 2, 10).unwrap();
        assert_eq!(tree.range(r).unwrap().start_offset(), 2);

        let first = tree.create_comment(doc, "c").unwrap();
        tree.insert_before(p, first, Some(hello)).unwrap();
        assert_eq!(tree.range(r).unwrap().end(), BoundaryPoint::new(p, 4));
    }

    #[test]
    fn test_released_range_stops_tracking() {
        let (mut tree, doc, _, _) = paragraph();
        let r = tree.create_range(doc).unwrap();
        assert_eq!(tree.live_range_count(), 1);
        tree.release_range(r);
        assert!(tree.range(r).is_none());
        assert!(tree.range_mut(r).is_none());
        assert_eq!(tree.live_range_count(), 0);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let (mut tree, doc, p, _) = paragraph();
        let first = tree.create_range(doc).unwrap();
        tree.release_range(first);
        let second = tree.create_range(doc).unwrap();
        assert_ne!(first, second);
        assert_eq!(tree.ranges.capacity(), 1);

        // The stale handle must not reach the range now in its slot
        tree.release_range(first);
        assert!(tree.range_mut(first).is_none());
        assert_eq!(tree.live_range_count(), 1);
        tree.range_mut(second).unwrap().select_node_contents(p).unwrap();
        assert_eq!(tree.range(second).unwrap().start_container(), p);
    }

    #[test]
    fn test_compare_point_and_intersects() {
        let (mut tree, doc, p, [hello, b, _, world]) = paragraph();
        let r = tree.create_range(doc).unwrap();
        tree.range_mut(r).unwrap().select_node(b).unwrap();
        let range = *tree.range(r).unwrap();

        assert_eq!(range.compare_point(&tree, hello, 0).unwrap(), Ordering::Less);
        assert_eq!(range.compare_point(&tree, world, 0).unwrap(), Ordering::Greater);
        assert_eq!(range.compare_point(&tree, p, 1).unwrap(), Ordering::Equal);
        assert!(range.intersects_node(&tree, b));
        assert!(!range.intersects_node(&tree, world));
        assert_eq!(range.common_ancestor_container(&tree), p);

        let stray = tree.create_element(doc, "i").unwrap();
        assert!(matches!(range.compare_point(&tree, stray, 0), Err(DomError::WrongDocument(_))));
        assert!(!range.is_point_in_range(&tree, stray, 0).unwrap());
    }
}
