//! Character Data
//!
//! Text, comment and processing-instruction data edits. Offsets count
//! Unicode scalar values.

use crate::node::{NodeData, NodeKind};
use crate::{DomError, DomResult, DomTree, NodeId};

/// Byte position of the `offset`-th character, clamped to the end
pub(crate) fn byte_offset(s: &str, offset: usize) -> usize {
    s.char_indices().nth(offset).map_or(s.len(), |(i, _)| i)
}

impl DomTree {
    fn data_of(&self, node: NodeId) -> DomResult<&str> {
        self.node(node)?
            .character_data()
            .ok_or(DomError::InvalidNodeType("not a character data node"))
    }

    /// `data`
    pub fn data(&self, node: NodeId) -> Option<&str> {
        self.get(node)?.character_data()
    }

    /// `length` in characters
    pub fn data_length(&self, node: NodeId) -> usize {
        self.data(node).map_or(0, |s| s.chars().count())
    }

    /// `substringData`
    pub fn substring_data(&self, node: NodeId, offset: usize, count: usize) -> DomResult<String> {
        let data = self.data_of(node)?;
        let length = data.chars().count();
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        Ok(data.chars().skip(offset).take(count).collect())
    }

    /// `replaceData`
    pub fn replace_data(
        &mut self,
        node: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) -> DomResult<()> {
        let current = self.data_of(node)?;
        let length = current.chars().count();
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        let count = count.min(length - offset);
        let start = byte_offset(current, offset);
        let end = start + byte_offset(&current[start..], count);

        if let Some(text) = self.arena.get_mut(node).and_then(|n| n.character_data_mut()) {
            text.replace_range(start..end, data);
        }
        self.ranges_on_replace_data(node, offset, count, data.chars().count());
        if let Some(doc) = self.owner_document(node) {
            self.bump_generation(doc);
        }
        Ok(())
    }

    /// `appendData`
    pub fn append_data(&mut self, node: NodeId, data: &str) -> DomResult<()> {
        let length = self.data_length(node);
        self.replace_data(node, length, 0, data)
    }

    /// `insertData`
    pub fn insert_data(&mut self, node: NodeId, offset: usize, data: &str) -> DomResult<()> {
        self.replace_data(node, offset, 0, data)
    }

    /// `deleteData`
    pub fn delete_data(&mut self, node: NodeId, offset: usize, count: usize) -> DomResult<()> {
        self.replace_data(node, offset, count, "")
    }

    /// `data` setter
    pub fn set_data(&mut self, node: NodeId, data: &str) -> DomResult<()> {
        let length = self.data_of(node)?.chars().count();
        self.replace_data(node, 0, length, data)
    }

    /// `splitText`: the tail after `offset` becomes a new following sibling
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> DomResult<NodeId> {
        if self.node(node)?.kind() != NodeKind::Text {
            return Err(DomError::InvalidNodeType("not a text node"));
        }
        let length = self.data_length(node);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        let count = length - offset;
        let tail = self.substring_data(node, offset, count)?;
        let doc = self.node(node)?.owner_document;
        let new_node = self.create_text_node(doc, &tail)?;

        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert(new_node, parent, next)?;
            self.ranges_on_split(node, new_node, parent, offset);
        }
        self.replace_data(node, offset, count, "")?;
        Ok(new_node)
    }

    /// `wholeText`: data of the contiguous run of text siblings
    pub fn whole_text(&self, node: NodeId) -> Option<String> {
        if self.kind(node) != Some(NodeKind::Text) {
            return None;
        }
        let is_text = |n: &NodeId| self.kind(*n) == Some(NodeKind::Text);
        let mut first = node;
        while let Some(prev) = self.prev_sibling(first).filter(is_text) {
            first = prev;
        }
        let mut out = String::new();
        let run = std::iter::successors(Some(first), |&n| self.next_sibling(n)).take_while(is_text);
        for n in run {
            if let Some(NodeData::Text(s)) = self.get(n).map(|n| n.data()) {
                out.push_str(s);
            }
        }
        Some(out)
    }
}
