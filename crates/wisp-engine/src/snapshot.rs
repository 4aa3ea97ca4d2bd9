//! Serializable tree dumps
//!
//! A flat, pre-order list of nodes with parent links and depths. Flat output
//! keeps serialization independent of tree depth.

use serde::Serialize;
use wisp_dom::{DomTree, NodeData, NodeId, QuirksMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSnapshot {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub depth: usize,
    pub node_type: u16,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quirks_mode: Option<&'static str>,
    pub nodes: Vec<NodeSnapshot>,
}

impl TreeSnapshot {
    /// Capture `root` and its descendants in tree order. Template contents
    /// are listed under their template.
    pub fn capture(tree: &DomTree, root: NodeId) -> Self {
        let document = tree.get(root).and_then(|n| n.as_document());
        let url = document.map(|d| d.url().to_string());
        let quirks_mode = document.map(|d| match d.quirks_mode() {
            QuirksMode::NoQuirks => "no-quirks",
            QuirksMode::LimitedQuirks => "limited-quirks",
            QuirksMode::Quirks => "quirks",
        });

        let mut nodes = Vec::new();
        let mut stack = vec![(root, None, 0usize)];
        while let Some((id, parent, depth)) = stack.pop() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            let attributes = node
                .as_element()
                .map(|e| {
                    e.attributes()
                        .iter()
                        .map(|a| AttributeSnapshot { name: a.name.clone(), value: a.value.clone() })
                        .collect()
                })
                .unwrap_or_default();
            let value = match node.data() {
                NodeData::DocumentType { public_id, system_id, .. } if !public_id.is_empty() || !system_id.is_empty() => {
                    Some(format!("{public_id} {system_id}").trim().to_string())
                }
                _ => node.character_data().map(str::to_string),
            };
            nodes.push(NodeSnapshot {
                id: id.to_raw(),
                parent: parent.map(NodeId::to_raw),
                depth,
                node_type: node.node_type().value(),
                name: node.node_name(),
                value,
                attributes,
            });

            let start = stack.len();
            let source = node.as_element().and_then(|e| e.template_contents()).unwrap_or(id);
            stack.extend(tree.children(source).map(|c| (c, Some(id), depth + 1)));
            stack[start..].reverse();
        }
        Self { url, quirks_mode, nodes }
    }

    /// Indented, one line per node
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            for _ in 0..node.depth {
                out.push_str("  ");
            }
            out.push_str(&node.name);
            for attr in &node.attributes {
                out.push_str(&format!(" {}={:?}", attr.name, attr.value));
            }
            if let Some(value) = &node.value {
                out.push_str(&format!(" {value:?}"));
            }
            out.push('\n');
        }
        out
    }
}
