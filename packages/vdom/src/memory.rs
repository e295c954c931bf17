//! In-memory host tree.
//!
//! `MemoryHost` is an arena-backed stand-in for a real render target. Every
//! mutation issued through [`HostAdapter`] is appended to a log so callers can
//! assert on exactly what the reconciler did. Detached nodes stay in the arena;
//! handles are never reused.

use crate::error::{HostError, HostResult};
use crate::host::{HostAdapter, HostQuery};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded host mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum HostMutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, value: String },
    Insert { parent: NodeId, child: NodeId, index: usize },
    Replace { parent: NodeId, old: NodeId, new: NodeId },
    Remove { parent: NodeId, child: NodeId },
    Move { parent: NodeId, child: NodeId, from: usize, to: usize },
}

/// Per-kind counts over a mutation log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MutationCounts {
    pub created: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub removed: usize,
    pub moved: usize,
}

impl MutationCounts {
    pub fn total(&self) -> usize {
        self.created + self.inserted + self.replaced + self.removed + self.moved
    }
}

#[derive(Debug, Clone)]
enum HostData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct HostNode {
    data: HostData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    log: Vec<HostMutation>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unlogged detached element to mount into
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(HostData::Element {
            tag: tag.to_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn mutations(&self) -> &[HostMutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<HostMutation> {
        std::mem::take(&mut self.log)
    }

    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    pub fn counts(&self) -> MutationCounts {
        let mut counts = MutationCounts::default();
        for mutation in &self.log {
            match mutation {
                HostMutation::CreateElement { .. } | HostMutation::CreateText { .. } => {
                    counts.created += 1
                }
                HostMutation::Insert { .. } => counts.inserted += 1,
                HostMutation::Replace { .. } => counts.replaced += 1,
                HostMutation::Remove { .. } => counts.removed += 1,
                HostMutation::Move { .. } => counts.moved += 1,
            }
        }
        counts
    }

    pub fn child_count(&self, parent: NodeId) -> usize {
        self.nodes.get(parent.0).map_or(0, |n| n.children.len())
    }

    /// Detach the child at `index` without logging, simulating an edit made
    /// behind the reconciler's back
    pub fn detach_unlogged(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let node = self.nodes.get_mut(parent.0)?;
        if index >= node.children.len() {
            return None;
        }
        let child = node.children.remove(index);
        self.nodes[child.0].parent = None;
        Some(child)
    }

    /// Serialize the children of `id` as HTML
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.nodes.get(id.0) {
            for child in &node.children {
                self.write_html(*child, &mut out);
            }
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            HostData::Text(value) => out.push_str(&escape(value)),
            HostData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape(value));
                        out.push('"');
                    }
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn alloc(&mut self, data: HostData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(HostNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> HostResult<&HostNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> HostResult<&mut HostNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    fn ensure_detached(&self, id: NodeId) -> HostResult<()> {
        if let Some(parent) = self.node(id)?.parent {
            return Err(HostError::Operation(format!(
                "node {} is still attached to {}",
                id, parent
            )));
        }
        Ok(())
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> HostResult<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            })
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl HostAdapter for MemoryHost {
    type Handle = NodeId;

    fn create_element(&mut self, tag: &str, attrs: &[(String, String)]) -> HostResult<NodeId> {
        let id = self.alloc(HostData::Element {
            tag: tag.to_string(),
            attrs: attrs.to_vec(),
        });
        self.log.push(HostMutation::CreateElement {
            node: id,
            tag: tag.to_string(),
        });
        Ok(id)
    }

    fn create_text(&mut self, value: &str) -> HostResult<NodeId> {
        let id = self.alloc(HostData::Text(value.to_string()));
        self.log.push(HostMutation::CreateText {
            node: id,
            value: value.to_string(),
        });
        Ok(id)
    }

    fn insert_child(&mut self, parent: &NodeId, child: NodeId, index: usize) -> HostResult<()> {
        self.ensure_detached(child)?;
        let parent_node = self.node_mut(*parent)?;
        let len = parent_node.children.len();
        if index > len {
            return Err(HostError::IndexOutOfBounds { index, len });
        }
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(*parent);
        self.log.push(HostMutation::Insert {
            parent: *parent,
            child,
            index,
        });
        Ok(())
    }

    fn replace_child(&mut self, parent: &NodeId, old: &NodeId, new: NodeId) -> HostResult<()> {
        self.ensure_detached(new)?;
        let position = self.position_of(*parent, *old)?;
        self.node_mut(*parent)?.children[position] = new;
        self.node_mut(*old)?.parent = None;
        self.node_mut(new)?.parent = Some(*parent);
        self.log.push(HostMutation::Replace {
            parent: *parent,
            old: *old,
            new,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> HostResult<()> {
        let position = self.position_of(*parent, *child)?;
        self.node_mut(*parent)?.children.remove(position);
        self.node_mut(*child)?.parent = None;
        self.log.push(HostMutation::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn move_child(&mut self, parent: &NodeId, child: &NodeId, index: usize) -> HostResult<()> {
        let from = self.position_of(*parent, *child)?;
        let parent_node = self.node_mut(*parent)?;
        let len = parent_node.children.len();
        if index >= len {
            return Err(HostError::IndexOutOfBounds { index, len });
        }
        if from == index {
            return Ok(());
        }
        let moved = parent_node.children.remove(from);
        parent_node.children.insert(index, moved);
        self.log.push(HostMutation::Move {
            parent: *parent,
            child: *child,
            from,
            to: index,
        });
        Ok(())
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(parent.0)?.children.get(index).copied()
    }
}

impl HostQuery for MemoryHost {
    type Handle = NodeId;

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(
            self.nodes.get(node.0).map(|n| &n.data),
            Some(HostData::Text(_))
        )
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(node.0)?.data {
            HostData::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.clone()),
            HostData::Text(_) => None,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.data {
            HostData::Element { tag, .. } => Some(tag.clone()),
            HostData::Text(_) => None,
        }
    }

    fn text_content(&self, node: &NodeId) -> Option<String> {
        let host_node = self.nodes.get(node.0)?;
        match &host_node.data {
            HostData::Text(value) => Some(value.clone()),
            HostData::Element { .. } => Some(
                host_node
                    .children
                    .iter()
                    .filter_map(|child| self.text_content(child))
                    .collect(),
            ),
        }
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(HostData::Element { attrs, .. }) => attrs.clone(),
            _ => Vec::new(),
        }
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}
