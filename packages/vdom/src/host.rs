//! Host tree seams.
//!
//! The reconciler never touches a live tree directly. It goes through
//! [`HostAdapter`] for mutations and the event registry goes through
//! [`HostQuery`] for ancestor walks.

use crate::error::HostResult;
use crate::node::Node;
use std::fmt::Debug;

/// Mutating access to a live host tree
pub trait HostAdapter {
    type Handle: Clone + PartialEq + Debug;

    /// Create a detached element carrying `attrs` (already projected for the host)
    fn create_element(&mut self, tag: &str, attrs: &[(String, String)]) -> HostResult<Self::Handle>;

    /// Create a detached text node
    fn create_text(&mut self, value: &str) -> HostResult<Self::Handle>;

    /// Insert a detached node at `index`; `index == len` appends
    fn insert_child(&mut self, parent: &Self::Handle, child: Self::Handle, index: usize) -> HostResult<()>;

    /// Put `new` where `old` is and detach `old`
    fn replace_child(&mut self, parent: &Self::Handle, old: &Self::Handle, new: Self::Handle) -> HostResult<()>;

    /// Detach `child` from `parent`
    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> HostResult<()>;

    /// Relocate an attached child of `parent` so it ends up at `index`
    fn move_child(&mut self, parent: &Self::Handle, child: &Self::Handle, index: usize) -> HostResult<()>;

    fn child_at(&self, parent: &Self::Handle, index: usize) -> Option<Self::Handle>;

    /// Build the full host representation of `node`, children included
    fn create_node(&mut self, node: &Node) -> HostResult<Self::Handle> {
        match node {
            Node::Text { value } => self.create_text(value),
            Node::Element { tag, children, .. } => {
                let element = self.create_element(tag, &node.host_attributes())?;
                for (index, child) in children.iter().enumerate() {
                    let handle = self.create_node(child)?;
                    self.insert_child(&element, handle, index)?;
                }
                Ok(element)
            }
        }
    }
}

/// Read-only access to a live host tree
pub trait HostQuery {
    type Handle: Clone + PartialEq + Debug;

    fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;

    fn is_text(&self, node: &Self::Handle) -> bool;

    fn attribute(&self, node: &Self::Handle, name: &str) -> Option<String>;

    /// Lowercased tag name, `None` for text nodes
    fn tag_name(&self, node: &Self::Handle) -> Option<String>;

    fn text_content(&self, node: &Self::Handle) -> Option<String>;

    fn attributes(&self, node: &Self::Handle) -> Vec<(String, String)>;

    fn children(&self, node: &Self::Handle) -> Vec<Self::Handle>;
}
