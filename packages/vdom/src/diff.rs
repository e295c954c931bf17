//! Node equivalence checks.
//!
//! [`changed`] is the deep rule: it answers "would the host look any different".
//! [`node_changed`] is the node-local rule the reconciler uses to decide between
//! replacing a subtree and recursing into it.

use crate::node::Node;

/// True when `new` and `old` differ anywhere in their subtrees
pub fn changed(new: &Node, old: &Node) -> bool {
    if node_changed(new, old) {
        return true;
    }

    let new_children = new.children();
    let old_children = old.children();
    if new_children.len() != old_children.len() {
        return true;
    }

    new_children
        .iter()
        .zip(old_children)
        .any(|(n, o)| changed(n, o))
}

/// True when the nodes themselves differ: type, text, tag or attribute set.
///
/// Handlers are compared by identity, everything else by value.
pub fn node_changed(new: &Node, old: &Node) -> bool {
    match (new, old) {
        (Node::Text { value: a }, Node::Text { value: b }) => a != b,
        (
            Node::Element {
                tag: new_tag,
                attrs: new_attrs,
                ..
            },
            Node::Element {
                tag: old_tag,
                attrs: old_attrs,
                ..
            },
        ) => {
            if new_tag != old_tag {
                return true;
            }
            if new_attrs.len() != old_attrs.len() {
                return true;
            }
            new_attrs
                .iter()
                .any(|(name, value)| old_attrs.get(name) != Some(value))
        }
        _ => true,
    }
}
