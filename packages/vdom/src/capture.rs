//! Rebuild a virtual tree from a live host subtree.
//!
//! Every host attribute comes back as a plain string attribute, including
//! `data-on*` markers, since listeners cannot be recovered from the host. Text is
//! trimmed and whitespace-only text nodes are dropped.

use crate::host::HostQuery;
use crate::node::Node;

pub fn capture<Q: HostQuery>(host: &Q, handle: &Q::Handle) -> Option<Node> {
    if host.is_text(handle) {
        let value = host.text_content(handle)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        return Some(Node::text(trimmed));
    }

    let tag = host.tag_name(handle)?;
    let mut node = Node::element(tag);
    for (name, value) in host.attributes(handle) {
        node = node.with_attr(name, value);
    }

    let children: Vec<Node> = host
        .children(handle)
        .iter()
        .filter_map(|child| capture(host, child))
        .collect();

    Some(node.with_children(children))
}
