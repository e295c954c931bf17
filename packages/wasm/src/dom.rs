//! `web-sys` implementation of the host traits.
//!
//! Handles are plain `web_sys::Node`s; equality is JS identity.

use twig_vdom::{HostAdapter, HostError, HostQuery, HostResult};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node};

#[derive(Debug, Clone)]
pub struct DomHost {
    document: Document,
}

impl DomHost {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Host for the current window's document
    pub fn from_window() -> HostResult<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| HostError::Operation("no document available".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn child_count(node: &Node) -> usize {
        node.child_nodes().length() as usize
    }
}

fn js_error(context: &str, err: JsValue) -> HostError {
    HostError::Operation(format!("{}: {:?}", context, err))
}

impl HostAdapter for DomHost {
    type Handle = Node;

    fn create_element(&mut self, tag: &str, attrs: &[(String, String)]) -> HostResult<Node> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|e| js_error("createElement", e))?;
        for (name, value) in attrs {
            element
                .set_attribute(name, value)
                .map_err(|e| js_error("setAttribute", e))?;
        }
        Ok(element.into())
    }

    fn create_text(&mut self, value: &str) -> HostResult<Node> {
        Ok(self.document.create_text_node(value).into())
    }

    fn insert_child(&mut self, parent: &Node, child: Node, index: usize) -> HostResult<()> {
        let len = Self::child_count(parent);
        if index > len {
            return Err(HostError::IndexOutOfBounds { index, len });
        }
        let reference = parent.child_nodes().get(index as u32);
        parent
            .insert_before(&child, reference.as_ref())
            .map_err(|e| js_error("insertBefore", e))?;
        Ok(())
    }

    fn replace_child(&mut self, parent: &Node, old: &Node, new: Node) -> HostResult<()> {
        if old.parent_node().as_ref() != Some(parent) {
            return Err(HostError::NotAChild {
                parent: parent.node_name(),
                child: old.node_name(),
            });
        }
        parent
            .replace_child(&new, old)
            .map_err(|e| js_error("replaceChild", e))?;
        Ok(())
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> HostResult<()> {
        if child.parent_node().as_ref() != Some(parent) {
            return Err(HostError::NotAChild {
                parent: parent.node_name(),
                child: child.node_name(),
            });
        }
        parent
            .remove_child(child)
            .map_err(|e| js_error("removeChild", e))?;
        Ok(())
    }

    fn move_child(&mut self, parent: &Node, child: &Node, index: usize) -> HostResult<()> {
        let len = Self::child_count(parent);
        if index >= len {
            return Err(HostError::IndexOutOfBounds { index, len });
        }
        if parent.child_nodes().get(index as u32).as_ref() == Some(child) {
            return Ok(());
        }

        self.remove_child(parent, child)?;
        let reference = parent.child_nodes().get(index as u32);
        parent
            .insert_before(child, reference.as_ref())
            .map_err(|e| js_error("insertBefore", e))?;
        Ok(())
    }

    fn child_at(&self, parent: &Node, index: usize) -> Option<Node> {
        parent.child_nodes().get(index as u32)
    }
}

impl HostQuery for DomHost {
    type Handle = Node;

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn is_text(&self, node: &Node) -> bool {
        node.node_type() == Node::TEXT_NODE
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>()
            .map(|element| element.tag_name().to_lowercase())
    }

    fn text_content(&self, node: &Node) -> Option<String> {
        if self.is_text(node) {
            node.text_content()
        } else {
            None
        }
    }

    fn attributes(&self, node: &Node) -> Vec<(String, String)> {
        let element = match node.dyn_ref::<Element>() {
            Some(element) => element,
            None => return Vec::new(),
        };
        let names: js_sys::Array = element.get_attribute_names();
        names
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| {
                let value = element.get_attribute(&name)?;
                Some((name, value))
            })
            .collect()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let nodes = node.child_nodes();
        (0..nodes.length()).filter_map(|i| nodes.get(i)).collect()
    }
}
