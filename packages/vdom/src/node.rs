use crate::handler::{Event, EventKind, Handler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved attribute carrying a child's identity for keyed matching
pub const KEY_ATTR: &str = "key";

/// Virtual tree node
///
/// Nodes are built once and never mutated afterwards; a new UI state is always
/// described by a new tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element with a lowercased tag
    Element {
        tag: String,
        attrs: BTreeMap<String, AttrValue>,
        children: Vec<Node>,
    },

    /// Text leaf
    Text { value: String },
}

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Handler(Handler),
}

/// Child identity token from the `key` attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<Key> for AttrValue {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(n) => AttrValue::Int(n),
            Key::Str(s) => AttrValue::Str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<Handler> for AttrValue {
    fn from(handler: Handler) -> Self {
        AttrValue::Handler(handler)
    }
}

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element {
            tag: tag.into().to_lowercase(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        if let Node::Element { ref mut attrs, .. } = self {
            attrs.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_key(self, key: impl Into<Key>) -> Self {
        let key: Key = key.into();
        self.with_attr(KEY_ATTR, key)
    }

    /// Attach a closure for `kind`, stored under `on<kind>`
    pub fn on(self, kind: EventKind, listener: impl Fn(&Event) + 'static) -> Self {
        self.with_handler(Handler::new(kind, listener))
    }

    /// Attach a closure under a stable `name`, so re-rendering the same element
    /// does not count as a change
    pub fn on_named(
        self,
        kind: EventKind,
        name: impl Into<String>,
        listener: impl Fn(&Event) + 'static,
    ) -> Self {
        self.with_handler(Handler::named(kind, name, listener))
    }

    /// Attach an existing handler; reusing the same handler across renders keeps
    /// the element equal to its previous version.
    pub fn with_handler(self, handler: Handler) -> Self {
        let key = handler.kind().attr_key();
        self.with_attr(key, handler)
    }

    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text { .. } => None,
        }
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            Node::Text { value } => Some(value),
            Node::Element { .. } => None,
        }
    }

    pub fn attrs(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            Node::Element { attrs, .. } => Some(attrs),
            Node::Text { .. } => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs().and_then(|attrs| attrs.get(name))
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            Node::Text { .. } => &[],
        }
    }

    /// Explicit identity from the `key` attribute, if any. Only string and
    /// integer values count as keys.
    pub fn key(&self) -> Option<Key> {
        match self.attr(KEY_ATTR)? {
            AttrValue::Str(s) => Some(Key::Str(s.clone())),
            AttrValue::Int(n) => Some(Key::Int(*n)),
            AttrValue::Bool(_) | AttrValue::Handler(_) => None,
        }
    }

    /// Attributes as the host sees them.
    ///
    /// `key` is dropped, `false` booleans are omitted, `true` booleans become empty
    /// attributes and handlers become `data-on<kind>` markers carrying their token.
    pub fn host_attributes(&self) -> Vec<(String, String)> {
        let Some(attrs) = self.attrs() else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(attrs.len());
        for (name, value) in attrs {
            if name == KEY_ATTR {
                continue;
            }
            match value {
                AttrValue::Str(s) => out.push((name.clone(), s.clone())),
                AttrValue::Int(n) => out.push((name.clone(), n.to_string())),
                AttrValue::Bool(true) => out.push((name.clone(), String::new())),
                AttrValue::Bool(false) => {}
                AttrValue::Handler(handler) => {
                    out.push((handler.kind().marker_attribute(), handler.token()))
                }
            }
        }
        out
    }

    /// Every handler in this subtree, depth-first
    pub fn handlers(&self) -> Vec<&Handler> {
        let mut out = Vec::new();
        self.collect_handlers(&mut out);
        out
    }

    fn collect_handlers<'a>(&'a self, out: &mut Vec<&'a Handler>) {
        if let Node::Element {
            attrs, children, ..
        } = self
        {
            for value in attrs.values() {
                if let AttrValue::Handler(handler) = value {
                    out.push(handler);
                }
            }
            for child in children {
                child.collect_handlers(out);
            }
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Node::size).sum::<usize>()
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::text(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::text(value)
    }
}
