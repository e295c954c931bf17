//! Event handler capabilities carried by element nodes.
//!
//! A [`Handler`] pairs an [`EventKind`] with an [`EventListener`]. Its token is
//! what ends up in the host as the `data-on<kind>` marker.
//!
//! Handlers built with [`Handler::new`] get a process-unique id and token
//! (`h<id>`). Ids are never reused, so a token read from a removed host node can
//! never resolve to a different live handler. They are also never equal to a
//! handler from another render, which makes their element differ every time.
//!
//! Handlers built with [`Handler::named`] compare by kind and name instead, with
//! the token `@<name>`. A render that rebuilds the same named handler leaves its
//! element untouched and only the registered listener is swapped. Names must be
//! unique per kind within one registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Prefix of the host attribute that marks an element as interactive.
pub const MARKER_PREFIX: &str = "data-on";

/// Kinds of host events the framework knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    DblClick,
    KeyDown,
    KeyUp,
    Scroll,
    Input,
    Change,
    Submit,
    Focus,
    Blur,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::Click,
        EventKind::DblClick,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::Scroll,
        EventKind::Input,
        EventKind::Change,
        EventKind::Submit,
        EventKind::Focus,
        EventKind::Blur,
    ];

    /// Host event name (`"click"`, `"keyup"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DblClick => "dblclick",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::Scroll => "scroll",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
        }
    }

    /// Marker attribute name for this kind, e.g. `data-onclick`
    pub fn marker_attribute(&self) -> String {
        format!("{}{}", MARKER_PREFIX, self.as_str())
    }

    /// Attribute key a handler of this kind is stored under on a node, e.g. `onclick`
    pub fn attr_key(&self) -> String {
        format!("on{}", self.as_str())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lowered)
            .ok_or(UnknownEventKind(s.to_string()))
    }
}

/// Host-agnostic event payload handed to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Time of the event, relative to an arbitrary host epoch
    pub timestamp: Duration,
    /// Key name for keyboard events
    pub key: Option<String>,
    /// Current value of the target (inputs)
    pub value: Option<String>,
    /// Handler token the event was routed to
    pub token: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Duration::ZERO,
            key: None,
            value: None,
            token: None,
        }
    }

    pub fn at(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Something that responds to a routed event.
///
/// Implemented for plain closures; command objects can implement it directly.
pub trait EventListener {
    fn on_event(&self, event: &Event);
}

impl<F> EventListener for F
where
    F: Fn(&Event),
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Anonymous(u64),
    Named(String),
}

/// An event listener bound to one event kind, compared by identity
#[derive(Clone)]
pub struct Handler {
    identity: Identity,
    kind: EventKind,
    listener: Rc<dyn EventListener>,
}

impl Handler {
    pub fn new(kind: EventKind, listener: impl EventListener + 'static) -> Self {
        Self::from_rc(kind, Rc::new(listener))
    }

    pub fn from_rc(kind: EventKind, listener: Rc<dyn EventListener>) -> Self {
        Self {
            identity: Identity::Anonymous(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            listener,
        }
    }

    /// Handler whose identity survives re-renders: two named handlers are equal
    /// when kind and name match, whatever their listeners.
    pub fn named(kind: EventKind, name: impl Into<String>, listener: impl EventListener + 'static) -> Self {
        Self {
            identity: Identity::Named(name.into()),
            kind,
            listener: Rc::new(listener),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.identity {
            Identity::Named(name) => Some(name),
            Identity::Anonymous(_) => None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Token written into the host marker attribute
    pub fn token(&self) -> String {
        match &self.identity {
            Identity::Anonymous(id) => format!("h{}", id),
            Identity::Named(name) => format!("@{}", name),
        }
    }

    pub fn listener(&self) -> Rc<dyn EventListener> {
        Rc::clone(&self.listener)
    }

    pub fn call(&self, event: &Event) {
        self.listener.on_event(event);
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity == other.identity
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("identity", &self.identity)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
