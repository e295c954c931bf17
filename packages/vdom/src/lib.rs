//! # Twig VDOM
//!
//! Virtual tree model and reconciliation engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ node: immutable Element / Text descriptions │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ diff + keyed: equivalence, child alignment  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reconcile: host mutations via HostAdapter   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use twig_vdom::{reconcile, MemoryHost, Node};
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root("body");
//!
//! let first = Node::element("ul").with_child(Node::element("li").with_child(Node::text("a")));
//! reconcile(&mut host, &root, Some(&first), None, 0).unwrap();
//!
//! let second = Node::element("ul")
//!     .with_child(Node::element("li").with_child(Node::text("a")))
//!     .with_child(Node::element("li").with_child(Node::text("b")));
//! let stats = reconcile(&mut host, &root, Some(&second), Some(&first), 0).unwrap();
//!
//! assert_eq!(stats.created, 1);
//! assert_eq!(host.inner_html(root), "<ul><li>a</li><li>b</li></ul>");
//! ```

mod capture;
mod diff;
mod error;
mod handler;
mod host;
mod keyed;
mod memory;
mod node;
mod reconcile;

pub use capture::capture;
pub use diff::{changed, node_changed};
pub use error::{HostError, HostResult, ReconcileError, VdomResult};
pub use handler::{Event, EventKind, EventListener, Handler, UnknownEventKind, MARKER_PREFIX};
pub use host::{HostAdapter, HostQuery};
pub use keyed::{match_children, ChildKey, ChildPair, ChildPlan};
pub use memory::{HostMutation, MemoryHost, MutationCounts, NodeId};
pub use node::{AttrValue, Key, Node, KEY_ATTR};
pub use reconcile::{reconcile, ReconcileStats};
