//! # Twig Events
//!
//! Delegated event handling for trees rendered by `twig-vdom`.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ host listener per kind (root container)        │
//! └────────────────────────────────────────────────┘
//!                        ↓ kind, target
//! ┌────────────────────────────────────────────────┐
//! │ click disambiguation (Scheduler timers)        │
//! └────────────────────────────────────────────────┘
//!                        ↓
//! ┌────────────────────────────────────────────────┐
//! │ EventRegistry: ancestor walk, token → handler  │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use twig_events::EventRegistry;
//! use twig_vdom::{reconcile, Event, EventKind, HostQuery, MemoryHost, Node};
//!
//! let presses = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&presses);
//! let tree = Node::element("input").on(EventKind::KeyDown, move |_| counter.set(counter.get() + 1));
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root("body");
//! reconcile(&mut host, &root, Some(&tree), None, 0).unwrap();
//!
//! let mut registry = EventRegistry::default();
//! let scope = registry.open_scope();
//! registry.sync_scope(scope, tree.handlers());
//!
//! let input = host.children(&root)[0];
//! assert!(registry.dispatch(EventKind::KeyDown, Event::new(EventKind::KeyDown), &input, &host));
//! assert_eq!(presses.get(), 1);
//! ```

mod click;
mod config;
mod error;
mod registry;
mod scheduler;

pub use config::RegistryConfig;
pub use error::{EventError, EventResult};
pub use registry::{ClickOutcome, EventRegistry, Owner, Routed, ScopeId, SharedRegistry};
pub use scheduler::{ManualScheduler, Scheduler, TimerId};
