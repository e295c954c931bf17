//! # Twig Runtime
//!
//! State ownership and the render loop on top of `twig-vdom` and `twig-events`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Setter::set / App::set_state  (Update queue)     │
//! └──────────────────────────────────────────────────┘
//!                         ↓
//! ┌──────────────────────────────────────────────────┐
//! │ render(state, setter) → Node                     │
//! └──────────────────────────────────────────────────┘
//!                         ↓
//! ┌──────────────────────────────────────────────────┐
//! │ reconcile against baseline → commit → sync scope │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use twig_runtime::App;
//! use twig_vdom::{MemoryHost, Node};
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root("body");
//!
//! let app = App::builder(host, root, json!({ "items": [] }), |state, _| {
//!     let items = state["items"].as_array().cloned().unwrap_or_default();
//!     Ok(Node::element("ul").with_children(items.iter().map(|item| {
//!         Node::element("li").with_child(Node::text(item.as_str().unwrap_or_default()))
//!     })))
//! })
//! .build();
//!
//! app.mount().unwrap();
//! app.merge(json!({ "items": ["A"] })).unwrap();
//!
//! let html = app.with_host(|host, root| host.inner_html(*root)).unwrap();
//! assert_eq!(html, "<ul><li>A</li></ul>");
//! ```

mod app;
mod config;
mod error;
mod state;

pub use app::{App, AppBuilder, RenderFn};
pub use config::{AppConfig, ReentrancyPolicy, DEFAULT_CONFIG_NAME};
pub use error::{RuntimeError, RuntimeResult};
pub use state::{Commit, Setter, State, Update};
