//! Browser host for Twig.
//!
//! [`DomHost`] renders into the live DOM, [`DelegatedEvents`] installs one
//! document-level listener per event kind, and [`WindowScheduler`] drives click
//! disambiguation with `setTimeout`.

use wasm_bindgen::prelude::*;

mod counter;
mod dom;
mod listeners;
mod timer;

pub use counter::{mount_counter, CounterApp};
pub use dom::DomHost;
pub use listeners::DelegatedEvents;
pub use timer::WindowScheduler;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = wasm_tracing::set_as_global_default();
}
