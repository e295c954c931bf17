//! Document-level listeners feeding the delegated registry.
//!
//! One native listener is installed per supported kind. Native `dblclick` is
//! never listened to; double clicks are synthesized from raw clicks. Kinds that
//! do not bubble are listened to in the capture phase so they still reach the
//! document-level listener.

use crate::dom::DomHost;
use crate::timer::WindowScheduler;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};
use twig_events::{Routed, SharedRegistry};
use twig_vdom::{Event, EventKind};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{EventTarget, HtmlInputElement, KeyboardEvent, Node, Window};

type Listener = Closure<dyn FnMut(web_sys::Event)>;

struct Installed {
    kind: EventKind,
    capture: bool,
    listener: Listener,
}

/// Installed listeners; removed again on drop
pub struct DelegatedEvents {
    target: EventTarget,
    listeners: Vec<Installed>,
}

/// Focus, blur and element scroll events never bubble up to the document
fn listens_in_capture_phase(kind: EventKind) -> bool {
    matches!(kind, EventKind::Focus | EventKind::Blur | EventKind::Scroll)
}

impl DelegatedEvents {
    pub fn install(
        window: Window,
        target: EventTarget,
        registry: SharedRegistry<Node>,
        host: DomHost,
    ) -> Result<Self, JsValue> {
        let scheduler = {
            let registry = Rc::clone(&registry);
            let host = host.clone();
            Rc::new(RefCell::new(WindowScheduler::new(window, move |timer| {
                let routed = match registry.try_borrow_mut() {
                    Ok(mut registry) => registry.fire_pending_click(timer, &host),
                    Err(_) => {
                        warn!(?timer, "Registry busy; dropped pending click");
                        None
                    }
                };
                fire_all(routed);
            })))
        };

        let kinds: Vec<EventKind> = registry
            .borrow()
            .config()
            .event_kinds
            .iter()
            .copied()
            .filter(|kind| *kind != EventKind::DblClick)
            .collect();

        let mut listeners = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let registry = Rc::clone(&registry);
            let scheduler = Rc::clone(&scheduler);
            let host = host.clone();

            let listener: Listener = Closure::wrap(Box::new(move |native: web_sys::Event| {
                let target = match native.target().and_then(|t| t.dyn_into::<Node>().ok()) {
                    Some(target) => target,
                    None => return,
                };
                let event = to_event(kind, &native);

                let routed = match (registry.try_borrow_mut(), scheduler.try_borrow_mut()) {
                    (Ok(mut registry), Ok(mut scheduler)) => {
                        registry.handle(kind, event, target, &host, &mut *scheduler)
                    }
                    _ => {
                        warn!(%kind, "Registry busy; dropped event");
                        Vec::new()
                    }
                };
                fire_all(routed);
            }) as Box<dyn FnMut(web_sys::Event)>);

            let capture = listens_in_capture_phase(kind);
            target.add_event_listener_with_callback_and_bool(
                kind.as_str(),
                listener.as_ref().unchecked_ref(),
                capture,
            )?;
            listeners.push(Installed {
                kind,
                capture,
                listener,
            });
        }

        debug!(listeners = listeners.len(), "Installed delegated listeners");
        Ok(Self { target, listeners })
    }
}

impl Drop for DelegatedEvents {
    fn drop(&mut self) {
        for installed in &self.listeners {
            let _ = self.target.remove_event_listener_with_callback_and_bool(
                installed.kind.as_str(),
                installed.listener.as_ref().unchecked_ref(),
                installed.capture,
            );
        }
    }
}

fn fire_all(routed: impl IntoIterator<Item = Routed>) {
    for routed in routed {
        routed.fire();
    }
}

/// Translate a native event into the host-agnostic payload
pub(crate) fn to_event(kind: EventKind, native: &web_sys::Event) -> Event {
    let mut event = Event::new(kind).at(timestamp(native.time_stamp()));
    if let Some(keyboard) = native.dyn_ref::<KeyboardEvent>() {
        event = event.with_key(keyboard.key());
    }
    if let Some(input) = native
        .target()
        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
    {
        event = event.with_value(input.value());
    }
    event
}

/// DOM timestamps are fractional milliseconds
pub(crate) fn timestamp(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_secs_f64(millis / 1000.0)
    } else {
        Duration::ZERO
    }
}
