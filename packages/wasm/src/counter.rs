//! Counter app exported to JS, wiring the DOM host, delegated listeners and
//! the render coordinator together.

use crate::dom::DomHost;
use crate::listeners::DelegatedEvents;
use serde_json::{json, Value};
use tracing::warn;
use twig_runtime::{App, AppConfig, Commit, RuntimeResult, Setter};
use twig_vdom::{EventKind, Node};
use wasm_bindgen::prelude::*;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn count(state: &Value) -> i64 {
    state["count"].as_i64().unwrap_or(0)
}

/// Log a failed update from a handler; a structural mismatch rebuilds the tree
fn settle(setter: &Setter<Value>, result: RuntimeResult<Commit>) {
    let Err(err) = result else {
        return;
    };
    warn!(error = %err, "Counter update failed");
    if err.is_structural() {
        if let Err(err) = setter.remount() {
            warn!(error = %err, "Counter remount failed");
        }
    }
}

fn render_counter(state: &Value, setter: &Setter<Value>) -> anyhow::Result<Node> {
    let increment = setter.clone();
    let reset = setter.clone();

    Ok(Node::element("div")
        .with_attr("class", "counter")
        .with_child(
            Node::element("button")
                .with_attr("class", "increment")
                .on_named(EventKind::Click, "counter-increment", move |_| {
                    settle(&increment, increment.apply(|s| json!({ "count": count(s) + 1 })));
                })
                .on_named(EventKind::DblClick, "counter-reset", move |_| {
                    settle(&reset, reset.merge(json!({ "count": 0 })));
                })
                .with_child(Node::text("+1")),
        )
        .with_child(
            Node::element("span")
                .with_attr("class", "value")
                .with_child(Node::text(count(state).to_string())),
        ))
}

#[wasm_bindgen]
pub struct CounterApp {
    app: App<Value, DomHost>,
    _events: DelegatedEvents,
}

/// Mount a counter into `container`. `config_json` uses the `twig.config.json` format.
#[wasm_bindgen(js_name = mountCounter)]
pub fn mount_counter(container: web_sys::Element, config_json: Option<String>) -> Result<CounterApp, JsValue> {
    let config = match config_json {
        Some(json) => AppConfig::from_json_str(&json).map_err(to_js)?,
        None => AppConfig::default(),
    };
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let host = DomHost::from_window().map_err(to_js)?;

    let app = App::builder(host.clone(), container.into(), json!({ "count": 0 }), render_counter)
        .with_config(config)
        .build();
    app.mount().map_err(to_js)?;

    let registry = app.registry().map_err(to_js)?;
    let target = host.document().clone().into();
    let events = DelegatedEvents::install(window, target, registry, host)?;

    Ok(CounterApp {
        app,
        _events: events,
    })
}

#[wasm_bindgen]
impl CounterApp {
    #[wasm_bindgen(getter)]
    pub fn count(&self) -> i32 {
        self.app.state().map(|state| count(&state) as i32).unwrap_or(0)
    }

    pub fn reset(&self) -> Result<(), JsValue> {
        self.app.merge(json!({ "count": 0 })).map_err(to_js)?;
        Ok(())
    }

    pub fn unmount(&self) -> Result<(), JsValue> {
        self.app.unmount().map_err(to_js)?;
        Ok(())
    }
}
