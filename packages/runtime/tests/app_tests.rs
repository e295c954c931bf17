//! Render coordinator behaviour against the in-memory host

use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use twig_events::{EventRegistry, ManualScheduler, ScopeId};
use twig_runtime::{App, AppConfig, Commit, ReentrancyPolicy, RuntimeError, Setter, Update};
use twig_vdom::{
    capture, Event, EventKind, HostAdapter, HostMutation, HostQuery, MemoryHost, Node, NodeId,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn items(state: &Value) -> Vec<String> {
    state["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn count(state: &Value) -> i64 {
    state["count"].as_i64().unwrap_or(0)
}

fn render_list(state: &Value, _: &Setter<Value>) -> anyhow::Result<Node> {
    if state["fail"].as_bool().unwrap_or(false) {
        anyhow::bail!("render refused state");
    }
    Ok(Node::element("ul").with_children(
        items(state)
            .into_iter()
            .map(|item| Node::element("li").with_child(Node::text(item))),
    ))
}

fn list_app(state: Value) -> App<Value, MemoryHost> {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    App::builder(host, root, state, render_list).build()
}

fn html(app: &App<Value, MemoryHost>) -> String {
    app.with_host(|host, root| host.inner_html(*root)).unwrap()
}

fn take_mutations(app: &App<Value, MemoryHost>) -> Vec<HostMutation> {
    app.with_host(|host, _| host.take_mutations()).unwrap()
}

#[test]
fn test_mount_renders_initial_state() {
    init_tracing();
    let app = list_app(json!({ "items": ["a", "b"] }));

    let stats = app.mount().unwrap();

    assert_eq!(stats.created, 1);
    assert_eq!(html(&app), "<ul><li>a</li><li>b</li></ul>");
    assert!(app.is_mounted());
}

#[test]
fn test_identical_state_is_a_host_no_op() {
    let app = list_app(json!({ "items": ["a", "b"] }));
    app.mount().unwrap();
    let (_, before) = app.snapshot().unwrap();
    take_mutations(&app);

    let commit = app.merge(json!({ "items": ["a", "b"] })).unwrap();

    match commit {
        Commit::Applied { updates, stats } => {
            assert_eq!(updates, 1);
            assert!(!stats.has_mutations());
        }
        Commit::Queued => panic!("update should apply immediately"),
    }
    assert!(take_mutations(&app).is_empty());
    assert_eq!(app.snapshot().unwrap().1, before);
}

#[test]
fn test_first_item_creates_one_child_without_replacing_container() {
    let app = list_app(json!({ "items": [] }));
    app.mount().unwrap();
    let container = app
        .with_host(|host, root| host.children(root)[0])
        .unwrap();
    take_mutations(&app);

    app.merge(json!({ "items": ["A"] })).unwrap();

    let mutations = take_mutations(&app);
    let into_container: Vec<_> = mutations
        .iter()
        .filter(|m| matches!(m, HostMutation::Insert { parent, .. } if *parent == container))
        .collect();
    assert_eq!(into_container.len(), 1);
    assert!(matches!(into_container[0], HostMutation::Insert { index: 0, .. }));
    assert!(!mutations
        .iter()
        .any(|m| matches!(m, HostMutation::Replace { .. } | HostMutation::Remove { .. })));
    assert_eq!(html(&app), "<ul><li>A</li></ul>");
}

#[test]
fn test_failed_render_leaves_state_and_host_unchanged() {
    let app = list_app(json!({ "items": ["a"] }));
    app.mount().unwrap();
    let before = app.snapshot().unwrap();
    take_mutations(&app);

    let err = app.merge(json!({ "fail": true, "items": ["x"] })).unwrap_err();

    assert!(matches!(err, RuntimeError::Render(_)));
    assert_eq!(app.snapshot().unwrap(), before);
    assert!(take_mutations(&app).is_empty());

    app.merge(json!({ "items": ["a", "b"] })).unwrap();
    assert_eq!(html(&app), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn test_apply_update_sees_current_state() {
    let app = list_app(json!({ "items": ["a"] }));
    app.mount().unwrap();

    app.set_state(Update::apply(|state: &Value| {
        let mut next = items(state);
        next.push("b".to_string());
        json!({ "items": next })
    }))
    .unwrap();

    assert_eq!(items(&app.state().unwrap()), vec!["a", "b"]);
}

#[test]
fn test_set_state_before_mount_fails() {
    let app = list_app(json!({ "items": [] }));
    assert!(matches!(
        app.merge(json!({ "items": ["a"] })),
        Err(RuntimeError::NotMounted)
    ));
}

#[test]
fn test_mount_twice_fails() {
    let app = list_app(json!({ "items": [] }));
    app.mount().unwrap();
    assert!(matches!(app.mount(), Err(RuntimeError::AlreadyMounted)));
}

#[test]
fn test_mount_requires_empty_root() {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let stray = host.create_element("p", &[]).unwrap();
    host.insert_child(&root, stray, 0).unwrap();

    let app = App::builder(host, root, json!({ "items": [] }), render_list).build();

    assert!(matches!(app.mount(), Err(RuntimeError::RootNotEmpty)));
    assert!(!app.is_mounted());
}

#[test]
fn test_render_update_is_queued_until_commit_finishes() {
    init_tracing();
    let renders = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&renders);

    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let app = App::builder(host, root, json!({ "count": 0 }), move |state, setter| {
        let current = count(state);
        seen.borrow_mut().push(current);
        if current < 3 {
            let queued = setter.apply(move |_| json!({ "count": current + 1 }))?;
            assert_eq!(queued, Commit::Queued);
        }
        Ok(Node::element("span").with_child(Node::text(current.to_string())))
    })
    .build();

    app.mount().unwrap();

    assert_eq!(*renders.borrow(), vec![0, 1, 2, 3]);
    assert_eq!(count(&app.state().unwrap()), 3);
    assert_eq!(html(&app), "<span>3</span>");
}

#[test]
fn test_reject_policy_refuses_reentrant_update() {
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&outcomes);

    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let config = AppConfig {
        reentrancy: ReentrancyPolicy::Reject,
        ..AppConfig::default()
    };
    let app = App::builder(host, root, json!({ "count": 0 }), move |state, setter| {
        let result = setter.merge(json!({ "count": count(state) + 1 }));
        seen.borrow_mut().push(matches!(result, Err(RuntimeError::Reentrant)));
        Ok(Node::element("span"))
    })
    .with_config(config)
    .build();

    app.mount().unwrap();

    assert_eq!(*outcomes.borrow(), vec![true]);
    assert_eq!(count(&app.state().unwrap()), 0);
}

#[test]
fn test_runaway_updates_hit_flush_limit() {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let config = AppConfig {
        max_updates_per_flush: 5,
        ..AppConfig::default()
    };
    let app = App::builder(
        host,
        root,
        json!({ "looping": false, "count": 0 }),
        |state, setter| {
            if state["looping"].as_bool().unwrap_or(false) {
                let next = count(state) + 1;
                setter.merge(json!({ "count": next }))?;
            }
            Ok(Node::element("span").with_child(Node::text(count(state).to_string())))
        },
    )
    .with_config(config)
    .build();
    app.mount().unwrap();

    let err = app.merge(json!({ "looping": true })).unwrap_err();
    assert!(matches!(err, RuntimeError::UpdateLoop { limit: 5 }));
    assert_eq!(count(&app.state().unwrap()), 4);

    let commit = app.merge(json!({ "looping": false })).unwrap();
    assert!(matches!(commit, Commit::Applied { updates: 1, .. }));
}

#[test]
fn test_out_of_band_edit_surfaces_mismatch_and_remount_recovers() {
    let app = list_app(json!({ "items": ["a", "b"] }));
    app.mount().unwrap();
    app.with_host(|host, root| {
        let list = host.children(root)[0];
        host.detach_unlogged(list, 1)
    })
    .unwrap();

    let err = app.merge(json!({ "items": ["a", "b", "c"] })).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(items(&app.state().unwrap()), vec!["a", "b"]);

    app.remount().unwrap();
    assert_eq!(html(&app), "<ul><li>a</li><li>b</li></ul>");

    app.merge(json!({ "items": ["a", "b", "c"] })).unwrap();
    assert_eq!(html(&app), "<ul><li>a</li><li>b</li><li>c</li></ul>");
}

#[test]
fn test_unmount_clears_host_and_handlers() {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let app = App::builder(host, root, json!({}), |_, _| {
        Ok(Node::element("button").on(EventKind::Click, |_| {}))
    })
    .build();
    app.mount().unwrap();
    let registry = app.registry().unwrap();
    assert_eq!(registry.borrow().len(), 1);

    let stats = app.unmount().unwrap();

    assert_eq!(stats.removed, 1);
    assert_eq!(html(&app), "");
    assert!(registry.borrow().is_empty());
    assert!(matches!(app.merge(json!({})), Err(RuntimeError::NotMounted)));
}

#[test]
fn test_setter_outliving_app_reports_dropped() {
    let app = list_app(json!({ "items": [] }));
    app.mount().unwrap();
    let setter = app.setter();
    assert!(setter.is_live());

    drop(app);

    assert!(!setter.is_live());
    assert!(matches!(
        setter.merge(json!({ "items": ["a"] })),
        Err(RuntimeError::Dropped)
    ));
}

fn counter_app(registry: Option<Rc<RefCell<EventRegistry<NodeId>>>>) -> App<Value, MemoryHost> {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    let builder = App::builder(host, root, json!({ "count": 0 }), |state, setter| {
        let increment = setter.clone();
        let reset = setter.clone();
        Ok(Node::element("button")
            .on(EventKind::Click, move |_| {
                let _ = increment.apply(|s| json!({ "count": count(s) + 1 }));
            })
            .on(EventKind::DblClick, move |_| {
                let _ = reset.merge(json!({ "count": 0 }));
            })
            .with_child(Node::text(count(state).to_string())))
    });
    match registry {
        Some(registry) => builder.with_registry(registry).build(),
        None => builder.build(),
    }
}

/// Feed a click through the app's registry, releasing it once the window passes
fn click_and_wait(app: &App<Value, MemoryHost>, scheduler: &mut ManualScheduler) {
    let registry = app.registry().unwrap();
    let at = scheduler.now();
    app.with_host(|host, root| {
        let button = host.children(root)[0];
        registry
            .borrow_mut()
            .raw_click(Event::new(EventKind::Click).at(at), button, &*host, scheduler)
    })
    .unwrap();

    for timer in scheduler.advance(Duration::from_millis(300)) {
        let routed = app
            .with_host(|host, _| registry.borrow_mut().fire_pending_click(timer, &*host))
            .unwrap();
        if let Some(routed) = routed {
            routed.fire();
        }
    }
}

fn button_text(app: &App<Value, MemoryHost>) -> Option<String> {
    app.with_host(|host, root| {
        let button = host.children(root)[0];
        capture(&*host, &button)
            .and_then(|node| node.children().first().and_then(|t| t.text_value().map(str::to_string)))
    })
    .unwrap()
}

#[test]
fn test_click_handler_updates_state_through_setter() {
    init_tracing();
    let app = counter_app(None);
    app.mount().unwrap();
    let mut scheduler = ManualScheduler::new();

    click_and_wait(&app, &mut scheduler);
    click_and_wait(&app, &mut scheduler);

    assert_eq!(count(&app.state().unwrap()), 2);
    assert_eq!(button_text(&app).as_deref(), Some("2"));
}

#[test]
fn test_double_click_dispatches_only_dblclick() {
    let app = counter_app(None);
    app.mount().unwrap();
    app.merge(json!({ "count": 5 })).unwrap();

    let registry = app.registry().unwrap();
    let mut scheduler = ManualScheduler::new();
    let routed = app
        .with_host(|host, root| {
            let button = host.children(root)[0];
            let mut registry = registry.borrow_mut();
            let first = registry.raw_click(
                Event::new(EventKind::Click).at(Duration::from_millis(0)),
                button,
                &*host,
                &mut scheduler,
            );
            assert!(first.into_routed().is_empty());
            registry
                .raw_click(
                    Event::new(EventKind::Click).at(Duration::from_millis(120)),
                    button,
                    &*host,
                    &mut scheduler,
                )
                .into_routed()
        })
        .unwrap();

    assert_eq!(routed.len(), 1);
    assert_eq!(routed[0].event().kind, EventKind::DblClick);
    for r in routed {
        r.fire();
    }
    assert!(scheduler.advance(Duration::from_secs(1)).is_empty());
    assert_eq!(count(&app.state().unwrap()), 0);
}

#[test]
fn test_stale_token_does_not_dispatch_after_rerender() {
    let app = counter_app(None);
    app.mount().unwrap();
    let registry = app.registry().unwrap();

    let old_token = app
        .with_host(|host, root| {
            let button = host.children(root)[0];
            host.attribute(&button, "data-onclick")
        })
        .unwrap()
        .unwrap();

    app.merge(json!({ "count": 7 })).unwrap();

    assert!(!registry.borrow().is_registered(EventKind::Click, &old_token));
    assert_eq!(registry.borrow().len(), 2);
}

#[test]
fn test_apps_sharing_a_registry_keep_separate_scopes() {
    let registry = Rc::new(RefCell::new(EventRegistry::default()));
    let first = counter_app(Some(Rc::clone(&registry)));
    let second = counter_app(Some(Rc::clone(&registry)));
    first.mount().unwrap();
    second.mount().unwrap();

    let scopes: Vec<ScopeId> = vec![first.scope().unwrap(), second.scope().unwrap()];
    assert_ne!(scopes[0], scopes[1]);
    assert_eq!(registry.borrow().len(), 4);

    first.unmount().unwrap();
    assert_eq!(registry.borrow().len(), 2);

    let mut scheduler = ManualScheduler::new();
    click_and_wait(&second, &mut scheduler);
    assert_eq!(count(&second.state().unwrap()), 1);
}

fn named_counter_app() -> App<Value, MemoryHost> {
    let mut host = MemoryHost::new();
    let root = host.create_root("body");
    App::builder(host, root, json!({ "count": 0 }), |state, setter| {
        let increment = setter.clone();
        let seen = count(state);
        Ok(Node::element("button")
            .on_named(EventKind::Click, "increment", move |_| {
                let _ = increment.merge(json!({ "count": seen + 1 }));
            })
            .with_child(Node::text(seen.to_string())))
    })
    .build()
}

#[test]
fn test_interactive_render_with_identical_state_is_a_host_no_op() {
    let app = named_counter_app();
    app.mount().unwrap();
    take_mutations(&app);

    let commit = app.merge(json!({ "count": 0 })).unwrap();

    assert!(matches!(commit, Commit::Applied { stats, .. } if !stats.has_mutations()));
    assert!(take_mutations(&app).is_empty());
}

#[test]
fn test_named_handler_keeps_element_and_swaps_listener() {
    let app = named_counter_app();
    app.mount().unwrap();
    let button = app.with_host(|host, root| host.children(root)[0]).unwrap();
    let registry = app.registry().unwrap();
    let mut scheduler = ManualScheduler::new();

    click_and_wait(&app, &mut scheduler);
    click_and_wait(&app, &mut scheduler);

    assert_eq!(count(&app.state().unwrap()), 2);
    assert_eq!(button_text(&app).as_deref(), Some("2"));
    assert_eq!(app.with_host(|host, root| host.children(root)[0]).unwrap(), button);
    assert!(registry.borrow().is_registered(EventKind::Click, "@increment"));
    assert_eq!(registry.borrow().len(), 1);
}

#[test]
fn test_setter_remount_recovers_after_mismatch() {
    let app = list_app(json!({ "items": ["a", "b"] }));
    app.mount().unwrap();
    let setter = app.setter();
    app.with_host(|host, root| {
        let list = host.children(root)[0];
        host.detach_unlogged(list, 0)
    })
    .unwrap();

    let err = setter.merge(json!({ "items": ["a", "b", "c"] })).unwrap_err();
    assert!(err.is_structural());

    let stats = setter.remount().unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(html(&app), "<ul><li>a</li><li>b</li></ul>");

    drop(app);
    assert!(matches!(setter.remount(), Err(RuntimeError::Dropped)));
}
