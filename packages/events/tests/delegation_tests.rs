//! Delegated routing and click disambiguation against the in-memory host

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use twig_events::{
    ClickOutcome, EventRegistry, ManualScheduler, RegistryConfig, Scheduler, ScopeId,
};
use twig_vdom::{reconcile, Event, EventKind, Handler, HostQuery, MemoryHost, Node, NodeId};

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: &str) -> impl Fn(&Event) + 'static {
    let log = Rc::clone(log);
    let label = label.to_string();
    move |event: &Event| log.borrow_mut().push(format!("{}:{}", label, event.kind))
}

struct Fixture {
    host: MemoryHost,
    root: NodeId,
    registry: EventRegistry<NodeId>,
    scope: ScopeId,
    scheduler: ManualScheduler,
}

impl Fixture {
    fn mount(tree: &Node) -> Self {
        Self::mount_with(tree, RegistryConfig::default())
    }

    fn mount_with(tree: &Node, config: RegistryConfig) -> Self {
        let mut host = MemoryHost::new();
        let root = host.create_root("body");
        reconcile(&mut host, &root, Some(tree), None, 0).unwrap();

        let mut registry = EventRegistry::new(config);
        let scope = registry.open_scope();
        registry.sync_scope(scope, tree.handlers());

        Self {
            host,
            root,
            registry,
            scope,
            scheduler: ManualScheduler::new(),
        }
    }

    /// Follow child indices from the mounted tree's root element
    fn node(&self, path: &[usize]) -> NodeId {
        let mut current = self.host.children(&self.root)[0];
        for index in path {
            current = self.host.children(&current)[*index];
        }
        current
    }

    fn click(&mut self, target: NodeId, at_ms: u64) -> ClickOutcome {
        let event = Event::new(EventKind::Click).at(Duration::from_millis(at_ms));
        self.registry
            .raw_click(event, target, &self.host, &mut self.scheduler)
    }

    /// Advance the clock and release any clicks whose window expired
    fn advance(&mut self, ms: u64) {
        for timer in self.scheduler.advance(Duration::from_millis(ms)) {
            if let Some(routed) = self.registry.fire_pending_click(timer, &self.host) {
                routed.fire();
            }
        }
    }
}

#[test]
fn test_double_click_fires_only_dblclick() {
    let log: Log = Rc::default();
    let tree = Node::element("button")
        .on(EventKind::Click, recorder(&log, "button"))
        .on(EventKind::DblClick, recorder(&log, "button"));
    let mut fx = Fixture::mount(&tree);
    let button = fx.node(&[]);

    let first = fx.click(button, 1000);
    assert!(matches!(first, ClickOutcome::Deferred { flushed: None, .. }));

    let second = fx.click(button, 1200);
    for routed in second.into_routed() {
        routed.fire();
    }
    fx.advance(1000);

    assert_eq!(*log.borrow(), vec!["button:dblclick"]);
    assert_eq!(fx.scheduler.pending_count(), 0);
}

#[test]
fn test_lone_click_fires_after_window() {
    let log: Log = Rc::default();
    let tree = Node::element("button").on(EventKind::Click, recorder(&log, "button"));
    let mut fx = Fixture::mount(&tree);
    let button = fx.node(&[]);

    fx.click(button, 0);
    fx.advance(299);
    assert!(log.borrow().is_empty());

    fx.advance(1);
    assert_eq!(*log.borrow(), vec!["button:click"]);
}

#[test]
fn test_slow_second_click_is_two_clicks() {
    let log: Log = Rc::default();
    let tree = Node::element("button").on(EventKind::Click, recorder(&log, "button"));
    let mut fx = Fixture::mount(&tree);
    let button = fx.node(&[]);

    fx.click(button, 0);
    fx.advance(400);
    fx.click(button, 400);
    fx.advance(400);

    assert_eq!(*log.borrow(), vec!["button:click", "button:click"]);
}

#[test]
fn test_click_on_other_target_flushes_pending_click() {
    let log: Log = Rc::default();
    let tree = Node::element("div")
        .with_child(Node::element("button").on(EventKind::Click, recorder(&log, "a")))
        .with_child(Node::element("button").on(EventKind::Click, recorder(&log, "b")));
    let mut fx = Fixture::mount(&tree);
    let (a, b) = (fx.node(&[0]), fx.node(&[1]));

    fx.click(a, 0);
    match fx.click(b, 100) {
        ClickOutcome::Deferred {
            flushed: Some(routed),
            ..
        } => routed.fire(),
        other => panic!("expected flushed click, got {:?}", other),
    }
    assert_eq!(*log.borrow(), vec!["a:click"]);

    fx.advance(300);
    assert_eq!(*log.borrow(), vec!["a:click", "b:click"]);
}

#[test]
fn test_click_is_immediate_without_dblclick_support() {
    let log: Log = Rc::default();
    let tree = Node::element("button").on(EventKind::Click, recorder(&log, "button"));
    let config = RegistryConfig::default().with_event_kinds([EventKind::Click]);
    let mut fx = Fixture::mount_with(&tree, config);
    let button = fx.node(&[]);

    let outcome = fx.click(button, 0);
    assert!(matches!(outcome, ClickOutcome::Immediate(Some(_))));
    assert_eq!(fx.scheduler.pending_count(), 0);
}

#[test]
fn test_text_target_routes_through_parent() {
    let log: Log = Rc::default();
    let tree = Node::element("div")
        .on(EventKind::KeyUp, recorder(&log, "div"))
        .with_child(Node::element("span").with_child(Node::text("label")));
    let fx = Fixture::mount(&tree);
    let text = fx.node(&[0, 0]);
    assert!(fx.host.is_text(&text));

    let routed = fx
        .registry
        .route(EventKind::KeyUp, Event::new(EventKind::KeyUp), &text, &fx.host)
        .unwrap();
    routed.fire();

    assert_eq!(*log.borrow(), vec!["div:keyup"]);
}

#[test]
fn test_nearest_marked_ancestor_wins() {
    let log: Log = Rc::default();
    let tree = Node::element("div")
        .on(EventKind::KeyDown, recorder(&log, "outer"))
        .with_child(
            Node::element("section")
                .on(EventKind::KeyDown, recorder(&log, "inner"))
                .with_child(Node::element("input")),
        );
    let fx = Fixture::mount(&tree);
    let input = fx.node(&[0, 0]);

    assert!(fx.registry.dispatch(
        EventKind::KeyDown,
        Event::new(EventKind::KeyDown),
        &input,
        &fx.host
    ));
    assert_eq!(*log.borrow(), vec!["inner:keydown"]);
}

#[test]
fn test_stale_marker_falls_through_to_ancestor() {
    let log: Log = Rc::default();
    let inner = Handler::new(EventKind::KeyDown, recorder(&log, "inner"));
    let outer = Handler::new(EventKind::KeyDown, recorder(&log, "outer"));
    let tree = Node::element("div")
        .with_handler(outer.clone())
        .with_child(Node::element("input").with_handler(inner.clone()));
    let mut fx = Fixture::mount(&tree);
    let input = fx.node(&[0]);

    fx.registry.sync_scope(fx.scope, [&outer]);
    fx.registry
        .dispatch(EventKind::KeyDown, Event::new(EventKind::KeyDown), &input, &fx.host);

    assert_eq!(*log.borrow(), vec!["outer:keydown"]);
}

#[test]
fn test_unregistered_event_is_ignored() {
    let log: Log = Rc::default();
    let tree = Node::element("div").on(EventKind::Click, recorder(&log, "div"));
    let fx = Fixture::mount(&tree);
    let div = fx.node(&[]);

    let routed = fx
        .registry
        .route(EventKind::Scroll, Event::new(EventKind::Scroll), &div, &fx.host);
    assert!(routed.is_none());
}

#[test]
fn test_handle_drops_native_dblclick() {
    let log: Log = Rc::default();
    let tree = Node::element("button").on(EventKind::DblClick, recorder(&log, "button"));
    let mut fx = Fixture::mount(&tree);
    let button = fx.node(&[]);

    let routed = fx.registry.handle(
        EventKind::DblClick,
        Event::new(EventKind::DblClick),
        button,
        &fx.host,
        &mut fx.scheduler,
    );
    assert!(routed.is_empty());
}

#[test]
fn test_routed_event_carries_token() {
    let log: Log = Rc::default();
    let handler = Handler::new(EventKind::KeyUp, recorder(&log, "field"));
    let tree = Node::element("input").with_handler(handler.clone());
    let mut fx = Fixture::mount(&tree);
    let input = fx.node(&[]);

    let routed = fx.registry.handle(
        EventKind::KeyUp,
        Event::new(EventKind::KeyUp).with_key("Enter"),
        input,
        &fx.host,
        &mut fx.scheduler,
    );

    assert_eq!(routed.len(), 1);
    assert_eq!(routed[0].token(), Some(handler.token().as_str()));
    assert_eq!(routed[0].event().key.as_deref(), Some("Enter"));
}

#[test]
fn test_manual_timer_cancel_keeps_click_pending() {
    let tree = Node::element("button").on(EventKind::Click, |_: &Event| {});
    let mut fx = Fixture::mount(&tree);
    let button = fx.node(&[]);

    let timer = match fx.click(button, 0) {
        ClickOutcome::Deferred { timer, .. } => timer,
        other => panic!("expected deferred click, got {:?}", other),
    };
    fx.scheduler.cancel(timer);

    assert_eq!(fx.registry.pending_click_timer(), Some(timer));
}
