//! Delegated event registry.
//!
//! Handlers are not attached to host nodes. A node carries a `data-on<kind>`
//! marker whose value is a token, and a single listener per kind at the root
//! looks the token up here. Routing walks from the event target towards the
//! root and the first marked ancestor with a live registration wins.

use crate::click::{ClickTracker, PendingClick};
use crate::config::RegistryConfig;
use crate::error::{EventError, EventResult};
use crate::scheduler::{Scheduler, TimerId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};
use twig_vdom::{Event, EventKind, EventListener, Handler, HostQuery};

pub type SharedRegistry<H> = Rc<RefCell<EventRegistry<H>>>;

/// Handle for a group of registrations that is replaced wholesale on every sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Registered through [`EventRegistry::register`]; only removed explicitly
    Manual,
    Scope(ScopeId),
}

struct Registration {
    owner: Owner,
    listener: Rc<dyn EventListener>,
}

/// A resolved dispatch, ready to run.
///
/// Routing and firing are separate steps so callers holding the registry in a
/// `RefCell` can release the borrow before listeners run.
pub struct Routed {
    listener: Rc<dyn EventListener>,
    event: Event,
}

impl Routed {
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn token(&self) -> Option<&str> {
        self.event.token.as_deref()
    }

    pub fn fire(self) {
        self.listener.on_event(&self.event);
    }
}

impl fmt::Debug for Routed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routed").field("event", &self.event).finish()
    }
}

/// Result of feeding a raw click through the disambiguator
#[derive(Debug)]
pub enum ClickOutcome {
    /// Click held back until `timer` fires. A previously held click, if any,
    /// was released early and is returned in `flushed`.
    Deferred {
        timer: TimerId,
        flushed: Option<Routed>,
    },
    /// Second click on the same target inside the window
    DoubleClick(Option<Routed>),
    /// Double clicks are not enabled, so the click routes straight away
    Immediate(Option<Routed>),
}

impl ClickOutcome {
    pub fn into_routed(self) -> Vec<Routed> {
        match self {
            ClickOutcome::Deferred { flushed, .. } => flushed.into_iter().collect(),
            ClickOutcome::DoubleClick(routed) | ClickOutcome::Immediate(routed) => {
                routed.into_iter().collect()
            }
        }
    }
}

pub struct EventRegistry<H> {
    config: RegistryConfig,
    handlers: HashMap<EventKind, HashMap<String, Registration>>,
    next_scope: u64,
    clicks: ClickTracker<H>,
}

impl<H> Default for EventRegistry<H> {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<H> EventRegistry<H> {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            handlers: HashMap::new(),
            next_scope: 0,
            clicks: ClickTracker::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn is_supported(&self, kind: EventKind) -> bool {
        self.config.supports(kind)
    }

    /// Register `listener` for `token` under `kind`, replacing any previous entry.
    pub fn register(
        &mut self,
        kind: EventKind,
        token: impl Into<String>,
        listener: impl EventListener + 'static,
    ) -> EventResult<()> {
        self.insert(kind, token.into(), Owner::Manual, Rc::new(listener))
    }

    /// Same as [`register`](Self::register) with the kind given by name
    pub fn register_str(
        &mut self,
        kind: &str,
        token: impl Into<String>,
        listener: impl EventListener + 'static,
    ) -> EventResult<()> {
        let kind: EventKind = kind.parse().map_err(|_| {
            warn!(kind, "Rejected registration for unknown event kind");
            EventError::UnknownEventKind(kind.to_string())
        })?;
        self.register(kind, token, listener)
    }

    pub fn unregister(&mut self, kind: EventKind, token: &str) -> bool {
        let removed = self
            .handlers
            .get_mut(&kind)
            .and_then(|table| table.remove(token))
            .is_some();
        if removed {
            trace!(%kind, token, "Unregistered handler");
        }
        removed
    }

    pub fn open_scope(&mut self) -> ScopeId {
        let scope = ScopeId(self.next_scope);
        self.next_scope += 1;
        scope
    }

    /// Replace every registration owned by `scope` with `handlers`.
    ///
    /// Handlers of kinds this registry does not support are skipped with a
    /// warning. Returns the number of live registrations for the scope.
    pub fn sync_scope<'a>(
        &mut self,
        scope: ScopeId,
        handlers: impl IntoIterator<Item = &'a Handler>,
    ) -> usize {
        self.clear_scope(scope);

        let mut count = 0;
        for handler in handlers {
            match self.insert(
                handler.kind(),
                handler.token(),
                Owner::Scope(scope),
                handler.listener(),
            ) {
                Ok(()) => count += 1,
                Err(err) => debug!(token = %handler.token(), "Skipped handler: {}", err),
            }
        }

        debug!(scope = scope.0, handlers = count, "Synced handler scope");
        count
    }

    pub fn clear_scope(&mut self, scope: ScopeId) {
        for table in self.handlers.values_mut() {
            table.retain(|_, reg| reg.owner != Owner::Scope(scope));
        }
    }

    pub fn is_registered(&self, kind: EventKind, token: &str) -> bool {
        self.handlers
            .get(&kind)
            .map_or(false, |table| table.contains_key(token))
    }

    pub fn owner(&self, kind: EventKind, token: &str) -> Option<Owner> {
        self.handlers.get(&kind)?.get(token).map(|reg| reg.owner)
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(
        &mut self,
        kind: EventKind,
        token: String,
        owner: Owner,
        listener: Rc<dyn EventListener>,
    ) -> EventResult<()> {
        if !self.config.supports(kind) {
            warn!(%kind, %token, "Rejected registration for unsupported event kind");
            return Err(EventError::UnsupportedEventKind(kind));
        }

        trace!(%kind, %token, ?owner, "Registered handler");
        self.handlers
            .entry(kind)
            .or_default()
            .insert(token, Registration { owner, listener });
        Ok(())
    }
}

impl<H: Clone + PartialEq + fmt::Debug> EventRegistry<H> {
    /// Resolve the handler for an event of `kind` raised at `target`.
    ///
    /// Text targets start the walk at their parent element. Markers whose token
    /// has no live registration are skipped.
    pub fn route<Q>(&self, kind: EventKind, mut event: Event, target: &H, host: &Q) -> Option<Routed>
    where
        Q: HostQuery<Handle = H>,
    {
        let table = self.handlers.get(&kind)?;
        let marker = kind.marker_attribute();

        let mut current = if host.is_text(target) {
            host.parent(target)
        } else {
            Some(target.clone())
        };

        while let Some(node) = current {
            if let Some(token) = host.attribute(&node, &marker) {
                match table.get(&token) {
                    Some(reg) => {
                        trace!(%kind, %token, "Routed event");
                        event.kind = kind;
                        event.token = Some(token);
                        return Some(Routed {
                            listener: Rc::clone(&reg.listener),
                            event,
                        });
                    }
                    None => trace!(%kind, %token, "Skipped stale marker"),
                }
            }
            current = host.parent(&node);
        }
        None
    }

    /// Route and fire in one step. Returns whether a handler ran.
    pub fn dispatch<Q>(&self, kind: EventKind, event: Event, target: &H, host: &Q) -> bool
    where
        Q: HostQuery<Handle = H>,
    {
        match self.route(kind, event, target, host) {
            Some(routed) => {
                routed.fire();
                true
            }
            None => false,
        }
    }

    /// Feed a raw click through double-click disambiguation.
    ///
    /// A second click on the same target while the first is still held back
    /// cancels the timer and routes a `dblclick`. Otherwise any held click is
    /// released immediately and this one is held back behind a new timer.
    pub fn raw_click<Q, S>(&mut self, event: Event, target: H, host: &Q, scheduler: &mut S) -> ClickOutcome
    where
        Q: HostQuery<Handle = H>,
        S: Scheduler + ?Sized,
    {
        if !self.config.supports(EventKind::DblClick) {
            return ClickOutcome::Immediate(self.route(EventKind::Click, event, &target, host));
        }

        let window = self.config.click_delay();
        if self.clicks.is_double(&target, event.timestamp, window) {
            if let Some(pending) = self.clicks.take_pending() {
                scheduler.cancel(pending.timer);
            }
            self.clicks.reset();
            debug!(?target, "Detected double click");
            return ClickOutcome::DoubleClick(self.route(EventKind::DblClick, event, &target, host));
        }

        let flushed = match self.clicks.take_pending() {
            Some(pending) => {
                scheduler.cancel(pending.timer);
                self.route(EventKind::Click, pending.event, &pending.target, host)
            }
            None => None,
        };

        let timer = scheduler.schedule(window);
        self.clicks.arm(PendingClick { timer, target, event });
        ClickOutcome::Deferred { timer, flushed }
    }

    /// Release the click held back by `timer`. Stale timers resolve to `None`.
    pub fn fire_pending_click<Q>(&mut self, timer: TimerId, host: &Q) -> Option<Routed>
    where
        Q: HostQuery<Handle = H>,
    {
        let pending = self.clicks.take_if_timer(timer)?;
        self.route(EventKind::Click, pending.event, &pending.target, host)
    }

    pub fn pending_click_timer(&self) -> Option<TimerId> {
        self.clicks.pending_timer()
    }

    /// Entry point for a native event. Clicks go through disambiguation, native
    /// double clicks are ignored since they are synthesized from clicks.
    pub fn handle<Q, S>(
        &mut self,
        kind: EventKind,
        event: Event,
        target: H,
        host: &Q,
        scheduler: &mut S,
    ) -> Vec<Routed>
    where
        Q: HostQuery<Handle = H>,
        S: Scheduler + ?Sized,
    {
        match kind {
            EventKind::Click => self.raw_click(event, target, host, scheduler).into_routed(),
            EventKind::DblClick => Vec::new(),
            _ => self.route(kind, event, &target, host).into_iter().collect(),
        }
    }
}
