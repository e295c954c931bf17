//! # Render coordinator
//!
//! An [`App`] owns the current state, the last committed tree (the baseline)
//! and the host it renders into. Every update runs the same commit:
//!
//! ```text
//! update ──► next state ──► render ──► reconcile(root, new, baseline) ──► commit ──► sync handlers
//! ```
//!
//! Nothing is committed unless render and reconcile both succeed. Updates
//! submitted while a commit is running (from the render function, or from a
//! handler fired during a host mutation) are queued and applied by the same
//! flush, or rejected, depending on [`ReentrancyPolicy`].

use crate::config::{AppConfig, ReentrancyPolicy};
use crate::error::{RuntimeError, RuntimeResult};
use crate::state::{Commit, Setter, State, Update, UpdateSink};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info, instrument, warn};
use twig_events::{EventRegistry, ScopeId, SharedRegistry};
use twig_vdom::{reconcile, HostAdapter, Node, ReconcileError, ReconcileStats};

pub type RenderFn<S> = Box<dyn Fn(&S, &Setter<S>) -> anyhow::Result<Node>>;

type Handle<H> = <H as HostAdapter>::Handle;

pub struct AppBuilder<S: State, H: HostAdapter> {
    host: H,
    root: Handle<H>,
    state: S,
    render: RenderFn<S>,
    registry: Option<SharedRegistry<Handle<H>>>,
    config: AppConfig,
}

impl<S: State, H: HostAdapter + 'static> AppBuilder<S, H> {
    /// Share an existing registry with this app. Without one, `build` creates
    /// a private registry from the app config.
    pub fn with_registry(mut self, registry: SharedRegistry<Handle<H>>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> App<S, H> {
        let registry = self.registry.unwrap_or_else(|| {
            Rc::new(RefCell::new(EventRegistry::new(self.config.events.clone())))
        });
        let scope = registry.borrow_mut().open_scope();

        let core = Core {
            host: self.host,
            root: self.root,
            state: self.state,
            baseline: None,
            render: self.render,
            registry,
            scope,
        };
        let config = self.config;

        let shared = Rc::new_cyclic(|weak: &Weak<Shared<S, H>>| {
            let sink: Weak<dyn UpdateSink<S>> = weak.clone();
            Shared {
                core: RefCell::new(core),
                queue: RefCell::new(VecDeque::new()),
                busy: Cell::new(false),
                config,
                setter: Setter::new(sink),
            }
        });

        App { shared }
    }
}

pub struct App<S: State, H: HostAdapter + 'static> {
    shared: Rc<Shared<S, H>>,
}

struct Shared<S: State, H: HostAdapter> {
    core: RefCell<Core<S, H>>,
    queue: RefCell<VecDeque<Update<S>>>,
    busy: Cell<bool>,
    config: AppConfig,
    setter: Setter<S>,
}

struct Core<S: State, H: HostAdapter> {
    host: H,
    root: Handle<H>,
    state: S,
    baseline: Option<Node>,
    render: RenderFn<S>,
    registry: SharedRegistry<Handle<H>>,
    scope: ScopeId,
}

/// Clears the busy flag however a commit ends
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        BusyGuard(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: State, H: HostAdapter + 'static> App<S, H> {
    pub fn builder(
        host: H,
        root: Handle<H>,
        state: S,
        render: impl Fn(&S, &Setter<S>) -> anyhow::Result<Node> + 'static,
    ) -> AppBuilder<S, H> {
        AppBuilder {
            host,
            root,
            state,
            render: Box::new(render),
            registry: None,
            config: AppConfig::default(),
        }
    }

    /// Render the initial state into the (empty) root container
    #[instrument(level = "debug", skip(self))]
    pub fn mount(&self) -> RuntimeResult<ReconcileStats> {
        let shared = &*self.shared;
        if shared.busy.get() {
            return Err(RuntimeError::Busy);
        }

        let stats = {
            let _guard = BusyGuard::enter(&shared.busy);
            let mut core = shared.core.try_borrow_mut().map_err(|_| RuntimeError::Busy)?;
            if core.baseline.is_some() {
                return Err(RuntimeError::AlreadyMounted);
            }
            if core.host.child_at(&core.root, 0).is_some() {
                return Err(RuntimeError::RootNotEmpty);
            }
            core.mount(&shared.setter)?
        };

        info!(created = stats.created, "Mounted app");
        shared.flush_queued()?;
        Ok(stats)
    }

    /// Submit an update. Outside a commit the update is applied immediately,
    /// together with anything it causes to be queued.
    #[instrument(level = "debug", skip(self))]
    pub fn set_state(&self, update: Update<S>) -> RuntimeResult<Commit> {
        self.shared.submit(update)
    }

    pub fn merge(&self, patch: S::Patch) -> RuntimeResult<Commit> {
        self.set_state(Update::Merge(patch))
    }

    pub fn setter(&self) -> Setter<S> {
        self.shared.setter.clone()
    }

    /// Remove the committed tree from the host and forget its handlers
    pub fn unmount(&self) -> RuntimeResult<ReconcileStats> {
        let shared = &*self.shared;
        if shared.busy.get() {
            return Err(RuntimeError::Busy);
        }

        let _guard = BusyGuard::enter(&shared.busy);
        shared.queue.borrow_mut().clear();
        let mut core = shared.core.try_borrow_mut().map_err(|_| RuntimeError::Busy)?;

        let stats = {
            let Core {
                host,
                root,
                baseline,
                ..
            } = &mut *core;
            let old = baseline.as_ref().ok_or(RuntimeError::NotMounted)?;
            reconcile(host, root, None, Some(old), 0)?
        };
        core.baseline = None;
        core.clear_handlers()?;

        info!("Unmounted app");
        Ok(stats)
    }

    /// Throw away whatever is in the root container and render the current
    /// state from scratch. Used to recover after a structural mismatch.
    #[instrument(level = "debug", skip(self))]
    pub fn remount(&self) -> RuntimeResult<ReconcileStats> {
        UpdateSink::remount(&*self.shared)
    }

    pub fn is_mounted(&self) -> bool {
        self.shared
            .core
            .try_borrow()
            .map_or(false, |core| core.baseline.is_some())
    }

    /// Clone the committed state and baseline
    pub fn snapshot(&self) -> RuntimeResult<(S, Option<Node>)> {
        let core = self.shared.core.try_borrow().map_err(|_| RuntimeError::Busy)?;
        Ok((core.state.clone(), core.baseline.clone()))
    }

    pub fn state(&self) -> RuntimeResult<S> {
        Ok(self.snapshot()?.0)
    }

    /// Scoped access to the host and root handle
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H, &Handle<H>) -> R) -> RuntimeResult<R> {
        let mut core = self
            .shared
            .core
            .try_borrow_mut()
            .map_err(|_| RuntimeError::Busy)?;
        let Core { host, root, .. } = &mut *core;
        Ok(f(host, root))
    }

    pub fn registry(&self) -> RuntimeResult<SharedRegistry<Handle<H>>> {
        let core = self.shared.core.try_borrow().map_err(|_| RuntimeError::Busy)?;
        Ok(Rc::clone(&core.registry))
    }

    pub fn scope(&self) -> RuntimeResult<ScopeId> {
        let core = self.shared.core.try_borrow().map_err(|_| RuntimeError::Busy)?;
        Ok(core.scope)
    }

    pub fn config(&self) -> &AppConfig {
        &self.shared.config
    }
}

impl<S: State, H: HostAdapter + 'static> fmt::Debug for App<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("mounted", &self.is_mounted())
            .field("busy", &self.shared.busy.get())
            .finish()
    }
}

impl<S: State, H: HostAdapter + 'static> UpdateSink<S> for Shared<S, H> {
    fn submit(&self, update: Update<S>) -> RuntimeResult<Commit> {
        if self.busy.get() {
            return match self.config.reentrancy {
                ReentrancyPolicy::Queue => {
                    debug!(?update, "Queued re-entrant update");
                    self.queue.borrow_mut().push_back(update);
                    Ok(Commit::Queued)
                }
                ReentrancyPolicy::Reject => {
                    warn!(?update, "Rejected re-entrant update");
                    Err(RuntimeError::Reentrant)
                }
            };
        }

        let mounted = self
            .core
            .try_borrow()
            .map_err(|_| RuntimeError::Busy)?
            .baseline
            .is_some();
        if !mounted {
            return Err(RuntimeError::NotMounted);
        }

        self.queue.borrow_mut().push_back(update);
        self.flush()
    }

    fn remount(&self) -> RuntimeResult<ReconcileStats> {
        if self.busy.get() {
            return Err(RuntimeError::Busy);
        }

        let stats = {
            let _guard = BusyGuard::enter(&self.busy);
            self.queue.borrow_mut().clear();
            let mut core = self.core.try_borrow_mut().map_err(|_| RuntimeError::Busy)?;
            core.clear_root()?;
            core.baseline = None;
            core.mount(&self.setter)?
        };

        warn!(created = stats.created, "Remounted app from current state");
        self.flush_queued()?;
        Ok(stats)
    }
}

impl<S: State, H: HostAdapter + 'static> Shared<S, H> {
    /// Apply queued updates in FIFO order until the queue is empty
    fn flush(&self) -> RuntimeResult<Commit> {
        let _guard = BusyGuard::enter(&self.busy);
        let limit = self.config.max_updates_per_flush;
        let mut updates = 0;
        let mut total = ReconcileStats::default();

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let update = match next {
                Some(update) => update,
                None => break,
            };

            if updates == limit {
                let dropped = self.discard_queue() + 1;
                warn!(limit, dropped, "Update loop detected; discarded pending updates");
                return Err(RuntimeError::UpdateLoop { limit });
            }

            let result = match self.core.try_borrow_mut() {
                Ok(mut core) => core.commit(update, &self.setter),
                Err(_) => Err(RuntimeError::Busy),
            };
            match result {
                Ok(stats) => total += stats,
                Err(err) => {
                    let dropped = self.discard_queue();
                    if dropped > 0 {
                        warn!(dropped, "Discarded queued updates after failed commit");
                    }
                    return Err(err);
                }
            }
            updates += 1;
        }

        info!(
            updates,
            created = total.created,
            replaced = total.replaced,
            removed = total.removed,
            moved = total.moved,
            "Committed state"
        );
        Ok(Commit::Applied {
            updates,
            stats: total,
        })
    }

    /// Flush whatever queued up while a mount was rendering
    fn flush_queued(&self) -> RuntimeResult<()> {
        if !self.queue.borrow().is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    fn discard_queue(&self) -> usize {
        self.queue.borrow_mut().drain(..).count()
    }
}

impl<S: State, H: HostAdapter> Core<S, H> {
    fn mount(&mut self, setter: &Setter<S>) -> RuntimeResult<ReconcileStats> {
        let tree = (self.render)(&self.state, setter).map_err(RuntimeError::Render)?;
        let stats = reconcile(&mut self.host, &self.root, Some(&tree), None, 0)?;
        self.baseline = Some(tree);
        self.sync_handlers()?;
        Ok(stats)
    }

    /// Render `update`'s result and reconcile it. State and baseline only
    /// change once the host has been brought in line.
    fn commit(&mut self, update: Update<S>, setter: &Setter<S>) -> RuntimeResult<ReconcileStats> {
        let next = update.resolve(&self.state);
        let tree = (self.render)(&next, setter).map_err(|err| {
            warn!(error = %err, "Render failed; state left unchanged");
            RuntimeError::Render(err)
        })?;

        let stats = reconcile(
            &mut self.host,
            &self.root,
            Some(&tree),
            self.baseline.as_ref(),
            0,
        )?;

        self.state = next;
        self.baseline = Some(tree);
        self.sync_handlers()?;
        Ok(stats)
    }

    fn sync_handlers(&self) -> RuntimeResult<()> {
        let mut registry = self
            .registry
            .try_borrow_mut()
            .map_err(|_| RuntimeError::RegistryBusy)?;
        let handlers = self
            .baseline
            .as_ref()
            .map(Node::handlers)
            .unwrap_or_default();
        registry.sync_scope(self.scope, handlers);
        Ok(())
    }

    fn clear_handlers(&self) -> RuntimeResult<()> {
        let mut registry = self
            .registry
            .try_borrow_mut()
            .map_err(|_| RuntimeError::RegistryBusy)?;
        registry.clear_scope(self.scope);
        Ok(())
    }

    /// Detach every child of the root, last first
    fn clear_root(&mut self) -> RuntimeResult<()> {
        let mut removed = 0;
        while let Some(child) = last_child(&self.host, &self.root) {
            self.host
                .remove_child(&self.root, &child)
                .map_err(ReconcileError::from)?;
            removed += 1;
        }
        debug!(removed, "Cleared root container");
        Ok(())
    }
}

fn last_child<H: HostAdapter>(host: &H, parent: &H::Handle) -> Option<H::Handle> {
    let mut index = 0;
    let mut last = None;
    while let Some(child) = host.child_at(parent, index) {
        last = Some(child);
        index += 1;
    }
    last
}
