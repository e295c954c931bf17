//! State and update model

use crate::error::{RuntimeError, RuntimeResult};
use serde_json::Value;
use std::fmt;
use std::rc::Weak;
use twig_vdom::ReconcileStats;

/// Application state owned by an [`App`](crate::App)
pub trait State: Clone + 'static {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

/// Objects merge shallowly, key by key. Any other patch replaces the value.
impl State for Value {
    type Patch = Value;

    fn merge(&mut self, patch: Value) {
        match (self, patch) {
            (Value::Object(current), Value::Object(patch)) => {
                for (key, value) in patch {
                    current.insert(key, value);
                }
            }
            (current, patch) => *current = patch,
        }
    }
}

pub enum Update<S: State> {
    Merge(S::Patch),
    Apply(Box<dyn FnOnce(&S) -> S>),
}

impl<S: State> Update<S> {
    pub fn merge(patch: S::Patch) -> Self {
        Update::Merge(patch)
    }

    pub fn apply(f: impl FnOnce(&S) -> S + 'static) -> Self {
        Update::Apply(Box::new(f))
    }

    /// Compute the next state without touching `current`
    pub(crate) fn resolve(self, current: &S) -> S {
        match self {
            Update::Merge(patch) => {
                let mut next = current.clone();
                next.merge(patch);
                next
            }
            Update::Apply(f) => f(current),
        }
    }
}

impl<S: State> fmt::Debug for Update<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Merge(_) => f.write_str("Update::Merge(..)"),
            Update::Apply(_) => f.write_str("Update::Apply(..)"),
        }
    }
}

/// What a submitted update resulted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The queue was flushed; `updates` includes any that queued up meanwhile
    Applied {
        updates: usize,
        stats: ReconcileStats,
    },
    /// A commit was already running; the update will be applied when it finishes
    Queued,
}

pub(crate) trait UpdateSink<S: State> {
    fn submit(&self, update: Update<S>) -> RuntimeResult<Commit>;

    fn remount(&self) -> RuntimeResult<ReconcileStats>;
}

/// Handle for submitting state updates to a mounted app.
///
/// Passed to the render function and meant to be captured by event handlers.
/// Holding a setter does not keep the app alive.
pub struct Setter<S: State> {
    sink: Weak<dyn UpdateSink<S>>,
}

impl<S: State> Setter<S> {
    pub(crate) fn new(sink: Weak<dyn UpdateSink<S>>) -> Self {
        Self { sink }
    }

    pub fn set(&self, update: Update<S>) -> RuntimeResult<Commit> {
        let sink = self.sink.upgrade().ok_or(RuntimeError::Dropped)?;
        sink.submit(update)
    }

    pub fn merge(&self, patch: S::Patch) -> RuntimeResult<Commit> {
        self.set(Update::Merge(patch))
    }

    pub fn apply(&self, f: impl FnOnce(&S) -> S + 'static) -> RuntimeResult<Commit> {
        self.set(Update::apply(f))
    }

    /// Rebuild the app's host tree from its current state, see
    /// [`App::remount`](crate::App::remount). Handlers use this to recover from
    /// a structural mismatch.
    pub fn remount(&self) -> RuntimeResult<ReconcileStats> {
        let sink = self.sink.upgrade().ok_or(RuntimeError::Dropped)?;
        sink.remount()
    }

    pub fn is_live(&self) -> bool {
        self.sink.strong_count() > 0
    }
}

impl<S: State> Clone for Setter<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Weak::clone(&self.sink),
        }
    }
}

impl<S: State> fmt::Debug for Setter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("live", &self.is_live())
            .finish()
    }
}
