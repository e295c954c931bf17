//! Click / double-click tracking state.
//!
//! A real double click also produces two single clicks, so a click is held back
//! for the configured window. Only one click is ever held back per registry.

use crate::scheduler::TimerId;
use std::time::Duration;
use twig_vdom::Event;

#[derive(Debug, Clone)]
pub(crate) struct PendingClick<H> {
    pub timer: TimerId,
    pub target: H,
    pub event: Event,
}

#[derive(Debug)]
pub(crate) struct ClickTracker<H> {
    last: Option<(H, Duration)>,
    pending: Option<PendingClick<H>>,
}

impl<H> Default for ClickTracker<H> {
    fn default() -> Self {
        Self {
            last: None,
            pending: None,
        }
    }
}

impl<H: Clone + PartialEq> ClickTracker<H> {
    /// A click on `target` at `at` completes a double click
    pub fn is_double(&self, target: &H, at: Duration, window: Duration) -> bool {
        match (&self.last, &self.pending) {
            (Some((last_target, last_at)), Some(_)) => {
                last_target == target && at.saturating_sub(*last_at) <= window
            }
            _ => false,
        }
    }

    pub fn take_pending(&mut self) -> Option<PendingClick<H>> {
        self.pending.take()
    }

    /// Take the pending click if `timer` is the one guarding it
    pub fn take_if_timer(&mut self, timer: TimerId) -> Option<PendingClick<H>> {
        if self.pending.as_ref().map(|p| p.timer) != Some(timer) {
            return None;
        }
        self.last = None;
        self.pending.take()
    }

    pub fn arm(&mut self, pending: PendingClick<H>) {
        self.last = Some((pending.target.clone(), pending.event.timestamp));
        self.pending = Some(pending);
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.pending = None;
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending.as_ref().map(|p| p.timer)
    }
}
