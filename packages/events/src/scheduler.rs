//! Deferred-callback seam used by click disambiguation.
//!
//! The registry never runs timers itself. It asks a [`Scheduler`] for a timer id
//! and expects the host to call [`EventRegistry::fire_pending_click`] with that id
//! once the delay has elapsed.
//!
//! [`EventRegistry::fire_pending_click`]: crate::EventRegistry::fire_pending_click

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    /// Arm a one-shot timer firing after `delay`
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a timer; cancelling an unknown or already fired timer is a no-op
    fn cancel(&mut self, timer: TimerId);
}

/// Scheduler driven by a virtual clock
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerId, Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, timer: TimerId) -> bool {
        self.pending.contains_key(&timer)
    }

    /// Move the clock forward and return the timers that came due, earliest first
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        self.now += by;
        let now = self.now;

        let mut due: Vec<(Duration, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(timer, at)| (*at, *timer))
            .collect();
        due.sort();

        for (_, timer) in &due {
            self.pending.remove(timer);
        }
        due.into_iter().map(|(_, timer)| timer).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let timer = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(timer, self.now + delay);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        self.pending.remove(&timer);
    }
}
