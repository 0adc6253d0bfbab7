use std::collections::BTreeMap;

use crate::{
    sync::{Shared, WeakShared},
    time::{Timer, TimerHandle},
};

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct Clock {
    now: u64,
    next_id: u64,
    /// Keyed by due time, then by scheduling order.
    queue: BTreeMap<(u64, u64), Callback>,
}

/// A virtual-time [`Timer`].
#[derive(Clone, Default)]
pub struct SimTimer {
    clock: Shared<Clock>,
}

/// Handle to a callback scheduled on a [`SimTimer`].
pub struct SimTimeout {
    key: (u64, u64),
    clock: WeakShared<Clock>,
}

impl TimerHandle for SimTimeout {
    fn cancel(self) {
        if let Some(clock) = self.clock.upgrade() {
            clock.get_mut().queue.remove(&self.key);
        }
    }
}

impl Timer for SimTimer {
    type Handle = SimTimeout;

    fn now(&self) -> f64 {
        self.clock.get().now as f64
    }

    fn after(&self, millis: u64, callback: impl FnOnce() + 'static) -> SimTimeout {
        let mut clock = self.clock.get_mut();
        let key = (clock.now.saturating_add(millis), clock.next_id);
        clock.next_id += 1;
        clock.queue.insert(key, Box::new(callback));
        SimTimeout {
            key,
            clock: self.clock.downgrade(),
        }
    }
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since this timer was created.
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.get().now
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.clock.get().queue.len()
    }

    fn pop_due(&self, until: u64) -> Option<Callback> {
        let mut clock = self.clock.get_mut();
        let key = *clock.queue.keys().next()?;
        if key.0 > until {
            return None;
        }
        clock.now = clock.now.max(key.0);
        clock.queue.remove(&key)
    }

    /// Move time forward by `millis`, running every callback that comes due
    /// in order, including callbacks scheduled along the way.
    pub fn advance(&self, millis: u64) {
        let until = self.clock.get().now.saturating_add(millis);
        while let Some(callback) = self.pop_due(until) {
            callback();
        }
        self.clock.get_mut().now = until;
    }

    /// Run callbacks until none are left, jumping time forward to each one.
    ///
    /// Never returns if callbacks keep rescheduling themselves forever.
    pub fn run_until_idle(&self) {
        while let Some(callback) = self.pop_due(u64::MAX) {
            callback();
        }
    }
}
