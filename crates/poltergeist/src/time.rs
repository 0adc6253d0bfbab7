//! Wait or sleep or delay future.
//!
//! Time is a capability: everything that needs a clock or a deferred callback
//! goes through a [`Timer`]. In the browser that is `window.setTimeout` and
//! `performance.now()`; in tests it is a virtual clock that only moves when told to.
use crate::sync::{Settle, Settled};

/// A scheduled callback.
///
/// Dropping a handle does **not** cancel the callback.
pub trait TimerHandle {
    /// Prevent the callback from running, if it has not run yet.
    fn cancel(self);
}

/// Schedules callbacks on a single event loop.
pub trait Timer: Clone + 'static {
    type Handle: TimerHandle + 'static;

    /// Returns a timestamp representing the number of milliseconds elapsed
    /// since an arbitrary, fixed start time.
    fn now(&self) -> f64;

    /// Call `callback` once, no sooner than `millis` milliseconds from now.
    ///
    /// The callback never runs from inside this call.
    fn after(&self, millis: u64, callback: impl FnOnce() + 'static) -> Self::Handle;
}

/// The future returned by [`sleep`].
pub type Sleep = Settled<()>;

/// Wait approximately the given number of milliseconds.
///
/// There is no way to cancel a sleep; dropping the future only discards the
/// wake-up.
pub fn sleep<T: Timer>(timer: &T, millis: u64) -> Sleep {
    let (settle, settled) = Settle::pair();
    let start = timer.now();
    let clock = timer.clone();
    let _handle = timer.after(millis, move || {
        log::trace!("slept for {}ms (asked for {}ms)", clock.now() - start, millis);
        settle.settle(());
    });
    settled
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimTimer;
    use futures::FutureExt;

    #[test]
    fn sleeps_no_less_than_asked() {
        let timer = SimTimer::new();
        let mut slept = sleep(&timer, 250);
        timer.advance(249);
        assert!((&mut slept).now_or_never().is_none());
        timer.advance(1);
        assert_eq!(timer.now(), 250.0);
        assert!(slept.now_or_never().is_some());
    }

    #[test]
    fn zero_sleep_still_defers() {
        let timer = SimTimer::new();
        let slept = sleep(&timer, 0);
        assert!(!slept.is_settled());
        timer.run_until_idle();
        assert!(slept.is_settled());
    }

    #[test]
    fn cancelled_callbacks_never_run() {
        let timer = SimTimer::new();
        let ran = crate::sync::Shared::new(false);
        let handle = timer.after(10, {
            let ran = ran.clone();
            move || {
                ran.set(true);
            }
        });
        handle.cancel();
        timer.advance(100);
        assert!(!*ran.get());
    }
}
