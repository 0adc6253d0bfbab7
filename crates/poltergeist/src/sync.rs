//! Synchronization primitives.
//!
//! Everything here runs on a single event loop, so sharing is reference
//! counting plus interior mutability, never locking.
use std::{
    cell::{Ref, RefCell, RefMut},
    future::Future,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll, Waker},
};

/// A "shared" value.
///
/// Equivalent to `Rc<RefCell<T>>`.
#[derive(Default)]
pub struct Shared<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Shared<T> {
    /// Create a new shared `T`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Get a reference to the inner `T`.
    pub fn get(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    /// Get a mutable reference to the inner `T`.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    /// Set the inner `T`.
    ///
    /// Returns the previous value.
    pub fn set(&self, value: T) -> T {
        std::mem::replace(&mut *self.inner.borrow_mut(), value)
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the value alive.
    pub fn downgrade(&self) -> WeakShared<T> {
        WeakShared {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// A non-owning [`Shared`].
pub struct WeakShared<T> {
    inner: Weak<RefCell<T>>,
}

impl<T> Clone for WeakShared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> WeakShared<T> {
    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.inner.upgrade().map(|inner| Shared { inner })
    }
}

struct Slot<T> {
    value: Option<T>,
    settled: bool,
    wakers: Vec<Waker>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            value: None,
            settled: false,
            wakers: vec![],
        }
    }
}

/// The writing half of a single-resolution value.
///
/// Any number of clones may race to settle; the first writer wins and every
/// later write is dropped.
pub struct Settle<T> {
    slot: Shared<Slot<T>>,
}

impl<T> Clone for Settle<T> {
    fn clone(&self) -> Self {
        Settle {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Settle<T> {
    /// Create a settle handle and the one future that observes it.
    pub fn pair() -> (Settle<T>, Settled<T>) {
        let slot: Shared<Slot<T>> = Shared::default();
        (Settle { slot: slot.clone() }, Settled { slot })
    }

    /// Settle with `value`.
    ///
    /// Returns `false` if this was already settled, in which case `value` is dropped.
    pub fn settle(&self, value: T) -> bool {
        let wakers = {
            let mut slot = self.slot.get_mut();
            if slot.settled {
                return false;
            }
            slot.settled = true;
            slot.value = Some(value);
            std::mem::take(&mut slot.wakers)
        };
        for waker in wakers.into_iter() {
            waker.wake();
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.slot.get().settled
    }
}

/// A future that resolves with the first value given to its [`Settle`].
pub struct Settled<T> {
    slot: Shared<Slot<T>>,
}

impl<T> Settled<T> {
    /// Whether a value has arrived, whether or not it was already taken.
    pub fn is_settled(&self) -> bool {
        self.slot.get().settled
    }
}

impl<T> Future for Settled<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.get_mut();
        if let Some(value) = slot.value.take() {
            Poll::Ready(value)
        } else if slot.settled {
            panic!("`Settled` polled after completion");
        } else {
            // Store the waker for later.
            slot.wakers.push(cx.waker().clone());
            Poll::Pending
        }
    }
}
