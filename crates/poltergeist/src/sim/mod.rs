//! A simulated document environment.
//!
//! [`SimTimer`] is a virtual clock: time only moves when [`SimTimer::advance`]
//! or [`SimTimer::run_until_idle`] is called, which makes every timing
//! property of [`wait`](crate::poll::wait) and [`click_it`](crate::click::click_it)
//! reproducible. [`SimDocument`] is an in-memory element tree that answers
//! selector queries and records every event delivered to its elements.
mod clock;
mod dom;
mod selector;

pub use clock::{SimTimeout, SimTimer};
pub use dom::{Delivery, SimDocument, SimElement};
pub use selector::Selector;
