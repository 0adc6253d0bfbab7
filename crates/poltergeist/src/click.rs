//! Simulated pointer clicks.
//!
//! [`click_it`] moves the pointer to the center of an element, then clicks it
//! after a short delay. The returned future resolves as soon as either event is
//! observed on the element, which in practice is always the move: it is
//! dispatched synchronously, well before the click is even sent.
use crate::{
    config::ClickOptions,
    error::{Error, Result},
    event::{EventKind, SyntheticEvent, Target},
    sync::{Settle, Settled},
    time::Timer,
};

/// The future returned by [`click_it`].
pub type ClickIt = Settled<Result<()>>;

/// Move to the center of `target` and click it.
///
/// A missing target fails right away with [`Error::ElementMissing`] and
/// nothing is dispatched.
pub fn click_it<T: Timer, N: Target>(
    timer: &T,
    target: Option<&N>,
    options: ClickOptions,
) -> ClickIt {
    let (settle, settled) = Settle::pair();
    match target {
        None => {
            log::warn!("{}", Error::ElementMissing);
            settle.settle(Err(Error::ElementMissing));
        }
        Some(node) => {
            if let Err(err) = sequence(timer, node, &settle, options) {
                settle.settle(Err(err));
            }
        }
    }
    settled
}

fn sequence<T: Timer, N: Target>(
    timer: &T,
    node: &N,
    settle: &Settle<Result<()>>,
    options: ClickOptions,
) -> Result<()> {
    let center = node.bounding_rect().center();

    node.observe_once(EventKind::Move, {
        let settle = settle.clone();
        move || {
            if settle.settle(Ok(())) {
                log::trace!("pointer move observed");
            }
        }
    })?;
    log::trace!("moving pointer to ({}, {})", center.x, center.y);
    node.dispatch(&SyntheticEvent::move_to(center))?;

    node.observe_once(EventKind::Click, {
        let settle = settle.clone();
        move || {
            if !settle.settle(Ok(())) {
                log::trace!("click observed after the move already settled");
            }
        }
    })?;
    let node = node.clone();
    let _handle = timer.after(options.click_delay_ms, move || {
        log::trace!("clicking");
        if let Err(err) = node.dispatch(&SyntheticEvent::click()) {
            log::error!("delayed click was not dispatched: {}", err);
        }
    });
    Ok(())
}
