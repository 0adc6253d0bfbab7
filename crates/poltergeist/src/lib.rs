//! # Poltergeist
//!
//! Poltergeist is a small toolkit for scripting documents whose content shows up
//! late, for example pages that fill themselves in from background requests.
//!
//! It provides:
//! * [`wait`](poll::wait) - resolve once a condition holds, or fail after a timeout
//! * [`get_element`](query::get_element) and [`get_all_elements`](query::get_all_elements) -
//!   selector lookups
//! * [`click_it`](click::click_it) - move the pointer to an element and click it
//! * [`sleep`](time::sleep) - wait a number of milliseconds
//!
//! Everything runs on a single event loop. The clock and the document are
//! capabilities ([`Timer`](time::Timer), [`Query`](query::Query) and
//! [`Target`](event::Target)), with two implementations:
//!
//! ### Simulated
//! [`sim`] has a virtual clock and an in-memory document. Time only moves when
//! you say so, which is what the tests here run on.
//!
//! ### Browser
//! With the `web` feature, [`web`] implements the capabilities with `web-sys`
//! on top of `window.setTimeout`, `document.querySelector` and `MouseEvent`.
//!
//! ## Example
//! ```
//! use futures::FutureExt;
//! use poltergeist::prelude::*;
//!
//! let spook = Poltergeist::simulated();
//! let button = spook.document().create_element("button").with_attribute("id", "go");
//! spook.document().body().append_child(&button);
//!
//! let found = spook.get_element("#go").unwrap();
//! let clicked = spook.click_it(found.as_ref());
//! assert!(clicked.now_or_never().unwrap().is_ok());
//! ```
pub mod click;
pub mod config;
pub mod error;
pub mod event;
pub mod poll;
pub mod query;
pub mod sim;
pub mod sync;
pub mod time;
pub mod truthy;
#[cfg(feature = "web")]
pub mod web;

pub use config::{ClickOptions, Config, PollOptions};
pub use error::{Error, Result};

pub mod prelude {
    //! Re-exports for convenience
    pub use super::click::{click_it, ClickIt};
    pub use super::config::{ClickOptions, Config, PollOptions};
    pub use super::error::{Error, Result};
    pub use super::event::{EventKind, Point, Rect, SyntheticEvent, Target};
    pub use super::poll::{wait, wait_once, wait_until, ConditionPoller, PollArgument, Wait};
    pub use super::query::{get_all_elements, get_element, Query};
    pub use super::time::{sleep, Sleep, Timer, TimerHandle};
    pub use super::truthy::Truthy;
    pub use super::Poltergeist;
}

use poll::{PollArgument, Wait};
use query::Query;
use time::Timer;
use truthy::Truthy;

/// A timer and a document, with the whole toolkit as methods.
#[derive(Clone)]
pub struct Poltergeist<T, D> {
    timer: T,
    document: D,
    config: Config,
}

impl Poltergeist<sim::SimTimer, sim::SimDocument> {
    /// A fresh simulated environment: a virtual clock at zero and an empty document.
    pub fn simulated() -> Self {
        let timer = sim::SimTimer::new();
        let document = sim::SimDocument::new(&timer);
        Poltergeist::new(timer, document)
    }
}

impl<T: Timer, D: Query> Poltergeist<T, D> {
    pub fn new(timer: T, document: D) -> Self {
        Poltergeist {
            timer,
            document,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// See [`poll::wait`]. Uses the configured [`PollOptions`].
    pub fn wait<A, R, F>(&self, predicate: F, argument: PollArgument<A>) -> Wait<R>
    where
        A: 'static,
        R: Truthy + 'static,
        F: FnMut(Option<&A>) -> R + 'static,
    {
        poll::wait(&self.timer, predicate, argument, self.config.poll)
    }

    /// See [`poll::wait`].
    pub fn wait_with<A, R, F>(
        &self,
        predicate: F,
        argument: PollArgument<A>,
        options: PollOptions,
    ) -> Wait<R>
    where
        A: 'static,
        R: Truthy + 'static,
        F: FnMut(Option<&A>) -> R + 'static,
    {
        poll::wait(&self.timer, predicate, argument, options)
    }

    pub fn get_element(&self, selector: &str) -> Result<Option<D::Node>> {
        query::get_element(&self.document, selector)
    }

    pub fn get_all_elements(&self, selector: &str) -> Result<Vec<D::Node>> {
        query::get_all_elements(&self.document, selector)
    }

    /// Wait for an element matching `selector` to appear.
    ///
    /// Resolves with `Some(element)`. An invalid selector fails right away with
    /// [`Error::Selector`] instead of being polled until the deadline.
    pub fn wait_for_element(&self, selector: impl Into<String>) -> Wait<Option<D::Node>>
    where
        D: Clone + 'static,
        D::Node: Truthy,
    {
        let selector = selector.into();
        if let Err(err) = self.document.find_first(&selector) {
            log::warn!("not waiting for an element: {}", err);
            let (settle, settled) = sync::Settle::pair();
            settle.settle(Err(err));
            return settled;
        }
        let document = self.document.clone();
        poll::wait_until(
            &self.timer,
            selector,
            move |selector: &String| {
                query::get_element(&document, selector).unwrap_or_else(|err| {
                    log::error!("{}", err);
                    None
                })
            },
            self.config.poll,
        )
    }

    pub fn click_it(&self, target: Option<&D::Node>) -> click::ClickIt {
        click::click_it(&self.timer, target, self.config.click)
    }

    pub fn sleep(&self, millis: u64) -> time::Sleep {
        time::sleep(&self.timer, millis)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::EventKind;
    use futures::FutureExt;

    #[test]
    fn scripted_session() {
        let _ = env_logger::builder().is_test(true).try_init();
        let spook = Poltergeist::simulated().with_config(
            Config::from_json_str(r#"{"poll": {"timeout_ms": 2000, "interval_ms": 100}}"#).unwrap(),
        );

        // The button arrives "from the network" after 350ms.
        let _ = spook.timer().after(350, {
            let document = spook.document().clone();
            move || {
                let button = document
                    .create_element("button")
                    .with_attribute("class", "submit");
                document.body().append_child(&button);
            }
        });

        let mut found = spook.wait_for_element("button.submit");
        spook.timer().advance(300);
        assert!((&mut found).now_or_never().is_none());
        spook.timer().advance(100);
        let button = found.now_or_never().unwrap().unwrap().unwrap();

        let clicked = spook.click_it(Some(&button));
        assert!(clicked.now_or_never().unwrap().is_ok());

        let slept = spook.sleep(200);
        spook.timer().advance(200);
        assert!(slept.now_or_never().is_some());
        let kinds = button
            .deliveries()
            .into_iter()
            .map(|delivery| delivery.event.kind())
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![EventKind::Move, EventKind::Click]);
    }

    #[test]
    fn wait_for_missing_element_times_out() {
        let spook = Poltergeist::simulated().with_config(Config {
            poll: PollOptions::new(300, 100),
            ..Default::default()
        });
        let found = spook.wait_for_element("#missing");
        spook.timer().run_until_idle();
        assert!(matches!(
            found.now_or_never(),
            Some(Err(Error::Timeout { .. }))
        ));
        assert_eq!(spook.get_element("#missing").unwrap(), None);
        assert!(spook.get_all_elements("#missing").unwrap().is_empty());
    }

    #[test]
    fn wait_without_argument_resolves_with_falsy_value() {
        let spook = Poltergeist::simulated();
        let waited = spook.wait(|_: Option<&()>| false, PollArgument::NoArgument);
        assert!(!waited.now_or_never().unwrap().unwrap());
    }

    #[test]
    fn wait_for_element_rejects_invalid_selectors_at_once() {
        let spook = Poltergeist::simulated();
        let found = spook.wait_for_element("li >> a");
        assert_eq!(spook.timer().pending(), 0);
        assert!(matches!(
            found.now_or_never(),
            Some(Err(Error::Selector(selector))) if selector == "li >> a"
        ));
    }
}
