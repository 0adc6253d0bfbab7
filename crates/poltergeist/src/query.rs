//! Element lookup.
//!
//! These never wait. To wait for an element to show up, poll for it:
//!
//! ```
//! use futures::FutureExt;
//! use poltergeist::{prelude::*, sim::{SimDocument, SimTimer}};
//!
//! let timer = SimTimer::new();
//! let document = SimDocument::new(&timer);
//! let found = wait_until(
//!     &timer,
//!     "#late".to_string(),
//!     {
//!         let document = document.clone();
//!         move |selector| get_element(&document, selector)
//!     },
//!     PollOptions::default(),
//! );
//!
//! let late = document.create_element("p").with_attribute("id", "late");
//! document.body().append_child(&late);
//! timer.advance(500);
//! assert_eq!(found.now_or_never().unwrap().unwrap().unwrap(), Some(late));
//! ```
use crate::{error::Result, event::Target};

/// Selector queries over a document.
pub trait Query {
    type Node: Target;

    /// The first element in document order matching `selector`.
    fn find_first(&self, selector: &str) -> Result<Option<Self::Node>>;

    /// Every element matching `selector`, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Self::Node>>;
}

/// Find the first element matching a CSS selector, if any.
pub fn get_element<Q: Query>(document: &Q, selector: &str) -> Result<Option<Q::Node>> {
    let found = document.find_first(selector)?;
    let matched = if found.is_some() { "an element" } else { "nothing" };
    log::trace!("'{}' matched {}", selector, matched);
    Ok(found)
}

/// Find all elements matching a CSS selector.
pub fn get_all_elements<Q: Query>(document: &Q, selector: &str) -> Result<Vec<Q::Node>> {
    let found = document.find_all(selector)?;
    log::trace!("'{}' matched {} element(s)", selector, found.len());
    Ok(found)
}
