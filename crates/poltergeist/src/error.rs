//! Errors
//!
//! Every failure is terminal: nothing in this crate retries on its own.

/// An error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A polled condition never held within its time budget.
    #[error("Timeout >>> Element not found")]
    Timeout {
        /// Milliseconds between the start of the wait and the final attempt.
        elapsed: f64,
        /// How many times the predicate was evaluated.
        attempts: u32,
    },

    /// `click_it` was handed no element.
    #[error("Impossible to click. HTML Element not found")]
    ElementMissing,

    #[error("'{0}' is not a valid selector")]
    Selector(String),

    /// The host refused to register an observer or to dispatch an event.
    #[error("could not dispatch event: {0}")]
    Dispatch(anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
