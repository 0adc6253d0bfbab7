//! Configuration of the polling and clicking primitives.
//!
//! All options deserialize with defaults for missing fields, so a partial
//! JSON document is a valid configuration:
//!
//! ```
//! let config = poltergeist::Config::from_json_str(r#"{"poll": {"timeout_ms": 3000}}"#).unwrap();
//! assert_eq!(config.poll.timeout_ms, 3000);
//! assert_eq!(config.poll.interval_ms, 500);
//! assert_eq!(config.click.click_delay_ms, 200);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Timing of a [`wait`](crate::poll::wait).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOptions {
    /// How long to keep polling before giving up.
    pub timeout_ms: u64,
    /// Time between two evaluations of the predicate.
    pub interval_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            timeout_ms: 10_000,
            interval_ms: 500,
        }
    }
}

impl PollOptions {
    /// Intervals are never shorter than this.
    pub const MIN_INTERVAL_MS: u64 = 1;

    pub fn new(timeout_ms: u64, interval_ms: u64) -> Self {
        PollOptions {
            timeout_ms,
            interval_ms,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// The interval actually used between evaluations.
    pub fn poll_interval_ms(&self) -> u64 {
        self.interval_ms.max(Self::MIN_INTERVAL_MS)
    }
}

/// Timing of a [`click_it`](crate::click::click_it).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickOptions {
    /// Delay between the pointer move and the click.
    pub click_delay_ms: u64,
}

impl Default for ClickOptions {
    fn default() -> Self {
        ClickOptions { click_delay_ms: 200 }
    }
}

impl ClickOptions {
    pub fn with_click_delay_ms(mut self, click_delay_ms: u64) -> Self {
        self.click_delay_ms = click_delay_ms;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll: PollOptions,
    pub click: ClickOptions,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config = serde_json::from_str(json)?;
        log::debug!("loaded configuration {:?}", config);
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.poll, PollOptions::new(10_000, 500));
        assert_eq!(config.click.click_delay_ms, 200);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn survives_a_trip_through_json() {
        let config = Config {
            poll: PollOptions::new(300, 100),
            click: ClickOptions::default().with_click_delay_ms(50),
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_bad_json() {
        let err = Config::from_json_str(r#"{"poll": {"timeout_ms": "soon"}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let options = PollOptions::default().with_interval_ms(0);
        assert_eq!(options.interval_ms, 0);
        assert_eq!(options.poll_interval_ms(), PollOptions::MIN_INTERVAL_MS);
    }
}
