//! # Datapoints
//!
//! The result of polling one cadence: the start of the step that was read and
//! its value, or [`Datapoint::UNKNOWN`] when drift made the reading unusable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value observed for one step of a poller cadence
///
/// `timestamp` is the start of the step in milliseconds. [`Datapoint::UNKNOWN`]
/// is returned when a poll cannot produce a trustworthy reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Datapoint {
    timestamp: u64,
    value: Option<i64>,
}

impl Datapoint {
    /// No data for the interval; not the same thing as a zero reading
    pub const UNKNOWN: Datapoint = Datapoint {
        timestamp: 0,
        value: None,
    };

    pub fn new(timestamp: u64, value: i64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The observed value, `None` for [`Datapoint::UNKNOWN`]
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for Datapoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}@{}", value, self.timestamp),
            None => write!(f, "unknown"),
        }
    }
}
