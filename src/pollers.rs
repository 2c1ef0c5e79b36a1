//! # Poller Cadences
//!
//! A process has a small, fixed set of reporting cadences. Each cadence is
//! identified by its index in the [`Pollers`] table and every windowed metric
//! keeps one pair of slots per entry. The table is fixed once the
//! [`crate::MetricContext`] is built.
//!
//! ## Configuration
//!
//! The table can be supplied programmatically, deserialized from a host
//! application's config file, or read from the `STEP_METRICS_POLLERS`
//! environment variable as a comma separated list of milliseconds:
//!
//! ```rust
//! use step_metrics::Pollers;
//!
//! let pollers: Pollers = "60000, 10000".parse().unwrap();
//! assert_eq!(pollers.len(), 2);
//! assert_eq!(pollers.interval(1), 10_000);
//! ```

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Environment variable holding a comma separated list of intervals
pub const POLLERS_ENV: &str = "STEP_METRICS_POLLERS";

/// Default cadences: one minute and ten seconds
pub const DEFAULT_POLLING_INTERVALS_MS: [u64; 2] = [60_000, 10_000];

/// Ordered, validated table of polling intervals in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct Pollers {
    intervals: Vec<u64>,
}

impl Pollers {
    /// Build a cadence table, rejecting empty tables, zero intervals and duplicates
    pub fn new(intervals: Vec<u64>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(MetricsError::EmptyPollers);
        }
        for (index, &interval_ms) in intervals.iter().enumerate() {
            if interval_ms == 0 {
                return Err(MetricsError::InvalidPollingInterval { index });
            }
            if intervals[..index].contains(&interval_ms) {
                return Err(MetricsError::DuplicatePollingInterval { interval_ms });
            }
        }
        Ok(Self { intervals })
    }

    /// Read the table from [`POLLERS_ENV`]; unset means the default table
    pub fn try_from_env() -> Result<Self> {
        match std::env::var(POLLERS_ENV) {
            Ok(spec) => spec.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Like [`Pollers::try_from_env`] but falls back to the default table
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!("Ignoring {}: {}; using default pollers", POLLERS_ENV, e);
            Self::default()
        })
    }

    /// Number of cadences
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Always false for a validated table
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Interval of the given cadence in milliseconds
    ///
    /// # Panics
    ///
    /// Panics if `poller_index` is not a valid cadence index.
    pub fn interval(&self, poller_index: usize) -> u64 {
        match self.intervals.get(poller_index) {
            Some(&interval) => interval,
            None => panic!(
                "poller index {} out of range for {} configured pollers",
                poller_index,
                self.intervals.len()
            ),
        }
    }

    pub fn intervals(&self) -> &[u64] {
        &self.intervals
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.intervals.iter().copied().enumerate()
    }
}

impl Default for Pollers {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_POLLING_INTERVALS_MS.to_vec(),
        }
    }
}

impl FromStr for Pollers {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| MetricsError::InvalidPollerSpec {
            spec: s.to_string(),
            reason,
        };

        let intervals = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|e| invalid(format!("'{}' is not a number ({})", part, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(intervals)
    }
}

impl TryFrom<Vec<u64>> for Pollers {
    type Error = MetricsError;

    fn try_from(intervals: Vec<u64>) -> Result<Self> {
        Self::new(intervals)
    }
}

impl From<Pollers> for Vec<u64> {
    fn from(pollers: Pollers) -> Self {
        pollers.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pollers() {
        let pollers = Pollers::default();
        assert_eq!(pollers.intervals(), &[60_000, 10_000]);
        assert!(!pollers.is_empty());
    }

    #[test]
    fn test_parse_pollers() {
        let pollers: Pollers = "1000,250".parse().unwrap();
        assert_eq!(pollers.intervals(), &[1000, 250]);

        let padded: Pollers = " 5000 , 100 ,".parse().unwrap();
        assert_eq!(padded.intervals(), &[5000, 100]);
    }

    #[test]
    fn test_parse_pollers_rejects_garbage() {
        assert!(matches!(
            "10s".parse::<Pollers>(),
            Err(MetricsError::InvalidPollerSpec { .. })
        ));
        assert_eq!("".parse::<Pollers>(), Err(MetricsError::EmptyPollers));
        assert_eq!(
            "1000,0".parse::<Pollers>(),
            Err(MetricsError::InvalidPollingInterval { index: 1 })
        );
        assert_eq!(
            "1000,1000".parse::<Pollers>(),
            Err(MetricsError::DuplicatePollingInterval { interval_ms: 1000 })
        );
    }

    #[test]
    fn test_pollers_serde() {
        let pollers: Pollers = serde_json::from_str("[30000, 5000]").unwrap();
        assert_eq!(pollers.interval(0), 30_000);
        assert_eq!(serde_json::to_string(&pollers).unwrap(), "[30000,5000]");

        assert!(serde_json::from_str::<Pollers>("[]").is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_interval_out_of_range() {
        Pollers::default().interval(2);
    }
}
