//! # Error Types
//!
//! Construction-time failures for metric configuration. Nothing on the record
//! or poll paths returns an error; drift conditions (missed or repeated polls)
//! are reported through [`crate::context::PollDiagnostics`] instead.

use thiserror::Error;

/// Configuration errors raised while building metrics or the cadence table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// A bucket configuration was built without any boundaries
    #[error("bucket boundaries cannot be empty")]
    EmptyBuckets,

    /// A bucket boundary was zero or negative
    #[error("bucket boundary at index {index} must be positive, got {value}")]
    NonPositiveBucket { index: usize, value: i64 },

    /// Bucket boundaries were not strictly ascending
    #[error("bucket boundaries must be strictly ascending: {previous} is followed by {value}")]
    UnorderedBuckets { previous: i64, value: i64 },

    /// The polling interval table was empty
    #[error("at least one polling interval is required")]
    EmptyPollers,

    /// A polling interval of zero milliseconds was configured
    #[error("polling interval at index {index} must be greater than zero")]
    InvalidPollingInterval { index: usize },

    /// The same polling interval was configured twice
    #[error("polling interval {interval_ms}ms is configured more than once")]
    DuplicatePollingInterval { interval_ms: u64 },

    /// A textual poller specification could not be parsed
    #[error("invalid poller specification '{spec}': {reason}")]
    InvalidPollerSpec { spec: String, reason: String },
}

/// Result alias used by fallible constructors in this crate
pub type Result<T> = std::result::Result<T, MetricsError>;
