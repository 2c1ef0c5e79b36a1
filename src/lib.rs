//! # Step Metrics Library
//!
//! The measurement core of a client-side metrics library. It records live
//! operational values (durations, counts, extrema) from many producer threads
//! while independent pollers, each on its own reporting cadence, read them back
//! without locks and without losing or double-counting data across interval
//! boundaries.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `step`: [`StepWindow`], the two-slot per-cadence accumulator everything
//!   windowed is built on
//! - `counter` / `gauge`: counters and min/max gauges built from plain atomics or
//!   from a `StepWindow`
//! - `recorder`: [`BucketedDurationRecorder`], a histogram-style timer composed of
//!   those primitives
//! - `buckets`: validated bucket boundaries and their labels
//! - `pollers` / `clock` / `context`: the cadence table, the injectable time
//!   source and the drift diagnostics shared by every metric
//! - `soak`: a stress harness driving a recorder from producer threads while
//!   pollers read it, used by the `step-metrics` binary
//!
//! ## Usage Example
//!
//! ```rust
//! use step_metrics::{BucketConfig, BucketedDurationRecorder, MetricContext, MonitorConfig};
//!
//! let context = MetricContext::default();
//! let timer = BucketedDurationRecorder::new(
//!     MonitorConfig::new("db.query"),
//!     BucketConfig::new(vec![10, 50, 100]).unwrap(),
//!     &context,
//! );
//!
//! timer.record(3);
//! timer.record(7);
//! timer.record(20);
//!
//! assert_eq!(timer.total_time(), 30);
//! assert_eq!(timer.count(0), 3);
//! assert_eq!(timer.value(0), 10);
//! ```
//!
//! ## Concurrency Characteristics
//!
//! - **No locks**: every record and poll is a handful of atomic add,
//!   compare-and-set and swap operations
//! - **No allocation after construction**: slots are reset in place
//! - **Independent cadences**: each poller's step boundaries are computed from
//!   the clock alone, never from another cadence's state

/// Command-line arguments of the soak harness
pub mod cli;

/// Injectable time sources
pub mod clock;

/// Validated bucket boundaries and labels
pub mod buckets;

/// Shared clock, cadence table and drift diagnostics
pub mod context;

/// Cumulative and windowed counters
pub mod counter;

/// Immutable poll results
pub mod datapoint;

/// Configuration errors
pub mod error;

/// Windowed min and max gauges
pub mod gauge;

/// Colorized log output for the binary
pub mod logging;

/// Monitor identity, the polling contract and time units
pub mod monitor;

/// Poller cadence table
pub mod pollers;

/// Bucketed duration recorder
pub mod recorder;

/// Concurrent producer/poller stress harness
///
/// Drives a [`BucketedDurationRecorder`] from producer threads while one task
/// per cadence polls it, and cross-checks the recorded counts against an HDR
/// histogram kept by the producers.
pub mod soak;

/// Lock-free two-slot step accumulator
pub mod step;

pub use buckets::BucketConfig;
pub use clock::{Clock, ManualClock, WallClock};
pub use context::{MetricContext, PollDiagnostics};
pub use counter::{BasicCounter, StepCounter};
pub use datapoint::Datapoint;
pub use error::MetricsError;
pub use gauge::{MaxGauge, MinGauge};
pub use monitor::{Monitor, MonitorConfig, TimeUnit};
pub use pollers::Pollers;
pub use recorder::BucketedDurationRecorder;
pub use step::StepWindow;

/// The current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values for the soak harness
pub mod defaults {
    use std::time::Duration;

    /// Default bucket boundaries in milliseconds
    pub const BUCKETS: [i64; 6] = [1, 5, 10, 50, 100, 500];

    /// Default cadences for the soak harness
    ///
    /// Much shorter than the library defaults so a run of a few seconds sees
    /// many completed steps.
    pub const POLLERS: &str = "1000,250";

    /// Largest simulated latency a producer records, in the recorder's unit
    pub const MAX_LATENCY: i64 = 250;

    /// Pause between two records of one producer
    pub const PRODUCER_PAUSE: Duration = Duration::from_micros(100);
}
