//! # Metric Context
//!
//! Windowed metrics need three shared collaborators: a clock, the poller cadence
//! table and the drift diagnostics counters. They are bundled in a
//! [`MetricContext`] that is built once at process start and handed to every
//! metric constructor, so there is no hidden global state.

use crate::clock::{Clock, WallClock};
use crate::counter::BasicCounter;
use crate::monitor::{Monitor, MonitorConfig};
use crate::pollers::Pollers;
use std::sync::Arc;

/// Counters describing how well pollers keep to their cadence
///
/// These are ordinary monitors so an exporter can publish them alongside
/// application metrics.
#[derive(Debug)]
pub struct PollDiagnostics {
    repolled: Arc<BasicCounter>,
    missed: Arc<BasicCounter>,
    polled: Arc<BasicCounter>,
}

impl PollDiagnostics {
    pub fn new() -> Self {
        Self {
            repolled: Arc::new(BasicCounter::new(MonitorConfig::new(
                "monitor.repolledIntervals",
            ))),
            missed: Arc::new(BasicCounter::new(MonitorConfig::new(
                "monitor.missedIntervals",
            ))),
            polled: Arc::new(BasicCounter::new(MonitorConfig::new(
                "monitor.polledIntervals",
            ))),
        }
    }

    /// Polls that landed in a step that had already been polled
    pub fn repolled_intervals(&self) -> i64 {
        self.repolled.get()
    }

    /// Whole steps skipped between consecutive polls
    pub fn missed_intervals(&self) -> i64 {
        self.missed.get()
    }

    /// Polls that returned the previous step on cadence
    pub fn polled_intervals(&self) -> i64 {
        self.polled.get()
    }

    pub(crate) fn record_repolled(&self) {
        self.repolled.increment();
    }

    pub(crate) fn record_missed(&self, missed: i64) {
        self.missed.increment_by(missed);
    }

    pub(crate) fn record_polled(&self) {
        self.polled.increment();
    }

    /// The diagnostic counters as exportable monitors
    pub fn monitors(&self) -> Vec<Arc<dyn Monitor>> {
        vec![
            self.repolled.clone() as Arc<dyn Monitor>,
            self.missed.clone() as Arc<dyn Monitor>,
            self.polled.clone() as Arc<dyn Monitor>,
        ]
    }
}

impl Default for PollDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared clock, cadence table and diagnostics for a set of metrics
#[derive(Debug, Clone)]
pub struct MetricContext {
    clock: Arc<dyn Clock>,
    pollers: Arc<Pollers>,
    diagnostics: Arc<PollDiagnostics>,
}

impl MetricContext {
    pub fn new(clock: Arc<dyn Clock>, pollers: Pollers) -> Self {
        Self {
            clock,
            pollers: Arc::new(pollers),
            diagnostics: Arc::new(PollDiagnostics::new()),
        }
    }

    /// Wall clock with the cadence table taken from the environment
    pub fn from_env() -> Self {
        Self::new(Arc::new(WallClock), Pollers::from_env())
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn pollers(&self) -> &Pollers {
        &self.pollers
    }

    pub fn diagnostics(&self) -> &PollDiagnostics {
        &self.diagnostics
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl Default for MetricContext {
    fn default() -> Self {
        Self::new(Arc::new(WallClock), Pollers::default())
    }
}
