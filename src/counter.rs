//! # Counters
//!
//! - [`BasicCounter`]: a cumulative atomic total; every cadence sees the same
//!   live value.
//! - [`StepCounter`]: a windowed count backed by a [`StepWindow`]; each cadence
//!   sees the amount added during its last completed step.

use crate::context::MetricContext;
use crate::datapoint::Datapoint;
use crate::monitor::{Monitor, MonitorConfig};
use crate::step::StepWindow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic cumulative counter
#[derive(Debug)]
pub struct BasicCounter {
    config: MonitorConfig,
    count: AtomicI64,
}

impl BasicCounter {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            count: AtomicI64::new(0),
        }
    }

    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Saturates at `i64::MAX`/`i64::MIN` instead of wrapping
    pub fn increment_by(&self, amount: i64) {
        // The closure never returns None, so the update cannot fail.
        let _ = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_add(amount))
            });
    }

    pub fn get(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }
}

impl Monitor for BasicCounter {
    fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn value(&self, _poller_index: usize) -> Option<i64> {
        Some(self.get())
    }
}

impl PartialEq for BasicCounter {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.get() == other.get()
    }
}

impl Eq for BasicCounter {}

impl Hash for BasicCounter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.get().hash(state);
    }
}

/// Counter reporting the amount added per poller step
#[derive(Debug)]
pub struct StepCounter {
    config: MonitorConfig,
    window: StepWindow,
}

impl StepCounter {
    pub fn new(config: MonitorConfig, context: MetricContext) -> Self {
        Self {
            config,
            window: StepWindow::new(0, context),
        }
    }

    pub fn increment(&self) {
        self.window.accumulate(1);
    }

    pub fn increment_by(&self, amount: i64) {
        self.window.accumulate(amount);
    }

    /// Count for the last completed step of a cadence, resetting it
    pub fn poll(&self, poller_index: usize) -> Datapoint {
        self.window.poll(poller_index)
    }
}

impl Monitor for StepCounter {
    fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn value(&self, poller_index: usize) -> Option<i64> {
        self.poll(poller_index).value()
    }
}

impl PartialEq for StepCounter {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.window == other.window
    }
}

impl Eq for StepCounter {}

impl Hash for StepCounter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.window.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pollers::Pollers;
    use std::sync::Arc;

    #[test]
    fn test_basic_counter_is_cumulative() {
        let counter = BasicCounter::new(MonitorConfig::new("requests"));
        counter.increment();
        counter.increment_by(4);

        assert_eq!(counter.get(), 5);
        assert_eq!(counter.value(0), Some(5));
        assert_eq!(counter.value(1), Some(5));
        assert_eq!(counter.value(0), Some(5));
    }

    #[test]
    fn test_basic_counter_equality() {
        let a = BasicCounter::new(MonitorConfig::new("requests"));
        let b = BasicCounter::new(MonitorConfig::new("requests"));
        assert_eq!(a, b);

        a.increment();
        assert_ne!(a, b);
        b.increment();
        assert_eq!(a, b);

        let c = BasicCounter::new(MonitorConfig::new("errors"));
        c.increment();
        assert_ne!(a, c);
    }

    #[test]
    fn test_basic_counter_saturates() {
        let counter = BasicCounter::new(MonitorConfig::new("total"));
        counter.increment_by(i64::MAX);
        counter.increment_by(2);
        assert_eq!(counter.get(), i64::MAX);

        let counter = BasicCounter::new(MonitorConfig::new("total"));
        counter.increment_by(i64::MIN);
        counter.increment_by(-1);
        assert_eq!(counter.get(), i64::MIN);
    }

    #[test]
    fn test_step_counter_per_interval() {
        let clock = Arc::new(ManualClock::new(600_000));
        let context = MetricContext::new(clock.clone(), Pollers::new(vec![1_000]).unwrap());
        let counter = StepCounter::new(MonitorConfig::new("requests"), context);

        counter.increment();
        counter.increment_by(2);
        clock.advance(1_000);
        assert_eq!(counter.value(0), Some(3));

        counter.increment();
        clock.advance(1_000);
        assert_eq!(counter.value(0), Some(1));

        clock.advance(5_000);
        assert_eq!(counter.value(0), None);
    }
}
