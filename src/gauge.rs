//! # Extremum Gauges
//!
//! [`MinGauge`] and [`MaxGauge`] track the smallest and largest value seen during
//! each poller step. They sit on a [`StepWindow`] whose baseline is the identity
//! of the operation (`i64::MAX` for min, `i64::MIN` for max) and update the
//! current slot with `fetch_min`/`fetch_max`, so concurrent updates never lose a
//! value. A step with no updates reports 0 rather than the baseline.

use crate::context::MetricContext;
use crate::datapoint::Datapoint;
use crate::monitor::{Monitor, MonitorConfig};
use crate::step::StepWindow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::Ordering;

macro_rules! extremum_gauge {
    ($(#[$doc:meta])* $name:ident, $baseline:expr, $op:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            config: MonitorConfig,
            window: StepWindow,
        }

        impl $name {
            pub fn new(config: MonitorConfig, context: MetricContext) -> Self {
                Self {
                    config,
                    window: StepWindow::new($baseline, context),
                }
            }

            /// Fold `value` into the current step of every cadence
            pub fn update(&self, value: i64) {
                for poller_index in 0..self.window.poller_count() {
                    self.window
                        .current_slot(poller_index)
                        .$op(value, Ordering::AcqRel);
                }
            }

            /// Extremum of the last completed step, resetting it
            ///
            /// A step without updates yields a datapoint with value 0.
            pub fn poll(&self, poller_index: usize) -> Datapoint {
                let dp = self.window.poll(poller_index);
                match dp.value() {
                    Some(v) if v == $baseline => Datapoint::new(dp.timestamp(), 0),
                    _ => dp,
                }
            }
        }

        impl Monitor for $name {
            fn config(&self) -> &MonitorConfig {
                &self.config
            }

            fn value(&self, poller_index: usize) -> Option<i64> {
                self.poll(poller_index).value()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.config == other.config && self.window == other.window
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.config.hash(state);
                self.window.hash(state);
            }
        }
    };
}

extremum_gauge!(
    /// Smallest value recorded per poller step
    MinGauge,
    i64::MAX,
    fetch_min
);

extremum_gauge!(
    /// Largest value recorded per poller step
    MaxGauge,
    i64::MIN,
    fetch_max
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pollers::Pollers;
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, MetricContext) {
        let clock = Arc::new(ManualClock::new(600_000));
        let context = MetricContext::new(clock.clone(), Pollers::new(vec![1_000, 250]).unwrap());
        (clock, context)
    }

    #[test]
    fn test_min_gauge() {
        let (clock, context) = setup();
        let gauge = MinGauge::new(MonitorConfig::new("latency"), context);

        gauge.update(40);
        gauge.update(-2);
        gauge.update(17);

        clock.advance(1_000);
        assert_eq!(gauge.value(0), Some(-2));
        assert_eq!(gauge.value(1), Some(0));
    }

    #[test]
    fn test_max_gauge() {
        let (clock, context) = setup();
        let gauge = MaxGauge::new(MonitorConfig::new("latency"), context);

        gauge.update(40);
        gauge.update(-2);
        gauge.update(17);

        clock.advance(250);
        assert_eq!(gauge.value(1), Some(40));

        gauge.update(5);
        clock.advance(250);
        assert_eq!(gauge.value(1), Some(5));
    }

    #[test]
    fn test_empty_step_reports_zero() {
        let (clock, context) = setup();
        let min = MinGauge::new(MonitorConfig::new("latency"), context.clone());
        let max = MaxGauge::new(MonitorConfig::new("latency"), context);

        clock.advance(1_000);
        assert_eq!(min.poll(0).value(), Some(0));
        assert_eq!(max.poll(0).value(), Some(0));
    }

    #[test]
    fn test_concurrent_updates_keep_extremes() {
        let (clock, context) = setup();
        let min = MinGauge::new(MonitorConfig::new("latency"), context.clone());
        let max = MaxGauge::new(MonitorConfig::new("latency"), context);

        std::thread::scope(|s| {
            for t in 0..4i64 {
                let (min, max) = (&min, &max);
                s.spawn(move || {
                    for i in 0..1_000i64 {
                        let v = t * 1_000 + i + 1;
                        min.update(v);
                        max.update(v);
                    }
                });
            }
        });

        clock.advance(1_000);
        assert_eq!(min.value(0), Some(1));
        assert_eq!(max.value(0), Some(4_000));
    }
}
