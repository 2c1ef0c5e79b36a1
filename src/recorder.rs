//! # Bucketed Duration Recorder
//!
//! [`BucketedDurationRecorder`] is a histogram-style timer assembled from simple
//! atomic sub-metrics:
//!
//! - a cumulative total of recorded time
//! - windowed min and max gauges
//! - one cumulative counter per bucket boundary
//! - one overflow counter for values above the last boundary
//!
//! Each recorded duration lands in exactly one bucket: the first whose boundary
//! is greater than or equal to it. The count is never stored separately; it is
//! the sum of the bucket and overflow counters.
//!
//! ## Identity
//!
//! Every sub-metric shares the recorder's name and tags plus `unit=<UNIT>`, and
//! is told apart by a `statistic` tag (`totalTime`, `min`, `max`, `count`).
//! Bucket and overflow counters additionally carry a `bucket` tag:
//!
//! ```text
//! requests{statistic=count,bucket=bucket=010ms,unit=MILLISECONDS}
//! requests{statistic=count,bucket=bucket=overflow,unit=MILLISECONDS}
//! ```

use crate::buckets::{BucketConfig, OVERFLOW_LABEL};
use crate::context::MetricContext;
use crate::counter::BasicCounter;
use crate::gauge::{MaxGauge, MinGauge};
use crate::monitor::{Monitor, MonitorConfig, TimeUnit};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const STATISTIC: &str = "statistic";
const BUCKET: &str = "bucket";
const UNIT: &str = "unit";

const STAT_TOTAL: &str = "totalTime";
const STAT_COUNT: &str = "count";
const STAT_MIN: &str = "min";
const STAT_MAX: &str = "max";

/// Histogram of durations over caller supplied bucket boundaries
pub struct BucketedDurationRecorder {
    config: MonitorConfig,
    bucket_config: BucketConfig,
    time_unit: TimeUnit,

    total_time: Arc<BasicCounter>,
    bucket_count: Vec<Arc<BasicCounter>>,
    overflow_count: Arc<BasicCounter>,
    min: Arc<MinGauge>,
    max: Arc<MaxGauge>,

    monitors: Vec<Arc<dyn Monitor>>,
}

impl BucketedDurationRecorder {
    /// Create a recorder measuring in milliseconds
    pub fn new(config: MonitorConfig, bucket_config: BucketConfig, context: &MetricContext) -> Self {
        Self::with_unit(config, bucket_config, TimeUnit::Milliseconds, context)
    }

    /// Create a recorder whose durations are expressed in `unit`
    pub fn with_unit(
        config: MonitorConfig,
        bucket_config: BucketConfig,
        unit: TimeUnit,
        context: &MetricContext,
    ) -> Self {
        let unit_config = config.with_additional_tag(UNIT, unit.name());
        let count_config = unit_config.with_additional_tag(STATISTIC, STAT_COUNT);

        let total_time = Arc::new(BasicCounter::new(
            unit_config.with_additional_tag(STATISTIC, STAT_TOTAL),
        ));
        let overflow_count = Arc::new(BasicCounter::new(
            count_config.with_additional_tag(BUCKET, OVERFLOW_LABEL),
        ));
        let min = Arc::new(MinGauge::new(
            unit_config.with_additional_tag(STATISTIC, STAT_MIN),
            context.clone(),
        ));
        let max = Arc::new(MaxGauge::new(
            unit_config.with_additional_tag(STATISTIC, STAT_MAX),
            context.clone(),
        ));

        let bucket_count: Vec<Arc<BasicCounter>> = (0..bucket_config.len())
            .map(|i| {
                Arc::new(BasicCounter::new(
                    count_config.with_additional_tag(BUCKET, bucket_config.label(i)),
                ))
            })
            .collect();

        let mut monitors: Vec<Arc<dyn Monitor>> = Vec::with_capacity(bucket_count.len() + 4);
        monitors.push(total_time.clone());
        monitors.push(min.clone());
        monitors.push(max.clone());
        monitors.extend(bucket_count.iter().map(|c| c.clone() as Arc<dyn Monitor>));
        monitors.push(overflow_count.clone());

        Self {
            config,
            bucket_config,
            time_unit: unit,
            total_time,
            bucket_count,
            overflow_count,
            min,
            max,
            monitors,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn bucket_config(&self) -> &BucketConfig {
        &self.bucket_config
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Record a duration expressed in the recorder's unit
    ///
    /// Negative durations are clamped to 0.
    pub fn record(&self, duration: i64) {
        let duration = if duration < 0 {
            debug!(
                monitor = %self.config,
                duration,
                "Clamping negative duration to zero"
            );
            0
        } else {
            duration
        };

        self.total_time.increment_by(duration);
        self.min.update(duration);
        self.max.update(duration);

        match self.bucket_config.bucket_index(duration) {
            Some(index) => self.bucket_count[index].increment(),
            None => self.overflow_count.increment(),
        }
    }

    /// Record a duration expressed in `unit`, truncating into the recorder's unit
    pub fn record_with_unit(&self, duration: i64, unit: TimeUnit) {
        self.record(self.time_unit.convert(duration, unit));
    }

    /// Record an elapsed [`Duration`], truncating into the recorder's unit
    pub fn record_elapsed(&self, elapsed: Duration) {
        self.record(self.time_unit.from_duration(elapsed));
    }

    /// Average recorded duration, or 0 when nothing was recorded
    pub fn value(&self, poller_index: usize) -> i64 {
        match self.count(poller_index) {
            0 => 0,
            count => self.total_time() / count,
        }
    }

    /// Total of all recorded durations, saturating at `i64::MAX`
    pub fn total_time(&self) -> i64 {
        self.total_time.get()
    }

    /// Number of recorded durations across all buckets and the overflow
    pub fn count(&self, poller_index: usize) -> i64 {
        let buckets: i64 = self
            .bucket_count
            .iter()
            .filter_map(|c| c.value(poller_index))
            .sum();
        buckets + self.overflow_count.value(poller_index).unwrap_or(0)
    }

    /// Smallest duration of the last completed step; `None` if polls were missed
    pub fn min(&self, poller_index: usize) -> Option<i64> {
        self.min.value(poller_index)
    }

    /// Largest duration of the last completed step; `None` if polls were missed
    pub fn max(&self, poller_index: usize) -> Option<i64> {
        self.max.value(poller_index)
    }

    /// Count of the bucket at `index`
    pub fn bucket_count(&self, index: usize) -> i64 {
        self.bucket_count[index].get()
    }

    pub fn overflow_count(&self) -> i64 {
        self.overflow_count.get()
    }

    /// Sub-metrics in export order: total time, min, max, buckets, overflow
    pub fn monitors(&self) -> &[Arc<dyn Monitor>] {
        &self.monitors
    }
}

impl Monitor for BucketedDurationRecorder {
    fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn value(&self, poller_index: usize) -> Option<i64> {
        Some(BucketedDurationRecorder::value(self, poller_index))
    }
}

impl PartialEq for BucketedDurationRecorder {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && self.bucket_config == other.bucket_config
            && self.time_unit == other.time_unit
            && self.total_time == other.total_time
            && self.min == other.min
            && self.max == other.max
            && self.overflow_count == other.overflow_count
            && self.bucket_count == other.bucket_count
    }
}

impl Eq for BucketedDurationRecorder {}

impl Hash for BucketedDurationRecorder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.bucket_config.hash(state);
        self.time_unit.hash(state);
        self.total_time.hash(state);
        self.min.hash(state);
        self.max.hash(state);
        self.overflow_count.hash(state);
        self.bucket_count.hash(state);
    }
}

impl fmt::Debug for BucketedDurationRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketedDurationRecorder")
            .field("config", &self.config)
            .field("bucket_config", &self.bucket_config)
            .field("time_unit", &self.time_unit)
            .field("total_time", &self.total_time)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("bucket_count", &self.bucket_count)
            .field("overflow_count", &self.overflow_count)
            .finish()
    }
}
