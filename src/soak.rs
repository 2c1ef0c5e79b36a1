//! # Soak Harness
//!
//! Runs a [`BucketedDurationRecorder`] under sustained concurrent load:
//!
//! 1. **Producers**: `producers` threads record random durations in
//!    `0..=max_latency` until the run ends, each also keeping an HDR histogram of
//!    exactly what it recorded
//! 2. **Pollers**: one task per configured cadence wakes on its interval and
//!    polls every sub-metric of the recorder into an [`IntervalReport`]
//! 3. **Reconciliation**: after the producers stop, the recorder's count and
//!    total are compared with what the producers tallied
//!
//! The result is a [`SoakReport`] that can be written as JSON.

use crate::buckets::BucketConfig;
use crate::clock::WallClock;
use crate::context::MetricContext;
use crate::monitor::{MonitorConfig, TimeUnit};
use crate::pollers::Pollers;
use crate::recorder::BucketedDurationRecorder;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Parameters of one soak run
#[derive(Debug, Clone)]
pub struct SoakConfig {
    pub metric_name: String,
    pub producers: usize,
    pub duration: Duration,
    pub buckets: BucketConfig,
    pub pollers: Pollers,
    pub max_latency: i64,
    pub producer_pause: Duration,
    pub output: Option<PathBuf>,
}

impl SoakConfig {
    /// Build a configuration from parsed command line arguments
    pub fn from_args(args: &crate::cli::Args) -> Result<Self> {
        if args.producers == 0 {
            anyhow::bail!("At least one producer is required");
        }
        if args.max_latency < 0 {
            anyhow::bail!("Maximum latency cannot be negative");
        }

        let buckets = BucketConfig::builder()
            .with_buckets(args.buckets.clone())
            .with_time_unit(args.unit)
            .build()
            .context("Invalid bucket boundaries")?;

        Ok(Self {
            metric_name: args.name.clone(),
            producers: args.producers,
            duration: args.duration,
            buckets,
            pollers: args.pollers.clone(),
            max_latency: args.max_latency,
            producer_pause: Duration::from_micros(args.pause_us),
            output: args.output.clone(),
        })
    }
}

/// One sub-metric value read by a poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSample {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    /// `None` when the poll reported no data for the interval
    pub value: Option<i64>,
}

/// Everything one poller tick observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalReport {
    pub poller_index: usize,
    pub interval_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub average: i64,
    pub count: i64,
    pub samples: Vec<MonitorSample>,
}

/// Drift diagnostics at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub polled_intervals: i64,
    pub repolled_intervals: i64,
    pub missed_intervals: i64,
}

/// Final result of a soak run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoakReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub producers: usize,
    pub time_unit: TimeUnit,
    pub buckets: Vec<i64>,
    pub poller_intervals_ms: Vec<u64>,
    pub total_count: i64,
    pub total_time: i64,
    pub average: i64,
    pub bucket_counts: Vec<i64>,
    pub overflow_count: i64,
    pub reference_count: u64,
    pub reference_total: u64,
    pub reference_p50: u64,
    pub reference_p99: u64,
    pub reference_max: u64,
    pub diagnostics: DiagnosticsSummary,
    pub intervals: Vec<IntervalReport>,
}

impl SoakReport {
    /// Whether the recorder agrees with what the producers recorded
    pub fn is_consistent(&self) -> bool {
        u64::try_from(self.total_count).ok() == Some(self.reference_count)
            && u64::try_from(self.total_time).ok() == Some(self.reference_total)
    }

    /// Write the report as pretty printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        debug!("Wrote soak report to {:?}", path);
        Ok(())
    }
}

/// Take one [`IntervalReport`] by polling every sub-metric of the recorder
pub fn sample_interval(
    recorder: &BucketedDurationRecorder,
    context: &MetricContext,
    poller_index: usize,
) -> IntervalReport {
    let samples = recorder
        .monitors()
        .iter()
        .map(|monitor| MonitorSample {
            name: monitor.config().name().to_string(),
            tags: monitor.config().tags().clone(),
            value: monitor.value(poller_index),
        })
        .collect();

    IntervalReport {
        poller_index,
        interval_ms: context.pollers().interval(poller_index),
        timestamp: Utc::now(),
        average: recorder.value(poller_index),
        count: recorder.count(poller_index),
        samples,
    }
}

/// Run the soak harness to completion
pub async fn run_soak(config: SoakConfig) -> Result<SoakReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let context = MetricContext::new(Arc::new(WallClock), config.pollers.clone());
    let recorder = Arc::new(BucketedDurationRecorder::with_unit(
        MonitorConfig::new(config.metric_name.clone())
            .with_additional_tag("run", run_id.to_string()),
        config.buckets.clone(),
        config.buckets.time_unit(),
        &context,
    ));

    info!(
        "Starting soak run {} with {} producers for {:?}",
        run_id, config.producers, config.duration
    );

    let stop = Arc::new(AtomicBool::new(false));
    let reports = Arc::new(Mutex::new(Vec::new()));

    let mut poller_tasks = Vec::with_capacity(context.pollers().len());
    for (poller_index, interval_ms) in context.pollers().iter() {
        let recorder = Arc::clone(&recorder);
        let context = context.clone();
        let stop = Arc::clone(&stop);
        let reports = Arc::clone(&reports);
        poller_tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            // The first tick completes immediately.
            ticker.tick().await;
            while !stop.load(Ordering::Acquire) {
                ticker.tick().await;
                let report = sample_interval(&recorder, &context, poller_index);
                debug!(
                    poller_index,
                    count = report.count,
                    average = report.average,
                    "Polled interval"
                );
                reports.lock().push(report);
            }
        }));
    }

    let producers = {
        let recorder = Arc::clone(&recorder);
        let stop = Arc::clone(&stop);
        let config = config.clone();
        tokio::task::spawn_blocking(move || run_producers(&recorder, &stop, &config))
    };

    tokio::time::sleep(config.duration).await;
    stop.store(true, Ordering::Release);

    let reference = producers
        .await
        .context("Producer pool panicked")??;
    for task in poller_tasks {
        task.await.context("Poller task panicked")?;
    }

    let diagnostics = context.diagnostics();
    let mut intervals = std::mem::take(&mut *reports.lock());
    intervals.sort_by_key(|r| (r.timestamp, r.poller_index));

    let report = SoakReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        producers: config.producers,
        time_unit: config.buckets.time_unit(),
        buckets: config.buckets.buckets().to_vec(),
        poller_intervals_ms: config.pollers.intervals().to_vec(),
        total_count: recorder.count(0),
        total_time: recorder.total_time(),
        average: recorder.value(0),
        bucket_counts: (0..config.buckets.len())
            .map(|i| recorder.bucket_count(i))
            .collect(),
        overflow_count: recorder.overflow_count(),
        reference_count: reference.histogram.len(),
        reference_total: reference.total,
        reference_p50: reference.histogram.value_at_quantile(0.5),
        reference_p99: reference.histogram.value_at_quantile(0.99),
        reference_max: reference.histogram.max(),
        diagnostics: DiagnosticsSummary {
            polled_intervals: diagnostics.polled_intervals(),
            repolled_intervals: diagnostics.repolled_intervals(),
            missed_intervals: diagnostics.missed_intervals(),
        },
        intervals,
    };

    if report.is_consistent() {
        info!(
            "Soak run {} recorded {} durations, average {}{}",
            run_id,
            report.total_count,
            report.average,
            config.buckets.time_unit_abbreviation()
        );
    } else {
        warn!(
            "Soak run {} does not reconcile: recorder count {} total {}, producers count {} total {}",
            run_id,
            report.total_count,
            report.total_time,
            report.reference_count,
            report.reference_total
        );
    }
    if report.diagnostics.missed_intervals > 0 {
        warn!(
            "Pollers missed {} intervals",
            report.diagnostics.missed_intervals
        );
    }

    if let Some(path) = &config.output {
        report.write_json(path)?;
        info!("Soak report written to {:?}", path);
    }

    Ok(report)
}

/// What the producers recorded, independently of the recorder
struct ProducerTally {
    histogram: Histogram<u64>,
    total: u64,
}

/// Record random durations from `config.producers` threads until `stop` is set,
/// returning the merged tally
fn run_producers(
    recorder: &BucketedDurationRecorder,
    stop: &AtomicBool,
    config: &SoakConfig,
) -> Result<ProducerTally> {
    let tallies = crossbeam::scope(|s| {
        let handles: Vec<_> = (0..config.producers)
            .map(|_| {
                s.spawn(move |_| -> Result<ProducerTally> {
                    let mut tally = ProducerTally {
                        histogram: Histogram::<u64>::new(3)?,
                        total: 0,
                    };
                    let mut rng = rand::thread_rng();
                    while !stop.load(Ordering::Acquire) {
                        let duration = rng.gen_range(0..=config.max_latency);
                        recorder.record(duration);
                        tally.histogram.record(duration as u64)?;
                        tally.total += duration as u64;
                        if !config.producer_pause.is_zero() {
                            std::thread::sleep(config.producer_pause);
                        }
                    }
                    Ok(tally)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow!("Producer thread panicked"))?)
            .collect::<Result<Vec<_>>>()
    })
    .map_err(|_| anyhow!("Producer scope panicked"))??;

    let mut merged = ProducerTally {
        histogram: Histogram::<u64>::new(3)?,
        total: 0,
    };
    for tally in &tallies {
        merged.histogram.add(&tally.histogram)?;
        merged.total += tally.total;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_sample_interval_covers_all_monitors() {
        let clock = Arc::new(ManualClock::new(600_000));
        let context = MetricContext::new(clock.clone(), Pollers::new(vec![1_000]).unwrap());
        let recorder = BucketedDurationRecorder::new(
            MonitorConfig::new("requests"),
            BucketConfig::new(vec![10, 100]).unwrap(),
            &context,
        );

        recorder.record(4);
        recorder.record(40);
        clock.advance(1_000);

        let report = sample_interval(&recorder, &context, 0);
        assert_eq!(report.interval_ms, 1_000);
        assert_eq!(report.count, 2);
        assert_eq!(report.average, 22);

        let values: Vec<Option<i64>> = report.samples.iter().map(|s| s.value).collect();
        assert_eq!(
            values,
            vec![Some(44), Some(4), Some(40), Some(1), Some(1), Some(0)]
        );
    }
}
