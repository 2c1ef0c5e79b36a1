//! # Step Metrics Soak Harness - Main Entry Point
//!
//! Drives a bucketed duration recorder from many producer threads while one
//! poller per configured cadence reads it back, then reconciles what the
//! recorder saw with what the producers recorded.
//!
//! 1. **Initialize logging**: tracing with the colorized formatter; the level is
//!    controlled with `RUST_LOG` (default `info`)
//! 2. **Parse arguments**: producers, run length, buckets, unit, pollers
//! 3. **Run**: see [`step_metrics::soak`]
//! 4. **Report**: summary in the log, optional JSON report file
//!
//! The process exits with an error if the recorder's totals do not reconcile.

use anyhow::Result;
use clap::Parser;
use step_metrics::{
    cli::Args,
    logging::ColorizedFormatter,
    soak::{run_soak, SoakConfig},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .event_format(ColorizedFormatter)
        .init();

    let args = Args::parse();
    info!("Configuration: {:?}", args);

    let config = SoakConfig::from_args(&args)?;
    let report = run_soak(config).await?;

    for (i, &boundary) in report.buckets.iter().enumerate() {
        info!(
            "  <= {:>8}{}: {}",
            boundary,
            report.time_unit.abbreviation(),
            report.bucket_counts[i]
        );
    }
    info!("  overflow   : {}", report.overflow_count);
    info!(
        "  p50 {} / p99 {} / max {} (reference histogram)",
        report.reference_p50, report.reference_p99, report.reference_max
    );
    info!(
        "  polls: {} on cadence, {} repolled, {} intervals missed",
        report.diagnostics.polled_intervals,
        report.diagnostics.repolled_intervals,
        report.diagnostics.missed_intervals
    );

    if !report.is_consistent() {
        error!("Recorder totals do not match the producers' tally");
        anyhow::bail!("soak run {} failed to reconcile", report.run_id);
    }
    Ok(())
}
