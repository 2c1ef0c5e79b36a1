use anyhow::Result;
use clap::Parser;
use step_metrics::cli::Args;
use step_metrics::soak::{run_soak, SoakConfig, SoakReport};

/// Run the harness briefly with fast pollers and check that the recorder
/// reconciles with the producers' own tally.
///
/// This is a lightweight smoke test; it relies on the wall clock so it only
/// asserts properties that hold regardless of scheduling jitter.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn soak_run_reconciles_and_writes_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("soak.json");

    let args = Args::parse_from([
        "step-metrics",
        "--producers",
        "3",
        "--duration",
        "400ms",
        "--buckets",
        "10,50,100",
        "--pollers",
        "200,50",
        "--max-latency",
        "150",
        "--output",
        output.to_str().expect("utf-8 temp path"),
    ]);
    let config = SoakConfig::from_args(&args)?;

    let report = run_soak(config).await?;

    assert!(report.total_count > 0);
    assert!(report.is_consistent());
    assert_eq!(report.bucket_counts.len(), 3);
    assert_eq!(
        report.bucket_counts.iter().sum::<i64>() + report.overflow_count,
        report.total_count
    );
    assert!(report.reference_max <= 150);
    assert!(!report.intervals.is_empty());
    assert!(report
        .intervals
        .iter()
        .all(|interval| interval.samples.len() == 3 + 4));

    let written: SoakReport = serde_json::from_reader(std::fs::File::open(&output)?)?;
    assert_eq!(written.run_id, report.run_id);
    assert_eq!(written.total_count, report.total_count);
    Ok(())
}

#[test]
fn soak_config_rejects_bad_arguments() {
    let args = Args::parse_from(["step-metrics", "--buckets", "50,10"]);
    assert!(SoakConfig::from_args(&args).is_err());

    let args = Args::parse_from(["step-metrics", "--producers", "0"]);
    assert!(SoakConfig::from_args(&args).is_err());

    assert!(Args::try_parse_from(["step-metrics", "--pollers", "0"]).is_err());
    assert!(Args::try_parse_from(["step-metrics", "--unit", "weeks"]).is_err());
}
