use crate::monitor::TimeUnit;
use crate::pollers::Pollers;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Step Metrics soak harness - records durations from many threads while
/// independent pollers read them back
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Name of the recorded metric
    #[clap(short = 'n', long, default_value = "soak.latency")]
    pub name: String,

    /// Number of producer threads
    #[clap(short = 'p', long, default_value_t = num_cpus::get())]
    pub producers: usize,

    /// How long to run (e.g. "10s", "500ms", "1m")
    #[clap(short = 'd', long, value_parser = parse_duration, default_value = "10s")]
    pub duration: Duration,

    /// Ascending bucket boundaries, comma separated
    #[clap(short = 'b', long, value_delimiter = ',', default_values_t = crate::defaults::BUCKETS.to_vec())]
    pub buckets: Vec<i64>,

    /// Unit of recorded durations and bucket labels (ns, us, ms, s, min, h, day)
    #[clap(short = 'u', long, default_value = "ms")]
    pub unit: TimeUnit,

    /// Polling intervals in milliseconds, comma separated
    #[clap(long, default_value = crate::defaults::POLLERS)]
    pub pollers: Pollers,

    /// Largest simulated duration a producer records
    #[clap(long, default_value_t = crate::defaults::MAX_LATENCY)]
    pub max_latency: i64,

    /// Pause between records of one producer, in microseconds
    #[clap(long, default_value_t = crate::defaults::PRODUCER_PAUSE.as_micros() as u64)]
    pub pause_us: u64,

    /// JSON output file for the final report
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Suffixes accepted by [`parse_duration`] with their length in milliseconds.
/// "ms" must come before "s" and "m".
const DURATION_SUFFIXES: [(&str, f64); 4] = [
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse a run length such as "10s", "500ms", "1.5m" or "2h"; a bare number
/// is taken as seconds
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (number, millis_per_unit) = DURATION_SUFFIXES
        .iter()
        .find_map(|&(suffix, millis)| s.strip_suffix(suffix).map(|n| (n, millis)))
        .unwrap_or((s, 1_000.0));

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", number))?;
    if value.is_sign_negative() {
        return Err(format!("Duration cannot be negative: {}", s));
    }

    // Rejects NaN, infinity and anything too large for a Duration.
    Duration::try_from_secs_f64(value * millis_per_unit / 1_000.0)
        .map_err(|e| format!("Invalid duration {}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_non_finite_and_huge_values() {
        assert!(parse_duration("nan").is_err());
        assert!(parse_duration("NaNs").is_err());
        assert!(parse_duration("infm").is_err());
        assert!(parse_duration("1e400s").is_err());
        assert!(parse_duration("1e300h").is_err());

        assert!(Args::try_parse_from(["step-metrics", "--duration", "nan"]).is_err());
        assert!(Args::try_parse_from(["step-metrics", "--duration", "1e400s"]).is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["step-metrics"]);
        assert_eq!(args.duration, Duration::from_secs(10));
        assert_eq!(args.buckets, vec![1, 5, 10, 50, 100, 500]);
        assert_eq!(args.unit, TimeUnit::Milliseconds);
        assert_eq!(args.pollers.intervals(), &[1000, 250]);
        assert!(args.producers >= 1);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "step-metrics",
            "-b",
            "10,50,100",
            "-u",
            "us",
            "--pollers",
            "500",
            "-d",
            "2s",
        ]);
        assert_eq!(args.buckets, vec![10, 50, 100]);
        assert_eq!(args.unit, TimeUnit::Microseconds);
        assert_eq!(args.pollers.intervals(), &[500]);
        assert_eq!(args.duration, Duration::from_secs(2));
    }
}
