//! # Monitor Identity and Contracts
//!
//! A monitor is anything a registry or exporter can read a value from for a
//! given poller cadence. Identity is a name plus an ordered set of tags; composite
//! metrics derive the identities of their parts by adding one classification tag
//! (statistic kind, bucket label, unit).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name and tags identifying a monitor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorConfig {
    name: String,
    tags: BTreeMap<String, String>,
}

impl MonitorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Derive a new identity with one more tag; an existing key is overwritten
    pub fn with_additional_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tags = self.tags.clone();
        tags.insert(key.into(), value.into());
        Self {
            name: self.name.clone(),
            tags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.tags.is_empty() {
            return Ok(());
        }
        write!(f, "{{")?;
        for (i, (key, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// A value source that can be polled per cadence
pub trait Monitor: Send + Sync + fmt::Debug {
    fn config(&self) -> &MonitorConfig;

    /// Value for the given poller cadence
    ///
    /// `None` means there is no trustworthy reading for this interval (for
    /// example because polls were missed) and must not be treated as zero.
    fn value(&self, poller_index: usize) -> Option<i64>;
}

/// Granularity of recorded durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "min")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "day")]
    Days,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
    ];

    fn nanos(self) -> i128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Convert `duration` expressed in `from` into this unit
    ///
    /// Truncates toward zero when converting to a coarser unit and saturates at
    /// `i64::MIN`/`i64::MAX` when converting to a finer one.
    pub fn convert(self, duration: i64, from: TimeUnit) -> i64 {
        let converted = i128::from(duration) * from.nanos() / self.nanos();
        converted.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Convert a [`std::time::Duration`] into this unit, saturating at `i64::MAX`
    pub fn from_duration(self, duration: std::time::Duration) -> i64 {
        let converted = duration.as_nanos() / self.nanos() as u128;
        i64::try_from(converted).unwrap_or(i64::MAX)
    }

    /// Short suffix used in bucket labels
    pub fn abbreviation(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "day",
        }
    }

    /// Upper case name used as the value of the `unit` tag
    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.abbreviation() == s || unit.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid time unit: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_additional_tag() {
        let base = MonitorConfig::new("requests").with_additional_tag("unit", "MILLISECONDS");
        let derived = base.with_additional_tag("statistic", "max");

        assert_eq!(base.tags().len(), 1);
        assert_eq!(derived.name(), "requests");
        assert_eq!(derived.tag("statistic"), Some("max"));
        assert_eq!(derived.tag("unit"), Some("MILLISECONDS"));
        assert_ne!(base, derived);
        assert_eq!(
            derived.to_string(),
            "requests{statistic=max,unit=MILLISECONDS}"
        );
    }

    #[test]
    fn test_time_unit_convert() {
        assert_eq!(TimeUnit::Milliseconds.convert(1_500_000, TimeUnit::Nanoseconds), 1);
        assert_eq!(TimeUnit::Milliseconds.convert(2, TimeUnit::Seconds), 2_000);
        assert_eq!(TimeUnit::Minutes.convert(119_999, TimeUnit::Milliseconds), 1);
        assert_eq!(TimeUnit::Seconds.convert(-1_500, TimeUnit::Milliseconds), -1);
        assert_eq!(TimeUnit::Nanoseconds.convert(i64::MAX, TimeUnit::Days), i64::MAX);
        assert_eq!(TimeUnit::Nanoseconds.convert(i64::MIN, TimeUnit::Hours), i64::MIN);
    }

    #[test]
    fn test_time_unit_from_duration() {
        let d = std::time::Duration::from_micros(2_500);
        assert_eq!(TimeUnit::Milliseconds.from_duration(d), 2);
        assert_eq!(TimeUnit::Microseconds.from_duration(d), 2_500);
        assert_eq!(
            TimeUnit::Nanoseconds.from_duration(std::time::Duration::MAX),
            i64::MAX
        );
    }

    #[test]
    fn test_time_unit_parse() {
        assert_eq!("ms".parse::<TimeUnit>(), Ok(TimeUnit::Milliseconds));
        assert_eq!("seconds".parse::<TimeUnit>(), Ok(TimeUnit::Seconds));
        assert_eq!("day".parse::<TimeUnit>(), Ok(TimeUnit::Days));
        assert!("fortnight".parse::<TimeUnit>().is_err());
    }
}
