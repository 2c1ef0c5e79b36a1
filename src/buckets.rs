//! # Bucket Configuration
//!
//! Boundaries are inclusive upper bounds in ascending order. They are fixed for
//! the lifetime of a recorder; the [`TimeUnit`] only feeds the bucket labels.
//!
//! ```rust
//! use step_metrics::{BucketConfig, TimeUnit};
//!
//! let config = BucketConfig::builder()
//!     .with_buckets(vec![10, 50, 100])
//!     .with_time_unit(TimeUnit::Milliseconds)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.label(0), "bucket=010ms");
//! ```

use crate::error::{MetricsError, Result};
use crate::monitor::TimeUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for values above the last boundary
pub const OVERFLOW_LABEL: &str = "bucket=overflow";

/// Validated bucket boundaries plus the unit used to label them
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BucketConfigBuilder")]
pub struct BucketConfig {
    buckets: Vec<i64>,
    time_unit: TimeUnit,
}

impl BucketConfig {
    pub fn builder() -> BucketConfigBuilder {
        BucketConfigBuilder::default()
    }

    /// Boundaries in milliseconds
    pub fn new(buckets: Vec<i64>) -> Result<Self> {
        Self::builder().with_buckets(buckets).build()
    }

    pub fn buckets(&self) -> &[i64] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false for a validated config
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn time_unit_abbreviation(&self) -> &'static str {
        self.time_unit.abbreviation()
    }

    /// Display label for the bucket at `index`
    ///
    /// Boundaries are zero padded to the width of the largest one so that
    /// lexical and numeric ordering agree.
    pub fn label(&self, index: usize) -> String {
        let width = self
            .buckets
            .last()
            .map_or(1, |largest| largest.to_string().len());
        format!(
            "bucket={:0width$}{}",
            self.buckets[index],
            self.time_unit_abbreviation(),
            width = width
        )
    }

    /// Index of the first bucket whose boundary is at least `value`, or `None`
    /// if `value` overflows every boundary
    pub fn bucket_index(&self, value: i64) -> Option<usize> {
        self.buckets.iter().position(|&boundary| value <= boundary)
    }
}

impl fmt::Display for BucketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketConfig{{timeUnit={}, buckets=[", self.time_unit)?;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", bucket)?;
        }
        write!(f, "]}}")
    }
}

/// Builder for [`BucketConfig`]; the unit defaults to milliseconds
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketConfigBuilder {
    #[serde(default)]
    buckets: Vec<i64>,
    #[serde(default)]
    time_unit: Option<TimeUnit>,
}

impl BucketConfigBuilder {
    pub fn with_buckets(mut self, buckets: Vec<i64>) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = Some(time_unit);
        self
    }

    /// Validate and build; boundaries must be non-empty, positive and
    /// strictly ascending
    pub fn build(self) -> Result<BucketConfig> {
        if self.buckets.is_empty() {
            return Err(MetricsError::EmptyBuckets);
        }
        for (index, &value) in self.buckets.iter().enumerate() {
            if value <= 0 {
                return Err(MetricsError::NonPositiveBucket { index, value });
            }
        }
        for pair in self.buckets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(MetricsError::UnorderedBuckets {
                    previous: pair[0],
                    value: pair[1],
                });
            }
        }

        Ok(BucketConfig {
            buckets: self.buckets,
            time_unit: self.time_unit.unwrap_or(TimeUnit::Milliseconds),
        })
    }
}

impl TryFrom<BucketConfigBuilder> for BucketConfig {
    type Error = MetricsError;

    fn try_from(builder: BucketConfigBuilder) -> Result<Self> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_validates_boundaries() {
        assert_eq!(BucketConfig::new(vec![]), Err(MetricsError::EmptyBuckets));
        assert_eq!(
            BucketConfig::new(vec![10, 0]),
            Err(MetricsError::NonPositiveBucket { index: 1, value: 0 })
        );
        assert_eq!(
            BucketConfig::new(vec![10, 50, 50]),
            Err(MetricsError::UnorderedBuckets {
                previous: 50,
                value: 50
            })
        );
        assert!(BucketConfig::new(vec![1]).is_ok());
    }

    #[test]
    fn test_labels_are_zero_padded() {
        let config = BucketConfig::builder()
            .with_buckets(vec![5, 50, 500, 5000])
            .with_time_unit(TimeUnit::Microseconds)
            .build()
            .unwrap();

        let labels: Vec<String> = (0..config.len()).map(|i| config.label(i)).collect();
        assert_eq!(
            labels,
            vec!["bucket=0005us", "bucket=0050us", "bucket=0500us", "bucket=5000us"]
        );

        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(sorted, labels);
    }

    #[test]
    fn test_bucket_index_is_inclusive() {
        let config = BucketConfig::new(vec![10, 50, 100]).unwrap();
        assert_eq!(config.bucket_index(0), Some(0));
        assert_eq!(config.bucket_index(10), Some(0));
        assert_eq!(config.bucket_index(11), Some(1));
        assert_eq!(config.bucket_index(100), Some(2));
        assert_eq!(config.bucket_index(101), None);
    }

    #[test]
    fn test_deserialize_validates() {
        let config: BucketConfig =
            serde_json::from_str(r#"{"buckets": [1, 2, 3], "time_unit": "s"}"#).unwrap();
        assert_eq!(config.time_unit(), TimeUnit::Seconds);
        assert_eq!(config.to_string(), "BucketConfig{timeUnit=SECONDS, buckets=[1, 2, 3]}");

        assert!(serde_json::from_str::<BucketConfig>(r#"{"buckets": [3, 2]}"#).is_err());
    }
}
