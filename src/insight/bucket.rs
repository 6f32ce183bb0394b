use std::fmt::Display;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Average length of a month in days, used to turn day spans into month counts for display.
const AVERAGE_MONTH_DAYS: f64 = 365.25 / 12.;

/// Granularity of the periods a streak is counted in. Every strategy measures distances between
/// buckets in days, only the mapping into buckets and the formatting differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketStrategy {
    Day,
    Week,
    Month,
}

impl BucketStrategy {
    pub fn from_unit(unit: char) -> Option<Self> {
        match unit {
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'm' => Some(Self::Month),
            _ => None,
        }
    }

    pub fn unit(self) -> char {
        match self {
            BucketStrategy::Day => 'd',
            BucketStrategy::Week => 'w',
            BucketStrategy::Month => 'm',
        }
    }

    /// First day of the bucket containing `day`.
    pub fn bucket_of(self, day: NaiveDate) -> NaiveDate {
        match self {
            BucketStrategy::Day => day,
            BucketStrategy::Week => {
                day - Duration::days(day.weekday().num_days_from_monday() as i64)
            }
            BucketStrategy::Month => day - Duration::days(day.day0() as i64),
        }
    }

    /// Largest allowed gap in days between two qualifying buckets of a streak with `count`
    /// buckets per interval.
    pub fn interval_days(self, count: u32) -> i64 {
        let count = count as i64;
        match self {
            BucketStrategy::Day => count,
            BucketStrategy::Week => count * 7,
            BucketStrategy::Month => count * 31,
        }
    }

    /// Converts a span in days between the first and the last bucket into a bucket count.
    /// Negative spans mean there is no streak at all.
    pub fn count(self, span_days: i64) -> i64 {
        if span_days < 0 {
            return 0;
        }
        match self {
            BucketStrategy::Day => span_days + 1,
            BucketStrategy::Week => span_days / 7 + 1,
            BucketStrategy::Month => (span_days as f64 / AVERAGE_MONTH_DAYS).round() as i64 + 1,
        }
    }

    pub fn format(self, span_days: i64) -> String {
        format!("{}{}", self.count(span_days), self.unit())
    }
}

impl Display for BucketStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketStrategy::Day => write!(f, "days"),
            BucketStrategy::Week => write!(f, "weeks"),
            BucketStrategy::Month => write!(f, "months"),
        }
    }
}
