use std::fmt::{Debug, Display};

use chrono::Duration;

use crate::{
    error::{InsightError, InsightResult},
    model::entry::LogEntry,
};

/// A value that can be accumulated inside a [Statistic](super::statistic::Statistic).
/// Implementations form a monoid under [StatisticalDatum::plus] with [StatisticalDatum::zero] as
/// the identity and are ordered by magnitude.
pub trait StatisticalDatum: Clone + Ord + Display + Debug {
    type Value;

    fn zero() -> Self;

    fn plus(&self, other: &Self) -> Self;

    fn get(&self) -> Self::Value;

    fn is_zero(&self) -> bool;

    /// Average of the value over `averaged_over` periods.
    fn divide_by(&self, averaged_over: u32) -> InsightResult<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DurationDatum(Duration);

impl Default for DurationDatum {
    fn default() -> Self {
        Self::zero()
    }
}

impl DurationDatum {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn of(entry: &LogEntry) -> InsightResult<Self> {
        entry.duration().map(Self)
    }
}

impl StatisticalDatum for DurationDatum {
    type Value = Duration;

    fn zero() -> Self {
        Self(Duration::zero())
    }

    fn plus(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    fn get(&self) -> Duration {
        self.0
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn divide_by(&self, averaged_over: u32) -> InsightResult<Self> {
        if averaged_over == 0 {
            return Err(InsightError::DivideByZero);
        }
        let divisor = i32::try_from(averaged_over).unwrap_or(i32::MAX);
        Ok(Self(self.0 / divisor))
    }
}

/// Renders as `1h 05m` or `45m`. Anything below a minute renders as an empty string.
impl Display for DurationDatum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.0.num_seconds();
        let hours = seconds.div_euclid(3600);
        let minutes = seconds.div_euclid(60).rem_euclid(60);
        match (hours, minutes) {
            (0, 0) => Ok(()),
            (0, minutes) => write!(f, "{minutes}m"),
            (hours, minutes) => write!(f, "{hours}h {minutes:02}m"),
        }
    }
}
