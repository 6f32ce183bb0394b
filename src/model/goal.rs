use std::{fmt::Display, str::FromStr};

use chrono::{Duration, NaiveTime};

use crate::{
    error::{InsightError, InsightResult},
    insight::{bucket::BucketStrategy, streak::StreakCalculator},
};

use super::{
    activity::{ActivityId, ActivityRepository},
    person::{person_name, People, PersonId},
};

/// Interval of a goal, for example `3d` (at least once every 3 days), `2w` or `1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalSpec {
    count: u32,
    strategy: BucketStrategy,
}

impl IntervalSpec {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn strategy(&self) -> BucketStrategy {
        self.strategy
    }

    pub fn interval_days(&self) -> i64 {
        self.strategy.interval_days(self.count)
    }
}

impl FromStr for IntervalSpec {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InsightError::InvalidInterval(s.to_string());

        let mut chars = s.chars();
        let strategy = chars
            .next_back()
            .and_then(BucketStrategy::from_unit)
            .ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let count = digits.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { count, strategy })
    }
}

impl Display for IntervalSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.strategy.unit())
    }
}

/// Checks an interval without creating a goal.
pub fn valid_interval(interval: &str) -> bool {
    interval.parse::<IntervalSpec>().is_ok()
}

/// A recurring target: spend at least `min_duration` on `activity` (or one of its descendants),
/// optionally together with `person`, once every interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    activity: ActivityId,
    person: Option<PersonId>,
    interval: IntervalSpec,
    min_duration: Duration,
}

impl Goal {
    /// Validates the goal. Invalid intervals never reach a streak calculation.
    pub fn new(activity: ActivityId, interval: &str, min_duration: Duration) -> InsightResult<Self> {
        if min_duration < Duration::zero() {
            return Err(InsightError::NegativeMinDuration);
        }
        Ok(Self {
            activity,
            person: None,
            interval: interval.parse()?,
            min_duration,
        })
    }

    pub fn with_person(self, person: PersonId) -> Self {
        Self {
            person: Some(person),
            ..self
        }
    }

    pub fn activity(&self) -> ActivityId {
        self.activity
    }

    pub fn person(&self) -> Option<PersonId> {
        self.person
    }

    pub fn interval(&self) -> IntervalSpec {
        self.interval
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    /// Human readable description like `Reading 3d >=30m with Alice`.
    pub fn label(&self, activities: &ActivityRepository, people: &People) -> InsightResult<String> {
        let mut label = format!("{} {}", activities.get(self.activity)?.name(), self.interval);
        if !self.min_duration.is_zero() {
            label += &format!(" >={}m", self.min_duration.num_minutes());
        }
        if let Some(person) = self.person {
            label += &format!(" with {}", person_name(people, person));
        }
        Ok(label)
    }

    /// Selects the streak calculator matching the interval of the goal.
    pub fn calculator(
        &self,
        start_of_day: NaiveTime,
        activities: &ActivityRepository,
        people: &People,
    ) -> InsightResult<StreakCalculator> {
        Ok(StreakCalculator::new(
            self.label(activities, people)?,
            self.activity,
            self.person,
            self.interval,
            self.min_duration,
            start_of_day,
        ))
    }
}
