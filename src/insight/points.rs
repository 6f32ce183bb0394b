use std::fmt::Display;

use chrono::{NaiveDate, NaiveTime};
use tracing::instrument;

use crate::{
    error::InsightResult,
    model::{activity::ActivityRepository, entry::LogEntry, person::People},
    storage::entry_source::EntrySource,
    utils::time::{logical_day_start, next_logical_day_start},
};

/// Score of a day. Every minute is worth the points per minute of its activity, scaled by the
/// points factor of everyone associated with the entry. `base` counts plain minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Points {
    points: f64,
    base: f64,
}

impl Points {
    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn add(
        &mut self,
        entry: &LogEntry,
        activities: &ActivityRepository,
        people: &People,
    ) -> InsightResult<()> {
        let mut factor = activities.get(entry.activity())?.points_per_minute();
        for person in entry.persons() {
            factor *= people.get(person).map_or(1., |v| v.points_factor());
        }
        let minutes = entry.duration()?.num_minutes() as f64;
        self.points += factor * minutes;
        self.base += minutes;
        Ok(())
    }

    /// Points of every entry finished on the logical day `date`.
    #[instrument(skip(source, activities, people))]
    pub fn of_day(
        date: NaiveDate,
        start_of_day: NaiveTime,
        source: &(impl EntrySource + ?Sized),
        activities: &ActivityRepository,
        people: &People,
    ) -> InsightResult<Self> {
        let mut points = Self::default();
        let from = logical_day_start(date, start_of_day);
        let to = next_logical_day_start(date, start_of_day);
        for entry in source.finished_between(from, to) {
            points.add(&entry, activities, people)?;
        }
        Ok(points)
    }

    /// Renders the rounded points, or the difference to the base points when `relative`.
    pub fn render(&self, relative: bool) -> String {
        let points = self.points.round() as i64;
        if relative {
            format!("{:+}", points - self.base.round() as i64)
        } else {
            points.to_string()
        }
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(false))
    }
}
