//! Goal streaks. A streak is a run of qualifying buckets (days, weeks or months in which at least
//! the minimum duration was spent on the goal's activity) where no two consecutive qualifying
//! buckets are further apart than the goal's interval.
//!
//! [StreakCalculator::init] scans history backwards from a reference moment once. After that
//! [Streak::accept_new] keeps the result current in constant time as new entries get logged.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, instrument, trace, warn};

use crate::{
    error::{InsightError, InsightResult},
    model::{
        activity::{ActivityId, ActivityRepository},
        entry::LogEntry,
        goal::IntervalSpec,
        person::PersonId,
    },
    storage::entry_source::EntrySource,
    utils::{
        percentage::{duration_percentage, Percentage},
        time::{logical_date, next_logical_day_start},
    },
};

use super::{bucket::BucketStrategy, datum::DurationDatum};

/// Everything needed to compute the streak of a goal. Created through
/// [Goal::calculator](crate::model::goal::Goal::calculator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakCalculator {
    label: String,
    activity: ActivityId,
    person: Option<PersonId>,
    strategy: BucketStrategy,
    interval_days: i64,
    min_duration: Duration,
    start_of_day: NaiveTime,
}

/// Observable result of a streak calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakState {
    /// First day of the bucket containing the reference moment.
    pub reference: NaiveDate,
    /// Most recent qualifying bucket.
    pub latest: Option<NaiveDate>,
    /// Oldest qualifying bucket still connected to `latest`.
    pub earliest: Option<NaiveDate>,
    /// Relevant time logged inside the reference bucket.
    pub reference_duration: Duration,
    pub reference_qualified: bool,
    pub complete: bool,
    pub streak: String,
    pub progress: String,
}

impl StreakState {
    fn new(reference: NaiveDate) -> Self {
        Self {
            reference,
            latest: None,
            earliest: None,
            reference_duration: Duration::zero(),
            reference_qualified: false,
            complete: false,
            streak: String::new(),
            progress: String::new(),
        }
    }
}

impl StreakCalculator {
    pub(crate) fn new(
        label: String,
        activity: ActivityId,
        person: Option<PersonId>,
        interval: IntervalSpec,
        min_duration: Duration,
        start_of_day: NaiveTime,
    ) -> Self {
        Self {
            label,
            activity,
            person,
            strategy: interval.strategy(),
            interval_days: interval.interval_days(),
            min_duration,
            start_of_day,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn strategy(&self) -> BucketStrategy {
        self.strategy
    }

    fn is_relevant(
        &self,
        entry: &LogEntry,
        source: &(impl EntrySource + ?Sized),
        activities: &ActivityRepository,
    ) -> InsightResult<bool> {
        if !activities.instance_of(entry.activity(), self.activity)? {
            return Ok(false);
        }
        Ok(self
            .person
            .map_or(true, |person| source.is_associated(entry, person)))
    }

    fn bucket_of(&self, entry: &LogEntry) -> InsightResult<NaiveDate> {
        let end = entry
            .end()
            .ok_or(InsightError::UnfinishedEntry(entry.id()))?;
        Ok(self
            .strategy
            .bucket_of(logical_date(end, self.start_of_day)))
    }

    /// Computes the streak as seen at `reference` by scanning finished entries backwards. The scan
    /// ends as soon as an entry is too old to extend the streak any further.
    #[instrument(skip(self, source, activities), fields(label = %self.label))]
    pub fn init(
        self,
        reference: NaiveDateTime,
        source: &(impl EntrySource + ?Sized),
        activities: &ActivityRepository,
    ) -> InsightResult<Streak> {
        let reference_day = logical_date(reference, self.start_of_day);
        let cutoff = next_logical_day_start(reference_day, self.start_of_day);
        let mut state = StreakState::new(self.strategy.bucket_of(reference_day));

        // Running total of the bucket the scan is currently in. A bucket showing up again after
        // a different one starts from scratch.
        let mut current: Option<(NaiveDate, Duration)> = None;
        let mut scanned = 0usize;

        for entry in source.finished_before(cutoff) {
            scanned += 1;
            if !self.is_relevant(&entry, source, activities)? {
                continue;
            }
            let bucket = self.bucket_of(&entry)?;
            if let Some(earliest) = state.earliest {
                if (earliest - bucket).num_days() > self.interval_days {
                    trace!("Bucket {bucket} can't extend streak starting at {earliest}");
                    break;
                }
            }

            let duration = entry.duration()?;
            if bucket == state.reference {
                state.reference_duration += duration;
            }
            let accumulated = match current {
                Some((current_bucket, accumulated)) if current_bucket == bucket => {
                    accumulated + duration
                }
                _ => duration,
            };
            current = Some((bucket, accumulated));
            if accumulated < self.min_duration {
                continue;
            }

            if bucket == state.reference {
                state.reference_qualified = true;
            }
            let earliest = *state.earliest.get_or_insert(bucket);
            state.latest.get_or_insert(bucket);
            match (earliest - bucket).num_days() {
                days if days < 0 => {
                    return Err(InsightError::UnorderedHistory { bucket, earliest });
                }
                0 => {}
                _ => state.earliest = Some(bucket),
            }
        }
        debug!("Scanned {scanned} entries");

        self.post_init(&mut state)?;
        Ok(Streak {
            calculator: self,
            state,
        })
    }

    fn post_init(&self, state: &mut StreakState) -> InsightResult<()> {
        state.progress = format_progress(state.reference_duration, self.min_duration);

        let (Some(latest), Some(earliest)) = (state.latest, state.earliest) else {
            state.complete = false;
            state.streak = self.strategy.format(-1);
            return Ok(());
        };

        let days_left = (state.reference - latest).num_days();
        if days_left < 0 {
            return Err(InsightError::EntryAfterReference {
                latest,
                reference: state.reference,
            });
        }
        let span = (latest - earliest).num_days();

        state.complete = days_left == 0;
        state.streak = if days_left == 0 {
            self.strategy.format(span)
        } else if days_left < self.interval_days {
            format!(
                "({}) {}",
                self.strategy.count(span),
                self.strategy.format(span + days_left)
            )
        } else {
            format!(
                "({}) {}",
                self.strategy.count(span),
                self.strategy.format(-1)
            )
        };
        Ok(())
    }
}

/// `20m/30m` style rendering, where zero renders as `0m`.
fn format_progress(done: Duration, required: Duration) -> String {
    let render = |value: Duration| {
        let rendered = DurationDatum::new(value).to_string();
        if rendered.is_empty() {
            "0m".to_string()
        } else {
            rendered
        }
    };
    format!("{}/{}", render(done), render(required))
}

/// Streak of a goal at a reference moment, kept up to date through [Streak::accept_new].
#[derive(Debug, Clone)]
pub struct Streak {
    calculator: StreakCalculator,
    state: StreakState,
}

impl Streak {
    pub fn label(&self) -> &str {
        self.calculator.label()
    }

    pub fn streak(&self) -> &str {
        &self.state.streak
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    pub fn progress(&self) -> &str {
        &self.state.progress
    }

    /// Progress inside the reference bucket. Goals without a minimum duration have none.
    pub fn progress_percentage(&self) -> Option<Percentage> {
        duration_percentage(self.state.reference_duration, self.calculator.min_duration)
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    /// Accounts for a single entry logged after [StreakCalculator::init]. The entry is expected
    /// to end inside the reference bucket, the result then matches a fresh `init` that already
    /// sees the entry.
    #[instrument(skip_all, fields(label = %self.calculator.label, entry = %entry.id()))]
    pub fn accept_new(
        &mut self,
        entry: &LogEntry,
        source: &(impl EntrySource + ?Sized),
        activities: &ActivityRepository,
    ) -> InsightResult<()> {
        if !self.calculator.is_relevant(entry, source, activities)? {
            trace!("Entry isn't relevant");
            return Ok(());
        }
        let bucket = self.calculator.bucket_of(entry)?;
        if bucket != self.state.reference {
            warn!(
                "Entry ends in bucket {bucket} outside of reference bucket {}",
                self.state.reference
            );
        }

        self.state.reference_duration += entry.duration()?;
        if !self.state.reference_qualified
            && self.state.reference_duration >= self.calculator.min_duration
        {
            self.state.reference_qualified = true;
            let reference = self.state.reference;
            match self.state.latest {
                None => {
                    self.state.latest = Some(reference);
                    self.state.earliest = Some(reference);
                }
                Some(latest) if latest < reference => {
                    if (reference - latest).num_days() > self.calculator.interval_days {
                        self.state.earliest = Some(reference);
                    }
                    self.state.latest = Some(reference);
                }
                Some(_) => {}
            }
            debug!("Reference bucket {reference} qualified");
        }
        self.calculator.post_init(&mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        error::InsightError,
        model::{
            activity::{Activity, ActivityId, ActivityRepository},
            entry::{EntryId, LogEntry},
            goal::Goal,
            person::{People, PersonId},
        },
        storage::entry_source::{EntrySource, InMemoryEntrySource},
        utils::logging::TEST_LOGGING,
    };

    use super::StreakCalculator;

    const SPORT: ActivityId = ActivityId(1);
    const RUNNING: ActivityId = ActivityId(2);
    const READING: ActivityId = ActivityId(3);

    // A Wednesday.
    const DAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 4, 17).unwrap();

    fn activities() -> Result<ActivityRepository> {
        Ok(ActivityRepository::new([
            Activity::new(SPORT, ActivityId::ROOT, "Sport")?,
            Activity::new(RUNNING, SPORT, "Running")?,
            Activity::new(READING, ActivityId::ROOT, "Reading")?,
        ]))
    }

    fn day(offset: i64) -> NaiveDate {
        DAY + Duration::days(offset)
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    /// Entry ending at `hour` on `date` after `minutes` of activity.
    fn entry(id: u32, activity: ActivityId, date: NaiveDate, hour: u32, minutes: i64) -> LogEntry {
        LogEntry::new(
            EntryId(id),
            activity,
            at(date, hour) - Duration::minutes(minutes),
        )
        .with_end(at(date, hour))
    }

    fn calculator(
        activities: &ActivityRepository,
        interval: &str,
        min_minutes: i64,
    ) -> Result<StreakCalculator> {
        Ok(Goal::new(SPORT, interval, Duration::minutes(min_minutes))?.calculator(
            NaiveTime::MIN,
            activities,
            &People::new(),
        )?)
    }

    #[test]
    fn day_streak() -> Result<()> {
        *TEST_LOGGING;
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(0), 10, 30),
            entry(2, SPORT, day(-1), 10, 30),
            entry(3, RUNNING, day(-2), 20, 30),
            entry(4, READING, day(-3), 10, 60),
        ]);

        let streak = calculator(&activities, "3d", 30)?.init(at(day(0), 23), &source, &activities)?;
        assert_eq!(streak.streak(), "3d");
        assert!(streak.is_complete());
        assert_eq!(streak.progress(), "30m/30m");

        let streak = calculator(&activities, "3d", 30)?.init(at(day(1), 12), &source, &activities)?;
        assert_eq!(streak.streak(), "(3) 4d");
        assert!(!streak.is_complete());
        assert_eq!(streak.progress(), "0m/30m");
        Ok(())
    }

    #[test]
    fn day_streak_broken_after_interval() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(-3), 10, 30),
            entry(2, RUNNING, day(-4), 10, 30),
        ]);
        let streak = calculator(&activities, "3d", 30)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.streak(), "(2) 0d");
        assert!(!streak.is_complete());
        Ok(())
    }

    #[test]
    fn gaps_within_interval_keep_streak() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(0), 10, 30),
            entry(2, RUNNING, day(-2), 10, 30),
            entry(3, RUNNING, day(-4), 10, 30),
            // Too far away from day(-4) for a 2 day interval
            entry(4, RUNNING, day(-7), 10, 30),
        ]);
        let streak = calculator(&activities, "2d", 30)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.state().earliest, Some(day(-4)));
        assert_eq!(streak.streak(), "5d");
        Ok(())
    }

    #[test]
    fn no_qualifying_bucket() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(0), 10, 10),
            entry(2, READING, day(-1), 10, 60),
        ]);
        let streak = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.streak(), "0d");
        assert!(!streak.is_complete());
        assert_eq!(streak.progress(), "10m/30m");
        assert_eq!(streak.progress_percentage().map(|v| v.to_string()), Some("33%".into()));
        Ok(())
    }

    #[test]
    fn durations_accumulate_per_bucket() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(0), 10, 10),
            entry(2, RUNNING, day(0), 12, 10),
            entry(3, SPORT, day(0), 14, 10),
        ]);
        let streak = calculator(&activities, "1d", 30)?.init(at(day(0), 15), &source, &activities)?;
        assert_eq!(streak.streak(), "1d");
        assert!(streak.is_complete());
        assert_eq!(streak.progress(), "30m/30m");
        Ok(())
    }

    #[test]
    fn start_of_day_moves_late_entries_to_previous_day() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            // Ends at 2 AM, still part of the previous day with a 4 AM start of day
            entry(1, RUNNING, day(0), 2, 30),
        ]);
        let four_am = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let calculator = Goal::new(SPORT, "1d", Duration::minutes(30))?.calculator(
            four_am,
            &activities,
            &People::new(),
        )?;

        let streak = calculator.clone().init(at(day(-1), 23), &source, &activities)?;
        assert_eq!(streak.state().reference, day(-1));
        assert_eq!(streak.streak(), "1d");
        assert!(streak.is_complete());

        // At 3 AM it's still the previous day
        let streak = calculator.clone().init(at(day(0), 3), &source, &activities)?;
        assert_eq!(streak.state().reference, day(-1));
        assert!(streak.is_complete());

        let streak = calculator.init(at(day(0), 5), &source, &activities)?;
        assert_eq!(streak.state().reference, day(0));
        assert_eq!(streak.streak(), "(1) 0d");
        Ok(())
    }

    #[test]
    fn person_filter() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, day(0), 10, 30),
            entry(2, RUNNING, day(-1), 10, 30).with_person(PersonId(1)),
        ]);
        let calculator = Goal::new(SPORT, "1d", Duration::minutes(30))?
            .with_person(PersonId(1))
            .calculator(NaiveTime::MIN, &activities, &People::new())?;
        let streak = calculator.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.state().latest, Some(day(-1)));
        assert_eq!(streak.streak(), "(1) 0d");
        assert_eq!(streak.label(), "Sport 1d >=30m with #1");
        Ok(())
    }

    #[test]
    fn week_streak_incremental_matches_full_scan() -> Result<()> {
        *TEST_LOGGING;
        let activities = activities()?;
        // Monday and Tuesday of the same week
        let monday = day(-2);
        let tuesday = day(-1);
        let first = entry(1, RUNNING, monday, 10, 20);
        let second = entry(2, RUNNING, tuesday, 10, 20);
        let reference = at(tuesday, 20);

        let mut source = InMemoryEntrySource::new([first.clone()]);
        let mut streak = calculator(&activities, "1w", 30)?.init(reference, &source, &activities)?;
        assert_eq!(streak.streak(), "0w");
        assert!(!streak.is_complete());
        assert_eq!(streak.progress(), "20m/30m");

        source.push(second.clone());
        streak.accept_new(&second, &source, &activities)?;
        assert_eq!(streak.streak(), "1w");
        assert!(streak.is_complete());
        assert_eq!(streak.progress(), "40m/30m");

        let full = calculator(&activities, "1w", 30)?.init(reference, &source, &activities)?;
        assert_eq!(streak.state(), full.state());
        Ok(())
    }

    #[test]
    fn incremental_update_extends_and_restarts_streaks() -> Result<()> {
        let activities = activities()?;
        let history = [
            entry(1, RUNNING, day(-1), 10, 30),
            entry(2, RUNNING, day(-2), 10, 30),
        ];
        let new_entry = entry(3, RUNNING, day(0), 9, 30);

        for (interval, history) in [("1d", &history[..]), ("1d", &history[1..]), ("3d", &history[1..])] {
            let mut source = InMemoryEntrySource::new(history.iter().cloned());
            let mut streak =
                calculator(&activities, interval, 30)?.init(at(day(0), 12), &source, &activities)?;
            streak.accept_new(&new_entry, &source, &activities)?;

            source.push(new_entry.clone());
            let full =
                calculator(&activities, interval, 30)?.init(at(day(0), 12), &source, &activities)?;
            assert_eq!(streak.state(), full.state(), "{interval} {}", history.len());
        }
        Ok(())
    }

    #[test]
    fn irrelevant_entries_are_ignored() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::default();
        let mut streak = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities)?;
        let before = streak.state().clone();
        streak.accept_new(&entry(1, READING, day(0), 10, 60), &source, &activities)?;
        assert_eq!(streak.state(), &before);
        Ok(())
    }

    #[test]
    fn zero_min_duration_qualifies_with_any_entry() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::default();
        let mut streak = calculator(&activities, "1d", 0)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.streak(), "0d");
        assert_eq!(streak.progress_percentage(), None);

        streak.accept_new(&entry(1, RUNNING, day(0), 10, 5), &source, &activities)?;
        assert_eq!(streak.streak(), "1d");
        assert!(streak.is_complete());
        Ok(())
    }

    #[test]
    fn month_streak() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::new([
            entry(1, RUNNING, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(), 10, 60),
            entry(2, RUNNING, NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(), 10, 60),
            entry(3, RUNNING, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(), 10, 60),
        ]);
        let streak = calculator(&activities, "1m", 60)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.state().earliest, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(streak.streak(), "3m");
        assert!(streak.is_complete());

        let streak = calculator(&activities, "1m", 60)?.init(
            at(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), 12),
            &source,
            &activities,
        )?;
        assert_eq!(streak.streak(), "(3) 4m");
        Ok(())
    }

    /// Counts how many entries the engine pulls out of the history.
    struct CountingSource {
        inner: InMemoryEntrySource,
        pulled: Cell<usize>,
    }

    impl EntrySource for CountingSource {
        fn finished_before(&self, cutoff: NaiveDateTime) -> Box<dyn Iterator<Item = LogEntry> + '_> {
            Box::new(self.inner.finished_before(cutoff).inspect(|_| {
                self.pulled.set(self.pulled.get() + 1);
            }))
        }

        fn finished_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<LogEntry> {
            self.inner.finished_between(from, to)
        }
    }

    #[test]
    fn scan_stops_once_streak_cannot_extend() -> Result<()> {
        let activities = activities()?;
        let mut entries = vec![
            entry(1, RUNNING, day(0), 10, 30),
            entry(2, RUNNING, day(-1), 10, 30),
        ];
        // Old history, more than an interval away
        entries.extend((0..100).map(|i| entry(10 + i, RUNNING, day(-10 - i as i64), 10, 30)));
        let source = CountingSource {
            inner: InMemoryEntrySource::new(entries),
            pulled: Cell::new(0),
        };

        let streak = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.streak(), "2d");
        assert_eq!(source.pulled.get(), 3);
        Ok(())
    }

    #[test]
    fn entries_outside_reference_bucket_still_count() -> Result<()> {
        let activities = activities()?;
        let source = InMemoryEntrySource::default();
        let mut streak = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities)?;
        streak.accept_new(&entry(1, RUNNING, day(1), 10, 5), &source, &activities)?;
        assert!(!streak.is_complete());
        streak.accept_new(&entry(2, RUNNING, day(2), 10, 30), &source, &activities)?;
        assert_eq!(streak.state().latest, Some(day(0)));
        assert_eq!(streak.progress(), "35m/30m");
        Ok(())
    }

    /// Ignores the cutoff and yields entries in the given order.
    struct UnorderedSource(Vec<LogEntry>);

    impl EntrySource for UnorderedSource {
        fn finished_before(&self, _: NaiveDateTime) -> Box<dyn Iterator<Item = LogEntry> + '_> {
            Box::new(self.0.iter().cloned())
        }

        fn finished_between(&self, _: NaiveDateTime, _: NaiveDateTime) -> Vec<LogEntry> {
            self.0.clone()
        }
    }

    #[test]
    fn bucket_total_restarts_when_bucket_reappears() -> Result<()> {
        let activities = activities()?;
        // Yesterday has 40m in total, but split around an older bucket
        let source = UnorderedSource(vec![
            entry(1, RUNNING, day(-1), 18, 20),
            entry(2, RUNNING, day(-2), 18, 10),
            entry(3, RUNNING, day(-1), 10, 20),
        ]);
        let streak = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities)?;
        assert_eq!(streak.state().latest, None);
        assert_eq!(streak.state().earliest, None);
        assert_eq!(streak.streak(), "0d");
        assert!(!streak.is_complete());
        Ok(())
    }

    #[test]
    fn inconsistent_history_is_rejected() -> Result<()> {
        let activities = activities()?;

        let source = UnorderedSource(vec![
            entry(1, RUNNING, day(-1), 10, 30),
            entry(2, RUNNING, day(1), 10, 30),
        ]);
        let result = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities);
        assert_eq!(
            result.map(|v| v.state().clone()),
            Err(InsightError::UnorderedHistory {
                bucket: day(1),
                earliest: day(-1)
            })
        );

        let source = UnorderedSource(vec![entry(1, RUNNING, day(1), 10, 30)]);
        let result = calculator(&activities, "1d", 30)?.init(at(day(0), 12), &source, &activities);
        assert_eq!(
            result.map(|v| v.state().clone()),
            Err(InsightError::EntryAfterReference {
                latest: day(1),
                reference: day(0)
            })
        );
        Ok(())
    }
}
