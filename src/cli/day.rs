use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use crate::{
    insight::datum::DurationDatum,
    model::{entry::LogEntry, person::person_name},
    preferences::Preferences,
    storage::{entry_source::EntrySource, journal::Journal},
    utils::{
        clock::Clock,
        time::{display_date, logical_date, logical_day_start, next_logical_day_start},
    },
};

use super::{parse_human_date, DateStyle};

#[derive(Debug, Parser)]
pub struct DayCommand {
    #[arg(
        long,
        short,
        help = "Day to list. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Entries finished on the logical `date`, followed by the entry in progress if it started on
/// that day.
pub fn render_day(date: NaiveDate, journal: &Journal, preferences: &Preferences) -> Result<Vec<String>> {
    let from = logical_day_start(date, preferences.start_of_day);
    let to = next_logical_day_start(date, preferences.start_of_day);

    let mut lines = vec![display_date(date)];
    for entry in journal.entries().finished_between(from, to) {
        lines.push(render_entry(&entry, journal)?);
    }
    if let Some(entry) = journal
        .entries()
        .unfinished()
        .filter(|v| from <= v.start() && v.start() < to)
    {
        lines.push(render_entry(entry, journal)?);
    }
    Ok(lines)
}

fn render_entry(entry: &LogEntry, journal: &Journal) -> Result<String> {
    let activity = journal.activities().get(entry.activity())?;
    let (end, duration) = match entry.end() {
        Some(end) => (
            end.format("%H:%M").to_string(),
            DurationDatum::of(entry)?.to_string(),
        ),
        None => ("...".to_string(), String::new()),
    };
    let mut line = format!(
        "{}-{end}\t{duration}\t{}",
        entry.start().format("%H:%M"),
        activity.name()
    );
    if !entry.what().is_empty() {
        line += &format!(": {}", entry.what());
    }
    if !entry.persons().is_empty() {
        let people = entry
            .persons()
            .iter()
            .map(|person| person_name(journal.people(), *person))
            .collect::<Vec<_>>();
        line += &format!(" with {}", people.join(", "));
    }
    Ok(line)
}

pub fn process_day_command(
    DayCommand { date, date_style }: DayCommand,
    clock: &impl Clock,
    journal: &Journal,
    preferences: &Preferences,
) -> Result<()> {
    let now = clock.now();
    let date = match date {
        Some(date) => parse_human_date(&date, now, date_style)?.date(),
        None => logical_date(now, preferences.start_of_day),
    };
    for line in render_day(date, journal, preferences)? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        model::{
            activity::{Activity, ActivityId, ActivityRepository},
            entry::{EntryId, LogEntry},
            person::{People, Person, PersonId},
        },
        preferences::Preferences,
        storage::{entry_source::InMemoryEntrySource, journal::Journal},
    };

    use super::render_day;

    const TEST_DATE_TIME: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    );

    #[test]
    fn lists_entries_of_logical_day() -> Result<()> {
        let activities = ActivityRepository::new([
            Activity::new(ActivityId(1), ActivityId::ROOT, "Reading")?,
            Activity::new(ActivityId(2), ActivityId::ROOT, "Sleep")?,
        ]);
        let people: People = [(PersonId(1), Person::new(PersonId(1), "Alice"))].into();
        let entries = InMemoryEntrySource::new([
            LogEntry::new(EntryId(1), ActivityId(1), TEST_DATE_TIME)
                .with_duration(Duration::minutes(45))
                .with_what("Dune")
                .with_person(PersonId(1))
                .with_person(PersonId(2)),
            // Ends at 1 AM, before the start of the next day
            LogEntry::new(EntryId(2), ActivityId(2), TEST_DATE_TIME + Duration::hours(15))
                .with_duration(Duration::hours(2)),
            LogEntry::new(EntryId(3), ActivityId(1), TEST_DATE_TIME + Duration::hours(18)),
            LogEntry::new(EntryId(4), ActivityId(1), TEST_DATE_TIME - Duration::days(1))
                .with_duration(Duration::minutes(5)),
        ]);
        let journal = Journal::new(activities, people, entries, vec![]);
        let preferences = Preferences {
            start_of_day: NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
            ..Preferences::default()
        };

        let lines = render_day(TEST_DATE_TIME.date(), &journal, &preferences)?;
        assert_eq!(
            lines,
            vec![
                "05.04.2024",
                "08:00-08:45\t45m\tReading: Dune with Alice, #2",
                "23:00-01:00\t2h 00m\tSleep",
                "02:00-...\t\tReading",
            ]
        );
        Ok(())
    }
}
