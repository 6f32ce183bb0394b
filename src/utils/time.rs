use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// This is the standard way of converting a date to a string in timelog.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Returns the day `time` is accounted to. Anything before `start_of_day` still belongs to the
/// previous day, so a session lasting until 2 AM counts towards the evening it started in.
pub fn logical_date(time: NaiveDateTime, start_of_day: NaiveTime) -> NaiveDate {
    if time.time() < start_of_day {
        time.date() - Duration::days(1)
    } else {
        time.date()
    }
}

/// Returns the moment the logical `date` begins.
pub fn logical_day_start(date: NaiveDate, start_of_day: NaiveTime) -> NaiveDateTime {
    date.and_time(start_of_day)
}

/// Returns start of the logical day after `date`.
pub fn next_logical_day_start(date: NaiveDate, start_of_day: NaiveTime) -> NaiveDateTime {
    logical_day_start(date + Duration::days(1), start_of_day)
}
