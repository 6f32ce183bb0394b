use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    error::{InsightError, InsightResult},
    model::{
        activity::{Activity, ActivityId},
        entry::{EntryId, LogEntry, TransportId},
        goal::Goal,
        person::{Person, PersonId},
    },
};

/// Line of `activities.jsonl`. Activities without a parent are children of the root.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityEntity {
    pub id: ActivityId,
    #[serde(default)]
    pub parent: Option<ActivityId>,
    pub name: Arc<str>,
    #[serde(default)]
    pub color: Option<Arc<str>>,
    #[serde(default = "default_factor")]
    pub points_per_minute: f64,
}

impl TryFrom<ActivityEntity> for Activity {
    type Error = InsightError;

    fn try_from(
        ActivityEntity {
            id,
            parent,
            name,
            color,
            points_per_minute,
        }: ActivityEntity,
    ) -> InsightResult<Self> {
        let activity = Activity::new(id, parent.unwrap_or(ActivityId::ROOT), name)?
            .with_points_per_minute(points_per_minute);
        Ok(match color {
            Some(color) => activity.with_color(color),
            None => activity,
        })
    }
}

/// Line of `people.jsonl`.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct PersonEntity {
    pub id: PersonId,
    pub name: Arc<str>,
    #[serde(default = "default_factor")]
    pub points_factor: f64,
}

impl From<PersonEntity> for Person {
    fn from(value: PersonEntity) -> Self {
        Person::new(value.id, value.name).with_points_factor(value.points_factor)
    }
}

fn default_factor() -> f64 {
    1.
}

/// Line of `entries.jsonl`. Timestamps are local time without an offset, for example
/// `2024-04-05T08:00:00`.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct LogEntryEntity {
    pub id: EntryId,
    pub activity: ActivityId,
    #[serde(default)]
    pub what: Arc<str>,
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub transport: Option<TransportId>,
    #[serde(default)]
    pub persons: Vec<PersonId>,
}

impl From<LogEntryEntity> for LogEntry {
    fn from(
        LogEntryEntity {
            id,
            activity,
            what,
            start,
            end,
            transport,
            persons,
        }: LogEntryEntity,
    ) -> Self {
        let mut entry = LogEntry::new(id, activity, start).with_what(what);
        if let Some(end) = end {
            entry = entry.with_end(end);
        }
        if let Some(transport) = transport {
            entry = entry.with_transport(transport);
        }
        persons
            .into_iter()
            .fold(entry, |entry, person| entry.with_person(person))
    }
}

/// Line of `goals.jsonl`. The minimum duration is stored in minutes.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct GoalEntity {
    pub activity: ActivityId,
    pub interval: String,
    #[serde(default = "Duration::zero", with = "minutes_ser")]
    pub min_duration: Duration,
    #[serde(default)]
    pub person: Option<PersonId>,
}

impl TryFrom<GoalEntity> for Goal {
    type Error = InsightError;

    fn try_from(value: GoalEntity) -> InsightResult<Self> {
        let goal = Goal::new(value.activity, &value.interval, value.min_duration)?;
        Ok(match value.person {
            Some(person) => goal.with_person(person),
            None => goal,
        })
    }
}

mod minutes_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_minutes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minutes = i64::deserialize(deserializer)?;
        Ok(Duration::minutes(minutes))
    }
}
