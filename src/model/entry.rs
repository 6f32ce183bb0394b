use std::{cmp::Ordering, collections::BTreeSet, fmt::Display, sync::Arc};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, InsightResult};

use super::{activity::ActivityId, person::PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u32);

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportId(pub u32);

/// A logged period of time spent on an activity. An entry without an end is still in progress
/// and is ignored by every statistic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    id: EntryId,
    activity: ActivityId,
    what: Arc<str>,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    transport: Option<TransportId>,
    persons: BTreeSet<PersonId>,
}

impl LogEntry {
    pub fn new(id: EntryId, activity: ActivityId, start: NaiveDateTime) -> Self {
        Self {
            id,
            activity,
            what: "".into(),
            start,
            end: None,
            transport: None,
            persons: BTreeSet::new(),
        }
    }

    pub fn with_end(self, end: NaiveDateTime) -> Self {
        Self {
            end: Some(end),
            ..self
        }
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        let end = self.start + duration;
        self.with_end(end)
    }

    pub fn with_what(self, what: impl Into<Arc<str>>) -> Self {
        Self {
            what: what.into(),
            ..self
        }
    }

    pub fn with_transport(self, transport: TransportId) -> Self {
        Self {
            transport: Some(transport),
            ..self
        }
    }

    pub fn with_person(mut self, person: PersonId) -> Self {
        self.persons.insert(person);
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn activity(&self) -> ActivityId {
        self.activity
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn transport(&self) -> Option<TransportId> {
        self.transport
    }

    pub fn persons(&self) -> &BTreeSet<PersonId> {
        &self.persons
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Time between start and end. Unfinished entries and entries ending before their start
    /// don't have a duration.
    pub fn duration(&self) -> InsightResult<Duration> {
        let end = self.end.ok_or(InsightError::UnfinishedEntry(self.id))?;
        if end < self.start {
            return Err(InsightError::EndBeforeStart(self.id));
        }
        Ok(end - self.start)
    }

    /// Entries are ordered by their end. Unfinished entries go last, ties are broken by id.
    pub fn cmp_by_end(&self, other: &Self) -> Ordering {
        (self.end.is_none(), self.end, self.id).cmp(&(other.end.is_none(), other.end, other.id))
    }
}
