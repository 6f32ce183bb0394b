use std::ops::Deref;

use chrono::NaiveDateTime;

use crate::model::{entry::LogEntry, person::PersonId};

/// Interface for abstracting access to logged entries.
pub trait EntrySource {
    /// Finished entries ending strictly before `cutoff`, latest end first. Consumers may stop
    /// iterating early, so implementations should produce entries lazily.
    fn finished_before(&self, cutoff: NaiveDateTime) -> Box<dyn Iterator<Item = LogEntry> + '_>;

    /// Finished entries ending in `[from, to)`, earliest end first.
    fn finished_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<LogEntry>;

    /// Whether `person` took part in `entry`.
    fn is_associated(&self, entry: &LogEntry, person: PersonId) -> bool {
        entry.persons().contains(&person)
    }
}

impl<T: Deref> EntrySource for T
where
    T::Target: EntrySource,
{
    fn finished_before(&self, cutoff: NaiveDateTime) -> Box<dyn Iterator<Item = LogEntry> + '_> {
        self.deref().finished_before(cutoff)
    }

    fn finished_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<LogEntry> {
        self.deref().finished_between(from, to)
    }

    fn is_associated(&self, entry: &LogEntry, person: PersonId) -> bool {
        self.deref().is_associated(entry, person)
    }
}

/// The main realization of [EntrySource]. Keeps entries ordered by their end.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEntrySource {
    entries: Vec<LogEntry>,
}

impl InMemoryEntrySource {
    pub fn new(entries: impl IntoIterator<Item = LogEntry>) -> Self {
        let mut entries = entries.into_iter().collect::<Vec<_>>();
        entries.sort_by(LogEntry::cmp_by_end);
        Self { entries }
    }

    pub fn push(&mut self, entry: LogEntry) {
        let position = self
            .entries
            .partition_point(|v| v.cmp_by_end(&entry).is_lt());
        self.entries.insert(position, entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The entry currently in progress, if any.
    pub fn unfinished(&self) -> Option<&LogEntry> {
        self.entries.iter().find(|v| !v.is_finished())
    }
}

impl EntrySource for InMemoryEntrySource {
    fn finished_before(&self, cutoff: NaiveDateTime) -> Box<dyn Iterator<Item = LogEntry> + '_> {
        Box::new(
            self.entries
                .iter()
                .rev()
                .filter(move |v| matches!(v.end(), Some(end) if end < cutoff))
                .cloned(),
        )
    }

    fn finished_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|v| matches!(v.end(), Some(end) if from <= end && end < to))
            .cloned()
            .collect()
    }
}
