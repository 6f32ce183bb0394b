use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::de::DeserializeOwned;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::{debug, info, instrument, warn};

use crate::model::{
    activity::{Activity, ActivityRepository},
    entry::LogEntry,
    goal::Goal,
    person::{People, Person},
};

use super::{
    entities::{ActivityEntity, GoalEntity, LogEntryEntity, PersonEntity},
    entry_source::InMemoryEntrySource,
};

pub const ACTIVITIES_FILE: &str = "activities.jsonl";
pub const PEOPLE_FILE: &str = "people.jsonl";
pub const ENTRIES_FILE: &str = "entries.jsonl";
pub const GOALS_FILE: &str = "goals.jsonl";

/// Everything logged so far, loaded from a journal directory. The journal is only ever read, so
/// a missing directory is simply an empty journal.
pub struct Journal {
    activities: ActivityRepository,
    people: People,
    entries: InMemoryEntrySource,
    goals: Vec<Goal>,
}

impl Journal {
    pub fn new(
        activities: ActivityRepository,
        people: People,
        entries: InMemoryEntrySource,
        goals: Vec<Goal>,
    ) -> Self {
        Self {
            activities,
            people,
            entries,
            goals,
        }
    }

    /// Reads all journal files concurrently. Records that can't be parsed or don't fit into the
    /// model are skipped with a warning.
    #[instrument]
    pub async fn load(journal_dir: &Path) -> Result<Self> {
        let (activities, people, entries, goals) = tokio::try_join!(
            read_records::<ActivityEntity>(journal_dir.join(ACTIVITIES_FILE)),
            read_records::<PersonEntity>(journal_dir.join(PEOPLE_FILE)),
            read_records::<LogEntryEntity>(journal_dir.join(ENTRIES_FILE)),
            read_records::<GoalEntity>(journal_dir.join(GOALS_FILE)),
        )?;

        let activities = activities
            .into_iter()
            .filter_map(|entity| {
                let id = entity.id;
                Activity::try_from(entity)
                    .inspect_err(|e| warn!("Skipping activity {id}: {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();
        // Every kept activity has to reach the root
        let unchecked = ActivityRepository::new(activities.iter().cloned());
        let activities = ActivityRepository::new(activities.into_iter().filter(|activity| {
            match unchecked.ancestry(activity.id()) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Skipping activity {}: {e}", activity.id());
                    false
                }
            }
        }));

        let people: People = people
            .into_iter()
            .map(Person::from)
            .map(|v| (v.id(), v))
            .collect();

        let entries = InMemoryEntrySource::new(
            entries
                .into_iter()
                .map(LogEntry::from)
                .filter(|entry| {
                    let checked = activities.get(entry.activity()).and_then(|_| {
                        if entry.is_finished() {
                            entry.duration().map(|_| ())
                        } else {
                            Ok(())
                        }
                    });
                    match checked {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("Skipping entry {}: {e}", entry.id());
                            false
                        }
                    }
                }),
        );

        let goals = goals
            .into_iter()
            .filter_map(|entity| {
                let interval = entity.interval.clone();
                Goal::try_from(entity)
                    .and_then(|goal| activities.get(goal.activity()).map(|_| goal))
                    .inspect_err(|e| warn!("Skipping goal with interval {interval:?}: {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();

        info!(
            "Loaded {} activities, {} people, {} entries and {} goals",
            activities.cached_len(),
            people.len(),
            entries.entries().len(),
            goals.len()
        );
        Ok(Self::new(activities, people, entries, goals))
    }

    pub fn activities(&self) -> &ActivityRepository {
        &self.activities
    }

    pub fn people(&self) -> &People {
        &self.people
    }

    pub fn entries(&self) -> &InMemoryEntrySource {
        &self.entries
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }
}

/// Reads one JSON value per line. A missing file reads as empty.
async fn read_records<T: DeserializeOwned>(path: PathBuf) -> Result<Vec<T>> {
    async fn extract<T: DeserializeOwned>(path: &Path) -> std::result::Result<Vec<T>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut records = vec![];
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&line) {
                Ok(v) => records.push(v),
                Err(e) => {
                    warn!("During parsing in path {path:?} found illegal json string {line}: {e}")
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(records)
    }

    match extract(&path).await {
        Ok(records) => Ok(records),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
    }
}
