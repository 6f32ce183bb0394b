//! Statistics built from log entries: time per activity (rolled up along the activity tree) and
//! time spent with people.

use tracing::{instrument, trace};

use crate::{
    error::InsightResult,
    model::{
        activity::{ActivityId, ActivityRepository, ROOT_NAME},
        entry::LogEntry,
        person::{person_name, People, PersonId},
    },
};

use super::{
    datum::DurationDatum,
    statistic::{Statistic, StatisticRouter},
};

pub type ActivityStatistic = Statistic<ActivityId, DurationDatum>;

pub type PersonStatistic = Statistic<PersonId, DurationDatum>;

pub const PEOPLE_STATISTIC_NAME: &str = "People";

struct ActivityRouter<'a>(&'a ActivityRepository);

impl StatisticRouter<ActivityId> for ActivityRouter<'_> {
    fn route(&self, key: &ActivityId) -> InsightResult<Vec<ActivityId>> {
        let mut ancestry = self.0.ancestry(*key)?;
        // The root activity is the root of the statistic
        ancestry.remove(0);
        Ok(ancestry)
    }

    fn name_of(&self, key: &ActivityId) -> InsightResult<String> {
        Ok(self.0.get(*key)?.name().to_string())
    }
}

struct PersonRouter<'a>(&'a People);

impl StatisticRouter<PersonId> for PersonRouter<'_> {
    fn route(&self, key: &PersonId) -> InsightResult<Vec<PersonId>> {
        Ok(vec![*key])
    }

    fn name_of(&self, key: &PersonId) -> InsightResult<String> {
        Ok(person_name(self.0, *key))
    }
}

/// Builds time per activity under a root named [ROOT_NAME]. Unfinished entries are skipped.
#[instrument(skip_all)]
pub fn activity_statistic<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
    activities: &ActivityRepository,
) -> InsightResult<ActivityStatistic> {
    let mut statistic = Statistic::new(Some(ActivityId::ROOT), ROOT_NAME.to_string());
    let router = ActivityRouter(activities);
    for entry in entries {
        if !entry.is_finished() {
            trace!("Skipping unfinished entry {}", entry.id());
            continue;
        }
        statistic.add(&entry.activity(), &DurationDatum::of(entry)?, &router)?;
    }
    Ok(statistic)
}

/// Builds time spent with each person. An entry shared by several people counts for each of them.
#[instrument(skip_all)]
pub fn person_statistic<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
    people: &People,
) -> InsightResult<PersonStatistic> {
    let mut statistic = Statistic::new(None, PEOPLE_STATISTIC_NAME);
    let router = PersonRouter(people);
    for entry in entries.into_iter().filter(|v| v.is_finished()) {
        let datum = DurationDatum::of(entry)?;
        for person in entry.persons() {
            statistic.add(person, &datum, &router)?;
        }
    }
    Ok(statistic)
}
