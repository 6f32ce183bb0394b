use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt::Display,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{InsightError, InsightResult};

pub const DEFAULT_COLOR: &str = "#e6e6e6";

/// Name used for the root activity when none is provided.
pub const ROOT_NAME: &str = "Activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u32);

impl ActivityId {
    pub const ROOT: ActivityId = ActivityId(0);
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the activity tree. Only the root (id 0) has no parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    id: ActivityId,
    parent: Option<ActivityId>,
    name: Arc<str>,
    color: Arc<str>,
    points_per_minute: f64,
}

impl Activity {
    pub fn root(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: ActivityId::ROOT,
            parent: None,
            name: name.into(),
            color: DEFAULT_COLOR.into(),
            points_per_minute: 1.,
        }
    }

    /// Creates a non root activity. Passing the root id yields the root, which never has a parent.
    pub fn new(id: ActivityId, parent: ActivityId, name: impl Into<Arc<str>>) -> InsightResult<Self> {
        if id == ActivityId::ROOT {
            return Ok(Self::root(name));
        }
        if id == parent {
            return Err(InsightError::SelfParent(id));
        }
        Ok(Self {
            id,
            parent: Some(parent),
            name: name.into(),
            color: DEFAULT_COLOR.into(),
            points_per_minute: 1.,
        })
    }

    pub fn with_color(self, color: impl Into<Arc<str>>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    pub fn with_points_per_minute(self, points_per_minute: f64) -> Self {
        Self {
            points_per_minute,
            ..self
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn parent(&self) -> Option<ActivityId> {
        self.parent
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn points_per_minute(&self) -> f64 {
        self.points_per_minute
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Source consulted by [ActivityRepository] when an activity isn't cached yet.
pub trait ActivityLoader {
    fn load(&self, id: ActivityId) -> Option<Activity>;
}

/// Explicit replacement for a process wide activity cache. Activities are looked up in the cache
/// first and loaded through the optional [ActivityLoader] on a miss. Once loaded an activity stays
/// cached for the lifetime of the repository.
pub struct ActivityRepository {
    cache: RefCell<HashMap<ActivityId, Activity>>,
    loader: Option<Box<dyn ActivityLoader>>,
}

impl ActivityRepository {
    /// Creates a repository holding exactly `activities`. A default root is added when missing.
    pub fn new(activities: impl IntoIterator<Item = Activity>) -> Self {
        let mut cache: HashMap<_, _> = activities.into_iter().map(|v| (v.id(), v)).collect();
        cache
            .entry(ActivityId::ROOT)
            .or_insert_with(|| Activity::root(ROOT_NAME));
        Self {
            cache: RefCell::new(cache),
            loader: None,
        }
    }

    pub fn with_loader(loader: impl ActivityLoader + 'static) -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn insert(&self, activity: Activity) {
        self.cache.borrow_mut().insert(activity.id(), activity);
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn get(&self, id: ActivityId) -> InsightResult<Activity> {
        if let Some(activity) = self.cache.borrow().get(&id) {
            return Ok(activity.clone());
        }
        let loaded = self
            .loader
            .as_ref()
            .and_then(|loader| loader.load(id))
            .ok_or(InsightError::UnknownActivity(id))?;
        trace!("Loaded activity {id} on demand");
        self.insert(loaded.clone());
        Ok(loaded)
    }

    pub fn parent_of(&self, id: ActivityId) -> InsightResult<Option<ActivityId>> {
        Ok(self.get(id)?.parent())
    }

    /// Returns the chain of activities from the root down to `id` (both inclusive).
    pub fn ancestry(&self, id: ActivityId) -> InsightResult<Vec<ActivityId>> {
        let mut chain = vec![id];
        let mut visited = HashSet::from([id]);
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent() {
            if !visited.insert(parent) {
                return Err(InsightError::ActivityCycle(parent));
            }
            chain.push(parent);
            current = self.get(parent)?;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Distance from the root. The root itself has depth 0.
    pub fn depth(&self, id: ActivityId) -> InsightResult<usize> {
        Ok(self.ancestry(id)?.len() - 1)
    }

    /// Reflexive and transitive ancestor test: `activity` is an instance of `ancestor` when they
    /// are the same activity or `ancestor` lies on the path from `activity` to the root.
    pub fn instance_of(&self, activity: ActivityId, ancestor: ActivityId) -> InsightResult<bool> {
        if activity == ancestor {
            return Ok(true);
        }
        Ok(self.ancestry(activity)?.contains(&ancestor))
    }
}
