use std::{collections::HashMap, fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u32);

impl Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Someone time can be spent with. The points factor scales the points of every entry the person
/// is associated with.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    id: PersonId,
    name: Arc<str>,
    points_factor: f64,
}

impl Person {
    pub fn new(id: PersonId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
            points_factor: 1.,
        }
    }

    pub fn with_points_factor(self, points_factor: f64) -> Self {
        Self {
            points_factor,
            ..self
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn points_factor(&self) -> f64 {
        self.points_factor
    }
}

pub type People = HashMap<PersonId, Person>;

/// Name of a person or its id when the person is unknown.
pub fn person_name(people: &People, id: PersonId) -> String {
    people
        .get(&id)
        .map(|v| v.name().to_string())
        .unwrap_or_else(|| id.to_string())
}
