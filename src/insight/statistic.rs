use std::{
    cmp::Reverse,
    collections::{btree_map::Entry, BTreeMap},
    fmt::Debug,
};

use crate::error::{InsightError, InsightResult};

use super::datum::StatisticalDatum;

/// Tells a [Statistic] where a key lives in the hierarchy.
pub trait StatisticRouter<K> {
    /// Keys from the first level below the root down to and including `key`. Every level has to
    /// be present, even if nothing was ever added to it directly.
    fn route(&self, key: &K) -> InsightResult<Vec<K>>;

    fn name_of(&self, key: &K) -> InsightResult<String>;
}

/// A tree of measurements. Each node knows what was added to it directly (`own`) and the sum of
/// its own data and everything below it (`aggregate`).
///
/// Aggregates are updated along the routed path while adding, so
/// `aggregate = own + sum of children aggregates` holds after every insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistic<K, D> {
    key: Option<K>,
    name: String,
    own: D,
    aggregate: D,
    children: BTreeMap<K, Statistic<K, D>>,
}

impl<K: Ord + Clone + Debug, D: StatisticalDatum> Statistic<K, D> {
    /// Creates an empty node. Only a synthetic root should have no key.
    pub fn new(key: Option<K>, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            own: D::zero(),
            aggregate: D::zero(),
            children: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn own(&self) -> &D {
        &self.own
    }

    pub fn aggregate(&self) -> &D {
        &self.aggregate
    }

    pub fn children(&self) -> impl Iterator<Item = &Statistic<K, D>> {
        self.children.values()
    }

    pub fn child(&self, key: &K) -> Option<&Statistic<K, D>> {
        self.children.get(key)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Children ordered by aggregate, largest first. Equal aggregates are ordered by name.
    pub fn sorted_children(&self) -> Vec<&Statistic<K, D>> {
        let mut children = self.children.values().collect::<Vec<_>>();
        children.sort_by_key(|v| (Reverse(v.aggregate.clone()), v.name.clone()));
        children
    }

    /// Adds `datum` to the node keyed by `key`, creating missing nodes on the way.
    pub fn add(
        &mut self,
        key: &K,
        datum: &D,
        router: &impl StatisticRouter<K>,
    ) -> InsightResult<()> {
        if self.key.as_ref() == Some(key) {
            return self.add_along(&[], datum, router);
        }
        let path = router.route(key)?;
        self.add_along(&path, datum, router)
    }

    fn add_along(
        &mut self,
        path: &[K],
        datum: &D,
        router: &impl StatisticRouter<K>,
    ) -> InsightResult<()> {
        self.aggregate = self.aggregate.plus(datum);
        match path.split_first() {
            None => {
                self.own = self.own.plus(datum);
                Ok(())
            }
            Some((next, rest)) => self
                .sub_statistic(next, router)?
                .add_along(rest, datum, router),
        }
    }

    fn sub_statistic(
        &mut self,
        key: &K,
        router: &impl StatisticRouter<K>,
    ) -> InsightResult<&mut Statistic<K, D>> {
        if self.key.as_ref() == Some(key) {
            return Err(InsightError::SelfReference(self.name.clone()));
        }
        match self.children.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let name = router.name_of(key)?;
                Ok(entry.insert(Statistic::new(Some(key.clone()), name)))
            }
        }
    }

    /// Collapses chains for display. A node with exactly one child and nothing of its own is
    /// replaced by its flattened child, every other node keeps its data and flattens its children.
    pub fn flattened(&self) -> Statistic<K, D> {
        if self.children.len() == 1 && self.own.is_zero() {
            if let Some(child) = self.children.values().next() {
                return child.flattened();
            }
        }
        let children = self
            .children
            .values()
            .map(Statistic::flattened)
            .filter_map(|child| child.key.clone().map(|key| (key, child)))
            .collect();
        Statistic {
            key: self.key.clone(),
            name: self.name.clone(),
            own: self.own.clone(),
            aggregate: self.aggregate.clone(),
            children,
        }
    }
}
