use crate::shared::monster::{MonsterType, MAX_TYPES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Type filter of the gallery, at most two types.
///
/// Kept as a sorted set so the same selection always serializes the same way,
/// whatever order the types were picked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeFilter(BTreeSet<MonsterType>);

impl TypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `monster_type`, or deselect it if already selected.
    ///
    /// Returns whether the filter changed; selecting a third type does not.
    pub fn toggle(&mut self, monster_type: MonsterType) -> bool {
        if self.0.remove(&monster_type) {
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.0.insert(monster_type)
    }

    pub fn contains(&self, monster_type: MonsterType) -> bool {
        self.0.contains(&monster_type)
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_TYPES
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = MonsterType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MonsterType> for TypeFilter {
    /// Keeps the first two distinct types
    fn from_iter<I: IntoIterator<Item = MonsterType>>(iter: I) -> Self {
        let mut filter = Self::new();
        for monster_type in iter {
            if !filter.contains(monster_type) {
                filter.toggle(monster_type);
            }
        }
        filter
    }
}
