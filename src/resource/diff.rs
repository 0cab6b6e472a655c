//! Property map diffing.
//!
//! Computes the added, deleted, updated and unchanged keys between an old and
//! a new [`PropertyMap`]. Unknown values are compared as ordinary data here:
//! replacing a concrete value with an unknown one is an update.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::property::{PropertyKey, PropertyMap, PropertyValue};

/// Old and new value of an updated property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDiff {
    /// Value before the change.
    pub old: PropertyValue,
    /// Value after the change.
    pub new: PropertyValue,
}

/// Difference between two property maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDiff {
    /// Properties present only in the new map, with their new values.
    pub adds: PropertyMap,
    /// Properties removed from the old map, with their old values.
    pub deletes: PropertyMap,
    /// Properties whose value changed.
    pub updates: BTreeMap<PropertyKey, ValueDiff>,
    /// Properties whose value is unchanged.
    pub sames: PropertyMap,
}

impl ObjectDiff {
    /// Diffs `old` against `new`, including unknown values in the comparison.
    ///
    /// Returns `None` when nothing was added, deleted or updated.
    #[must_use]
    pub fn include_unknowns(old: &PropertyMap, new: &PropertyMap) -> Option<Self> {
        let diff = Self::compute(old, new);
        diff.any_changes().then_some(diff)
    }

    /// Diffs `old` against `new` like [`ObjectDiff::include_unknowns`], but
    /// always returns the partition, so unchanged keys are available even
    /// when nothing changed.
    #[must_use]
    pub fn compute(old: &PropertyMap, new: &PropertyMap) -> Self {
        let mut diff = Self::default();

        for (key, old_value) in old {
            match new.get(key) {
                Some(new_value) if old_value != new_value => {
                    if !old_value.has_value() {
                        diff.adds.insert(key.clone(), new_value.clone());
                    } else if !new_value.has_value() {
                        diff.deletes.insert(key.clone(), old_value.clone());
                    } else {
                        diff.updates.insert(
                            key.clone(),
                            ValueDiff {
                                old: old_value.clone(),
                                new: new_value.clone(),
                            },
                        );
                    }
                }
                Some(_) => {
                    diff.sames.insert(key.clone(), old_value.clone());
                }
                None if old_value.has_value() => {
                    diff.deletes.insert(key.clone(), old_value.clone());
                }
                None => {}
            }
        }

        for (key, new_value) in new {
            if !old.contains_key(key) && new_value.has_value() {
                diff.adds.insert(key.clone(), new_value.clone());
            }
        }

        diff
    }

    /// Returns true if anything was added, deleted or updated.
    #[must_use]
    pub fn any_changes(&self) -> bool {
        !self.adds.is_empty() || !self.deletes.is_empty() || !self.updates.is_empty()
    }

    /// Returns true if `key` was added.
    #[must_use]
    pub fn added(&self, key: &PropertyKey) -> bool {
        self.adds.contains_key(key)
    }

    /// Returns true if `key` was deleted.
    #[must_use]
    pub fn deleted(&self, key: &PropertyKey) -> bool {
        self.deletes.contains_key(key)
    }

    /// Returns true if `key` was updated.
    #[must_use]
    pub fn updated(&self, key: &PropertyKey) -> bool {
        self.updates.contains_key(key)
    }

    /// Returns true if `key` is unchanged.
    #[must_use]
    pub fn same(&self, key: &PropertyKey) -> bool {
        self.sames.contains_key(key)
    }
}
