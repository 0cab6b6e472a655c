//! Set differ for plan constraints.
//!
//! Compares two unordered collections of identifiers (URNs, property keys,
//! ignore-changes paths) and reports what was added and removed. Both halves
//! are sorted so messages are identical across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::resource::{PropertyDependencies, PropertyKey};

/// Added and removed members between two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiff {
    /// Members only in the second set, sorted.
    pub added: Vec<String>,
    /// Members only in the first set, sorted.
    pub removed: Vec<String>,
}

impl SetDiff {
    /// Returns true if either half is non-empty.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Returns the diff with added and removed swapped.
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            added: self.removed,
            removed: self.added,
        }
    }
}

impl fmt::Display for SetDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.added.is_empty() {
            write!(f, "added {}", self.added.join(", "))?;
        }
        if !self.removed.is_empty() {
            if !self.added.is_empty() {
                write!(f, "; ")?;
            }
            write!(f, "deleted {}", self.removed.join(", "))?;
        }
        Ok(())
    }
}

/// Diffs `a` against `b`. Duplicates and ordering are ignored.
#[must_use]
pub fn diff_sets<A, B>(a: &[A], b: &[B]) -> SetDiff
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let set_a: BTreeSet<&str> = a.iter().map(AsRef::as_ref).collect();
    let set_b: BTreeSet<&str> = b.iter().map(AsRef::as_ref).collect();

    SetDiff {
        added: set_b.difference(&set_a).map(|s| (*s).to_string()).collect(),
        removed: set_a.difference(&set_b).map(|s| (*s).to_string()).collect(),
    }
}

/// Diffs two collections, returning `None` when they hold the same members.
#[must_use]
pub fn changed_sets<A, B>(a: &[A], b: &[B]) -> Option<SetDiff>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let diff = diff_sets(a, b);
    diff.is_changed().then_some(diff)
}

/// Compares planned property dependencies with the program's.
///
/// Only keys present in both maps are compared: a property that was unknown
/// in the plan may be absent from the program. Keys are visited in order and
/// the first differing key is returned.
#[must_use]
pub fn diff_property_dependencies(
    planned: &PropertyDependencies,
    program: &PropertyDependencies,
) -> Option<(PropertyKey, SetDiff)> {
    planned.iter().find_map(|(key, urns)| {
        program
            .get(key)
            .and_then(|program_urns| changed_sets(urns, program_urns))
            .map(|diff| (key.clone(), diff))
    })
}
