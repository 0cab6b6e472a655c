//! Deployment plan types.
//!
//! A [`Plan`] maps every resource URN to a [`ResourcePlan`]: the constraint
//! record for the resource's goal and the ordered operations expected to be
//! applied to it. Inputs and operations are constraints, not an exact script:
//! unknown planned values accept any value, a `same` may stand in for an
//! `update` or a replacement, and an `update` may stand in for a replacement.
//! Resource options must match exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::ConfigMap;
use crate::error::ConstraintViolation;
use crate::resource::{PropertyMap, Urn};

use super::goal_plan::GoalPlan;

/// Version recorded in new plan manifests.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A complete deployment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Per-resource plans keyed by URN.
    #[serde(default)]
    pub resource_plans: BTreeMap<Urn, ResourcePlan>,
    /// Plan metadata.
    pub manifest: Manifest,
    /// Environment variables captured when the plan was created. Values are
    /// encrypted.
    #[serde(default, with = "hex_map")]
    pub environment_variables: BTreeMap<String, Vec<u8>>,
    /// Configuration in effect when the plan was created.
    #[serde(default)]
    pub config: ConfigMap,
}

/// Plan metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the plan was created.
    pub time: DateTime<Utc>,
    /// Engine version that created the plan.
    pub version: String,
    /// Integrity marker derived from the version and creation time.
    pub magic: String,
}

/// Planned goal and operations for a single resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourcePlan {
    /// Constraint record, or `None` if the resource is expected to be
    /// deleted.
    #[serde(default)]
    pub goal: Option<GoalPlan>,
    /// Expected operations, in order.
    #[serde(default)]
    pub ops: Vec<StepOp>,
    /// Expected outputs once the operations are applied.
    #[serde(default)]
    pub outputs: PropertyMap,
}

/// Kinds of resource step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOp {
    /// Nothing to do.
    Same,
    /// Create a new resource.
    Create,
    /// Update a resource in place.
    Update,
    /// Delete a resource.
    Delete,
    /// Replace a resource.
    Replace,
    /// Create the replacement of a resource.
    CreateReplacement,
    /// Delete a replaced resource.
    DeleteReplaced,
    /// Read an external resource.
    Read,
    /// Replace a read resource.
    ReadReplacement,
    /// Refresh a resource.
    Refresh,
    /// Discard a replaced resource without deleting it.
    DiscardReplaced,
    /// Remove a resource pending replacement.
    RemovePendingReplace,
    /// Import an existing resource.
    Import,
    /// Replace an imported resource.
    ImportReplacement,
}

impl Plan {
    /// Creates an empty plan with a fresh manifest.
    #[must_use]
    pub fn new(config: ConfigMap) -> Self {
        Self {
            resource_plans: BTreeMap::new(),
            manifest: Manifest::new(ENGINE_VERSION),
            environment_variables: BTreeMap::new(),
            config,
        }
    }

    /// Records the plan for a resource, returning any plan it replaces.
    pub fn insert(&mut self, urn: Urn, plan: ResourcePlan) -> Option<ResourcePlan> {
        self.resource_plans.insert(urn, plan)
    }

    /// Gets the plan for a resource.
    #[must_use]
    pub fn get(&self, urn: &Urn) -> Option<&ResourcePlan> {
        self.resource_plans.get(urn)
    }

    /// Returns all planned URNs in sorted order.
    #[must_use]
    pub fn urns(&self) -> Vec<&Urn> {
        self.resource_plans.keys().collect()
    }

    /// Returns the number of planned resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resource_plans.len()
    }

    /// Returns true if no resources are planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_plans.is_empty()
    }

    /// Finds references from planned goals (parent, dependencies, property
    /// dependencies) that resolve neither to a planned resource nor to one of
    /// the `existing` resources.
    ///
    /// Returns sorted, deduplicated `(referencing, referenced)` pairs.
    #[must_use]
    pub fn unresolved_references(&self, existing: &BTreeSet<Urn>) -> Vec<(Urn, Urn)> {
        let mut missing = BTreeSet::new();

        for (urn, plan) in &self.resource_plans {
            let Some(goal) = &plan.goal else {
                continue;
            };

            let referenced = goal
                .parent
                .iter()
                .chain(&goal.dependencies)
                .chain(goal.property_dependencies.values().flatten());

            for target in referenced {
                if !self.resource_plans.contains_key(target) && !existing.contains(target) {
                    missing.insert((urn.clone(), target.clone()));
                }
            }
        }

        missing.into_iter().collect()
    }
}

impl Manifest {
    /// Creates a manifest stamped with the current time.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self::at(version, Utc::now())
    }

    /// Creates a manifest for a specific creation time.
    #[must_use]
    pub fn at(version: impl Into<String>, time: DateTime<Utc>) -> Self {
        let version = version.into();
        let magic = Self::compute_magic(&version, &time);
        Self {
            time,
            version,
            magic,
        }
    }

    /// Computes the integrity marker for a version and creation time.
    #[must_use]
    pub fn compute_magic(version: &str, time: &DateTime<Utc>) -> String {
        if version.is_empty() {
            return String::new();
        }

        let mut hasher = Sha256::new();
        hasher.update(version.as_bytes());
        hasher.update(time.to_rfc3339().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if the stored marker matches the manifest's content.
    #[must_use]
    pub fn verify(&self) -> bool {
        hashes_match(&self.magic, &Self::compute_magic(&self.version, &self.time))
    }
}

/// Compares two hashes without short-circuiting on the first difference.
fn hashes_match(hash1: &str, hash2: &str) -> bool {
    if hash1.len() != hash2.len() {
        return false;
    }

    hash1
        .bytes()
        .zip(hash2.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

impl ResourcePlan {
    /// Creates a resource plan.
    #[must_use]
    pub const fn new(goal: Option<GoalPlan>, ops: Vec<StepOp>) -> Self {
        Self {
            goal,
            ops,
            outputs: PropertyMap::new(),
        }
    }

    /// Sets the expected outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: PropertyMap) -> Self {
        self.outputs = outputs;
        self
    }

    /// Returns true if the plan expects the resource to be deleted.
    #[must_use]
    pub const fn expects_delete(&self) -> bool {
        self.goal.is_none()
    }

    /// Returns true if any planned operation requires the resource to be
    /// touched by a run (anything but a deletion).
    #[must_use]
    pub fn expects_operations(&self) -> bool {
        self.ops.iter().any(|op| !op.is_delete_family())
    }

    /// Checks that `actual` is a planned operation or a lesser substitute
    /// for one: `same` for an update or replacement, `update` for a
    /// replacement.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintViolation::OperationNotAllowed`] otherwise.
    pub fn check_op(&self, actual: StepOp) -> Result<(), ConstraintViolation> {
        let allowed = self.ops.iter().any(|&planned| match actual {
            _ if planned == actual => true,
            StepOp::Same => planned == StepOp::Update || planned.is_replace_family(),
            StepOp::Update => planned.is_replace_family(),
            _ => false,
        });

        if allowed {
            return Ok(());
        }

        Err(ConstraintViolation::OperationNotAllowed {
            actual,
            expected: self.ops_display(),
        })
    }

    /// Returns the planned operations joined with commas.
    #[must_use]
    pub fn ops_display(&self) -> String {
        if self.ops.is_empty() {
            return String::from("none");
        }
        self.ops
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl StepOp {
    /// Returns true for operations that replace a resource.
    #[must_use]
    pub const fn is_replace_family(self) -> bool {
        matches!(
            self,
            Self::Replace | Self::CreateReplacement | Self::DeleteReplaced
        )
    }

    /// Returns true for operations that remove a resource.
    #[must_use]
    pub const fn is_delete_family(self) -> bool {
        matches!(
            self,
            Self::Delete | Self::DeleteReplaced | Self::DiscardReplaced | Self::RemovePendingReplace
        )
    }
}

impl fmt::Display for StepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Same => "same",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::CreateReplacement => "create-replacement",
            Self::DeleteReplaced => "delete-replaced",
            Self::Read => "read",
            Self::ReadReplacement => "read-replacement",
            Self::Refresh => "refresh",
            Self::DiscardReplaced => "discard-replaced",
            Self::RemovePendingReplace => "remove-pending-replace",
            Self::Import => "import",
            Self::ImportReplacement => "import-replacement",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resource_plans.is_empty() {
            return write!(f, "No resources planned");
        }

        writeln!(f, "Plan ({} resources):", self.resource_plans.len())?;
        for (urn, plan) in &self.resource_plans {
            writeln!(f, "  {urn}: {}", plan.ops_display())?;
        }
        Ok(())
    }
}

/// Serde helper storing byte blobs as hex strings.
mod hex_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: BTreeMap<&str, String> = map
            .iter()
            .map(|(k, v)| (k.as_str(), hex::encode(v)))
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(k, v)| {
                hex::decode(&v)
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
