//! Constraint records for single resources.
//!
//! A [`GoalPlan`] is a frozen copy of the transition a plan allows for one
//! resource: the properties it may add, update or delete, plus resource
//! options that must match exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resource::{
    CustomTimeouts, DeleteBeforeReplace, Goal, ObjectDiff, PropertyDependencies, PropertyKey,
    PropertyMap, ResourceState, Urn,
};

/// Allowed state transition for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    /// Resource type token.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource name.
    pub name: String,
    /// True if managed by a provider plugin.
    pub custom: bool,
    /// Properties expected to be added, with their allowed values.
    #[serde(default)]
    pub adds: PropertyMap,
    /// Properties expected to be removed.
    #[serde(default)]
    pub deletes: Vec<PropertyKey>,
    /// Properties expected to change, with their allowed new values.
    #[serde(default)]
    pub updates: PropertyMap,
    /// Parent resource, if any.
    #[serde(default)]
    pub parent: Option<Urn>,
    /// Protect flag.
    #[serde(default)]
    pub protect: bool,
    /// Resources this resource depends on.
    #[serde(default)]
    pub dependencies: Vec<Urn>,
    /// Provider reference.
    #[serde(default)]
    pub provider: String,
    /// Dependencies of individual properties.
    #[serde(default)]
    pub property_dependencies: PropertyDependencies,
    /// Delete-before-replace option.
    #[serde(default)]
    pub delete_before_replace: DeleteBeforeReplace,
    /// Property names never diffed.
    #[serde(default)]
    pub ignore_changes: Vec<String>,
    /// Outputs always treated as secret.
    #[serde(default)]
    pub additional_secret_outputs: Vec<PropertyKey>,
    /// Other URNs this resource may be known as.
    #[serde(default)]
    pub aliases: Vec<Urn>,
    /// Expected import ID, empty if not importing.
    #[serde(default)]
    pub id: String,
    /// Per-operation timeouts.
    #[serde(default)]
    pub custom_timeouts: CustomTimeouts,
}

impl GoalPlan {
    /// Extracts the constraint record for `goal` given the resource's prior
    /// outputs.
    ///
    /// Returns `None` for an absent goal, meaning the resource is expected to
    /// be deleted.
    #[must_use]
    pub fn from_goal(old_outputs: &PropertyMap, goal: Option<&Goal>) -> Option<Self> {
        let goal = goal?;

        let diff = ObjectDiff::include_unknowns(old_outputs, &goal.properties);
        let (adds, deletes, updates) = match diff {
            Some(diff) => {
                debug!(
                    "Planned {} adds, {} deletes, {} updates for {}",
                    diff.adds.len(),
                    diff.deletes.len(),
                    diff.updates.len(),
                    goal.name
                );
                let updates = diff
                    .updates
                    .into_iter()
                    .map(|(key, value)| (key, value.new))
                    .collect();
                (diff.adds, diff.deletes.into_keys().collect(), updates)
            }
            None => (PropertyMap::new(), Vec::new(), PropertyMap::new()),
        };

        Some(Self {
            resource_type: goal.resource_type.clone(),
            name: goal.name.clone(),
            custom: goal.custom,
            adds,
            deletes,
            updates,
            parent: goal.parent.clone(),
            protect: goal.protect,
            dependencies: goal.dependencies.clone(),
            provider: goal.provider.clone(),
            property_dependencies: goal.property_dependencies.clone(),
            delete_before_replace: goal.delete_before_replace,
            ignore_changes: goal.ignore_changes.clone(),
            additional_secret_outputs: goal.additional_secret_outputs.clone(),
            aliases: goal.aliases.clone(),
            id: goal.id.clone(),
            custom_timeouts: goal.custom_timeouts,
        })
    }

    /// Synthesizes a record that allows no changes to a resource with no
    /// plan entry.
    ///
    /// Options are copied from the prior state; ignore-changes,
    /// delete-before-replace and the import ID are left empty.
    #[must_use]
    pub fn from_state(state: &ResourceState) -> Self {
        Self {
            resource_type: state.resource_type.clone(),
            name: state.name().to_string(),
            custom: state.custom,
            adds: PropertyMap::new(),
            deletes: Vec::new(),
            updates: PropertyMap::new(),
            parent: state.parent.clone(),
            protect: state.protect,
            dependencies: state.dependencies.clone(),
            provider: state.provider.clone(),
            property_dependencies: state.property_dependencies.clone(),
            delete_before_replace: DeleteBeforeReplace::Unset,
            ignore_changes: Vec::new(),
            additional_secret_outputs: state.additional_secret_outputs.clone(),
            aliases: state.aliases.clone(),
            id: String::new(),
            custom_timeouts: state.custom_timeouts,
        }
    }

    /// Returns true if no property changes are allowed.
    #[must_use]
    pub fn expects_no_property_changes(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty() && self.updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PropertyValue;

    fn props(entries: &[(&str, PropertyValue)]) -> PropertyMap {
        entries
            .iter()
            .map(|(k, v)| (PropertyKey::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_absent_goal_means_delete() {
        assert!(GoalPlan::from_goal(&PropertyMap::new(), None).is_none());
    }

    #[test]
    fn test_no_diff_yields_empty_constraints() {
        let outputs = props(&[("size", "5".into())]);
        let goal = Goal::new("pkg:mod:Res", "web", true, outputs.clone()).with_protect(true);

        let plan = GoalPlan::from_goal(&outputs, Some(&goal)).unwrap();
        assert!(plan.expects_no_property_changes());
        assert!(plan.protect);
        assert_eq!(plan.resource_type, "pkg:mod:Res");
    }

    #[test]
    fn test_diff_is_copied_into_constraints() {
        let old = props(&[("size", "5".into()), ("legacy", "x".into())]);
        let goal = Goal::new(
            "pkg:mod:Res",
            "web",
            true,
            props(&[("size", "10".into()), ("zone", PropertyValue::Unknown)]),
        )
        .with_dependencies(vec![Urn::from("urn:pulumi:dev::proj::pkg:mod:Net::net")]);

        let plan = GoalPlan::from_goal(&old, Some(&goal)).unwrap();
        assert_eq!(plan.adds, props(&[("zone", PropertyValue::Unknown)]));
        assert_eq!(plan.updates, props(&[("size", "10".into())]));
        assert_eq!(plan.deletes, vec![PropertyKey::from("legacy")]);
        assert_eq!(plan.dependencies, goal.dependencies);
    }

    #[test]
    fn test_from_state_copies_options() {
        let urn = Urn::from_parts("dev", "proj", "pkg:mod:Res", "web");
        let state = ResourceState::new("pkg:mod:Res", urn, true, props(&[("a", "1".into())]))
            .with_protect(true)
            .with_provider("urn:pulumi:dev::proj::pulumi:providers:pkg::default::id-1");

        let plan = GoalPlan::from_state(&state);
        assert_eq!(plan.name, "web");
        assert!(plan.protect);
        assert_eq!(plan.provider, state.provider);
        assert!(plan.expects_no_property_changes());
        assert_eq!(plan.delete_before_replace, DeleteBeforeReplace::Unset);
    }
}
