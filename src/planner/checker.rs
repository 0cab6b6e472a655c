//! Goal checking against a recorded plan.
//!
//! Given a resource's [`ResourcePlan`], its prior outputs and the goal a
//! program computed for it in the current run, decides whether the run stays
//! within the plan's constraints. Structural options are checked in a fixed
//! order and the first mismatch is returned; property changes are collected
//! and reported together.
//!
//! Checking is pure: nothing here performs I/O or mutates shared state, so
//! resources can be checked concurrently.

use tracing::debug;

use crate::error::{ConstraintViolation, PlanViolation};
use crate::resource::{
    Goal, ObjectDiff, PropertyKey, PropertyMap, ProviderReference, ResourceState, Urn,
};

use super::differ::{changed_sets, diff_property_dependencies};
use super::goal_plan::GoalPlan;
use super::plan::{Plan, ResourcePlan};

type CheckResult = Result<(), ConstraintViolation>;

impl ResourcePlan {
    /// Checks a program goal against this plan.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found, or a single
    /// [`ConstraintViolation::PropertiesChanged`] listing every offending
    /// property.
    ///
    /// # Panics
    ///
    /// Panics if the recorded goal's type or name differs from
    /// `program_goal`'s. The association between a plan entry and its
    /// resource is fixed when the plan is built, so a mismatch means the
    /// caller passed the wrong goal.
    pub fn check_goal(
        &self,
        old_outputs: &PropertyMap,
        new_inputs: &PropertyMap,
        program_goal: &Goal,
    ) -> CheckResult {
        let Some(planned) = &self.goal else {
            return Err(ConstraintViolation::UnexpectedlyNotDeleted);
        };

        assert_eq!(
            planned.resource_type, program_goal.resource_type,
            "plan entry type does not match the goal being checked"
        );
        assert_eq!(
            planned.name, program_goal.name,
            "plan entry name does not match the goal being checked"
        );

        debug!("Checking goal for {} ({})", planned.name, planned.resource_type);

        check_kind(planned, program_goal)?;
        check_provider(planned, program_goal)?;
        check_options(planned, program_goal)?;
        check_timeouts(planned, program_goal)?;
        check_sets(planned, program_goal)?;
        check_properties(planned, old_outputs, new_inputs)?;

        if let Some((key, diff)) = diff_property_dependencies(
            &planned.property_dependencies,
            &program_goal.property_dependencies,
        ) {
            return Err(ConstraintViolation::PropertyDependenciesChanged { key, diff });
        }

        Ok(())
    }
}

/// Checks a resource that has prior state but no plan entry.
///
/// The plan implicitly requires such a resource to stay exactly as it was,
/// so a record allowing no changes is synthesized from the prior state and
/// checked like any other.
///
/// # Errors
///
/// Returns the violation found, as [`ResourcePlan::check_goal`] does, or
/// [`ConstraintViolation::IdentityChanged`] if `program_goal` is not the
/// goal of the resource `old_state` describes.
pub fn check_missing_plan(
    old_state: &ResourceState,
    new_inputs: &PropertyMap,
    program_goal: &Goal,
) -> CheckResult {
    debug!("No plan entry for {}, expecting no changes", old_state.urn);
    check_identity(&old_state.resource_type, old_state.name(), program_goal)?;
    let plan = ResourcePlan::new(Some(GoalPlan::from_state(old_state)), Vec::new());
    plan.check_goal(&old_state.outputs, new_inputs, program_goal)
}

impl Plan {
    /// Checks one resource of a run against the plan.
    ///
    /// Resources with a plan entry are checked against it; resources with
    /// prior state but no entry must not change; new resources the plan does
    /// not know about are rejected.
    ///
    /// Run documents are not trusted to pair a goal with the right entry: a
    /// goal whose type or name differs from the recorded one is reported as
    /// [`ConstraintViolation::IdentityChanged`].
    ///
    /// # Errors
    ///
    /// Returns the violation attributed to `urn`.
    pub fn check_resource(
        &self,
        urn: &Urn,
        old_state: Option<&ResourceState>,
        new_inputs: &PropertyMap,
        program_goal: &Goal,
    ) -> Result<(), PlanViolation> {
        let no_outputs = PropertyMap::new();

        let result = match (self.get(urn), old_state) {
            (Some(plan), _) => plan
                .goal
                .as_ref()
                .map_or(Ok(()), |planned| {
                    check_identity(&planned.resource_type, &planned.name, program_goal)
                })
                .and_then(|()| {
                    let old_outputs = old_state.map_or(&no_outputs, |state| &state.outputs);
                    plan.check_goal(old_outputs, new_inputs, program_goal)
                }),
            (None, Some(state)) => check_missing_plan(state, new_inputs, program_goal),
            (None, None) => Err(ConstraintViolation::NotInPlan),
        };

        result.map_err(|violation| PlanViolation::new(urn.clone(), violation))
    }
}

fn check_identity(expected_type: &str, expected_name: &str, goal: &Goal) -> CheckResult {
    if goal.resource_type == expected_type && goal.name == expected_name {
        return Ok(());
    }

    Err(ConstraintViolation::IdentityChanged {
        expected_type: expected_type.to_string(),
        expected_name: expected_name.to_string(),
        actual_type: goal.resource_type.clone(),
        actual_name: goal.name.clone(),
    })
}

fn check_kind(planned: &GoalPlan, goal: &Goal) -> CheckResult {
    if planned.custom == goal.custom {
        return Ok(());
    }

    let expected = if planned.custom { "custom" } else { "component" };
    Err(ConstraintViolation::KindChanged { expected })
}

/// Provider references may differ only when they name the same provider
/// resource and the plan did not pin its instance ID.
fn check_provider(planned: &GoalPlan, goal: &Goal) -> CheckResult {
    if planned.provider == goal.provider {
        return Ok(());
    }

    let parse = |reference: &str| {
        ProviderReference::parse(reference).map_err(|source| ConstraintViolation::ProviderParse {
            reference: reference.to_string(),
            source,
        })
    };

    let expected = parse(&planned.provider)?;
    let actual = parse(&goal.provider)?;

    if expected.urn() != actual.urn() || !expected.has_unknown_id() {
        return Err(ConstraintViolation::ProviderChanged {
            expected: planned.provider.clone(),
        });
    }

    Ok(())
}

/// Parent, protect, delete-before-replace and import ID.
fn check_options(planned: &GoalPlan, goal: &Goal) -> CheckResult {
    if planned.parent != goal.parent {
        return Err(ConstraintViolation::ParentChanged {
            expected: planned
                .parent
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        });
    }

    if planned.protect != goal.protect {
        return Err(ConstraintViolation::ProtectChanged {
            expected: planned.protect,
        });
    }

    if planned.delete_before_replace != goal.delete_before_replace {
        return Err(ConstraintViolation::DeleteBeforeReplaceChanged {
            expected: planned.delete_before_replace,
        });
    }

    if planned.id != goal.id {
        return Err(ConstraintViolation::ImportIdChanged {
            expected: planned.id.clone(),
        });
    }

    Ok(())
}

fn check_timeouts(planned: &GoalPlan, goal: &Goal) -> CheckResult {
    let expected = &planned.custom_timeouts;
    let actual = &goal.custom_timeouts;

    let mismatch = [
        ("create", expected.create, actual.create),
        ("update", expected.update, actual.update),
        ("delete", expected.delete, actual.delete),
    ]
    .into_iter()
    .find(|(_, expected, actual)| expected != actual);

    match mismatch {
        Some((operation, expected, _)) => {
            Err(ConstraintViolation::TimeoutChanged { operation, expected })
        }
        None => Ok(()),
    }
}

/// Ignore-changes, additional secret outputs, aliases and dependencies.
fn check_sets(planned: &GoalPlan, goal: &Goal) -> CheckResult {
    if let Some(diff) = changed_sets(&planned.ignore_changes, &goal.ignore_changes) {
        return Err(ConstraintViolation::IgnoreChangesChanged { diff });
    }

    if let Some(diff) = changed_sets(
        &planned.additional_secret_outputs,
        &goal.additional_secret_outputs,
    ) {
        return Err(ConstraintViolation::AdditionalSecretOutputsChanged { diff });
    }

    if let Some(diff) = changed_sets(&planned.aliases, &goal.aliases) {
        return Err(ConstraintViolation::AliasesChanged { diff });
    }

    if let Some(diff) = changed_sets(&planned.dependencies, &goal.dependencies) {
        return Err(ConstraintViolation::DependenciesChanged { diff });
    }

    Ok(())
}

fn added(key: &PropertyKey) -> String {
    format!("+{key}")
}

fn deleted(key: &PropertyKey) -> String {
    format!("-{key}")
}

fn changed(key: &PropertyKey) -> String {
    format!("~{key}")
}

/// Reconciles the live property diff with the planned adds, updates and
/// deletes, in both directions.
fn check_properties(
    planned: &GoalPlan,
    old_outputs: &PropertyMap,
    new_inputs: &PropertyMap,
) -> CheckResult {
    let diff = ObjectDiff::compute(old_outputs, new_inputs);
    let mut changes = Vec::new();

    // What the run does must be allowed by the plan.
    for (key, actual) in &diff.adds {
        let allowed = planned
            .adds
            .get(key)
            .is_some_and(|expected| expected.deep_equals_include_unknowns(actual));
        if !allowed {
            changes.push(added(key));
        }
    }

    for key in diff.deletes.keys() {
        if !planned.deletes.contains(key) {
            changes.push(deleted(key));
        }
    }

    // Updating onto a value the plan expected to add is fine, the same way an
    // update may stand in for a create.
    for (key, value) in &diff.updates {
        let allowed = planned
            .updates
            .get(key)
            .or_else(|| planned.adds.get(key))
            .is_some_and(|expected| expected.deep_equals_include_unknowns(&value.new));
        if !allowed {
            changes.push(changed(key));
        }
    }

    // What the plan expects must show up in the run.
    for (key, expected) in &planned.adds {
        if diff.added(key) || diff.updated(key) {
            continue;
        }
        match new_inputs.get(key) {
            Some(actual) if expected.deep_equals_include_unknowns(actual) => {}
            Some(_) => changes.push(changed(key)),
            None => changes.push(deleted(key)),
        }
    }

    for (key, expected) in &planned.updates {
        if diff.updated(key) {
            continue;
        }
        if diff.added(key) {
            changes.push(added(key));
            continue;
        }
        match new_inputs.get(key) {
            Some(actual) if expected.deep_equals_include_unknowns(actual) => {}
            Some(_) => changes.push(changed(key)),
            None => changes.push(deleted(key)),
        }
    }

    for key in &planned.deletes {
        if diff.deleted(key) {
            continue;
        }
        if diff.added(key) {
            changes.push(added(key));
        } else if diff.updated(key) || diff.same(key) {
            changes.push(changed(key));
        }
    }

    if changes.is_empty() {
        return Ok(());
    }

    // Both passes may flag the same key; every tag is kept.
    changes.sort();
    debug!("Property violations for {}: {}", planned.name, changes.join(", "));
    Err(ConstraintViolation::PropertiesChanged { changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigMap;
    use crate::planner::StepOp;
    use crate::resource::{CustomTimeouts, DeleteBeforeReplace, PropertyValue, UNKNOWN_ID};

    const TYPE: &str = "pkg:mod:Res";
    const PROVIDER_URN: &str = "urn:pulumi:dev::proj::pulumi:providers:pkg::default";

    fn props(entries: &[(&str, PropertyValue)]) -> PropertyMap {
        entries
            .iter()
            .map(|(k, v)| (PropertyKey::from(*k), v.clone()))
            .collect()
    }

    fn urn(name: &str) -> Urn {
        Urn::from_parts("dev", "proj", TYPE, name)
    }

    fn goal(properties: PropertyMap) -> Goal {
        Goal::new(TYPE, "web", true, properties)
    }

    /// A plan entry built the same way the planning phase builds one.
    fn planned(old_outputs: &PropertyMap, goal: &Goal) -> ResourcePlan {
        ResourcePlan::new(GoalPlan::from_goal(old_outputs, Some(goal)), vec![StepOp::Update])
    }

    /// A plan entry with explicit property constraints and no options.
    fn constraint(adds: PropertyMap, updates: PropertyMap, deletes: &[&str]) -> ResourcePlan {
        let mut goal_plan =
            GoalPlan::from_goal(&PropertyMap::new(), Some(&goal(PropertyMap::new()))).unwrap();
        goal_plan.adds = adds;
        goal_plan.updates = updates;
        goal_plan.deletes = deletes.iter().map(|k| PropertyKey::from(*k)).collect();
        ResourcePlan::new(Some(goal_plan), vec![StepOp::Update])
    }

    fn check(plan: &ResourcePlan, old: &PropertyMap, new: &PropertyMap) -> CheckResult {
        plan.check_goal(old, new, &goal(new.clone()))
    }

    fn violation_message(result: CheckResult) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_absent_goal_expected_delete() {
        let plan = ResourcePlan::new(None, vec![StepOp::Delete]);
        let result = check(&plan, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(result, Err(ConstraintViolation::UnexpectedlyNotDeleted));
    }

    #[test]
    fn test_planned_goal_is_satisfied_by_itself() {
        let old = props(&[("size", "5".into())]);
        let desired = goal(props(&[("size", "10".into()), ("zone", "a".into())]));
        let plan = planned(&old, &desired);
        assert!(plan.check_goal(&old, &desired.properties, &desired).is_ok());
    }

    #[test]
    fn test_kind_changed() {
        let plan = planned(&PropertyMap::new(), &goal(PropertyMap::new()));
        let mut component = goal(PropertyMap::new());
        component.custom = false;

        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &component);
        assert_eq!(violation_message(result), "resource kind changed (expected custom)");
    }

    #[test]
    #[should_panic(expected = "plan entry type does not match")]
    fn test_mismatched_type_panics() {
        let plan = planned(&PropertyMap::new(), &goal(PropertyMap::new()));
        let other = Goal::new("pkg:mod:Other", "web", true, PropertyMap::new());
        let _ = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &other);
    }

    #[test]
    #[should_panic(expected = "plan entry name does not match")]
    fn test_mismatched_name_panics() {
        let plan = planned(&PropertyMap::new(), &goal(PropertyMap::new()));
        let other = Goal::new(TYPE, "api", true, PropertyMap::new());
        let _ = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &other);
    }

    #[test]
    fn test_provider_with_unknown_planned_id_accepts_any_id() {
        let recorded =
            goal(PropertyMap::new()).with_provider(format!("{PROVIDER_URN}::{UNKNOWN_ID}"));
        let plan = planned(&PropertyMap::new(), &recorded);

        let actual = goal(PropertyMap::new()).with_provider(format!("{PROVIDER_URN}::id-42"));
        assert!(plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &actual).is_ok());
    }

    #[test]
    fn test_provider_changed() {
        let expected = format!("{PROVIDER_URN}::id-1");
        let plan = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new()).with_provider(expected.clone()),
        );

        let other_id = goal(PropertyMap::new()).with_provider(format!("{PROVIDER_URN}::id-2"));
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &other_id);
        assert_eq!(violation_message(result), format!("provider changed (expected {expected})"));

        let other_urn =
            goal(PropertyMap::new()).with_provider(format!("{PROVIDER_URN}2::{UNKNOWN_ID}"));
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &other_urn);
        assert!(matches!(result, Err(ConstraintViolation::ProviderChanged { .. })));
    }

    #[test]
    fn test_provider_parse_failure() {
        let plan = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new()).with_provider(format!("{PROVIDER_URN}::id-1")),
        );
        let bad = goal(PropertyMap::new()).with_provider("garbage");
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &bad);
        assert!(matches!(
            result,
            Err(ConstraintViolation::ProviderParse { reference, .. }) if reference == "garbage"
        ));
    }

    #[test]
    fn test_parent_and_protect_changed() {
        let plan = planned(&PropertyMap::new(), &goal(PropertyMap::new()).with_parent(urn("root")));

        let orphan = goal(PropertyMap::new());
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &orphan);
        assert_eq!(violation_message(result), format!("parent changed (expected {})", urn("root")));

        let protected = goal(PropertyMap::new()).with_parent(urn("root")).with_protect(true);
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &protected);
        assert_eq!(violation_message(result), "protect changed (expected false)");
    }

    #[test]
    fn test_delete_before_replace_tri_state() {
        let unset = planned(&PropertyMap::new(), &goal(PropertyMap::new()));
        let set_true =
            goal(PropertyMap::new()).with_delete_before_replace(DeleteBeforeReplace::True);
        let result = unset.check_goal(&PropertyMap::new(), &PropertyMap::new(), &set_true);
        assert_eq!(violation_message(result), "deleteBeforeReplace changed (expected no value)");

        let planned_false = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new()).with_delete_before_replace(DeleteBeforeReplace::False),
        );
        let result = planned_false.check_goal(&PropertyMap::new(), &PropertyMap::new(), &set_true);
        assert_eq!(violation_message(result), "deleteBeforeReplace changed (expected false)");

        let result = check(&planned_false, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(violation_message(result), "deleteBeforeReplace changed (expected false)");
    }

    #[test]
    fn test_import_id_changed() {
        let plan = planned(&PropertyMap::new(), &goal(PropertyMap::new()).with_import_id("i-123"));
        let result = check(&plan, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(violation_message(result), "importID changed (expected i-123)");
    }

    #[test]
    fn test_first_timeout_mismatch_is_reported() {
        let plan = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new()).with_custom_timeouts(CustomTimeouts::new(10.0, 20.0, 30.0)),
        );
        let actual =
            goal(PropertyMap::new()).with_custom_timeouts(CustomTimeouts::new(10.0, 21.0, 31.0));
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &actual);
        assert_eq!(violation_message(result), "update timeout changed (expected 20)");
    }

    #[test]
    fn test_set_options_changed() {
        let plan = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new())
                .with_ignore_changes(vec![String::from("tags")])
                .with_dependencies(vec![urn("db")]),
        );

        let ignore = goal(PropertyMap::new())
            .with_ignore_changes(vec![String::from("size")])
            .with_dependencies(vec![urn("db")]);
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &ignore);
        assert_eq!(violation_message(result), "ignoreChanges changed: added size; deleted tags");

        let deps = goal(PropertyMap::new())
            .with_ignore_changes(vec![String::from("tags")])
            .with_dependencies(vec![urn("db"), urn("cache")]);
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &deps);
        assert_eq!(
            violation_message(result),
            format!("dependencies changed: added {}", urn("cache"))
        );
    }

    #[test]
    fn test_secret_outputs_and_aliases_changed() {
        let plan = planned(
            &PropertyMap::new(),
            &goal(PropertyMap::new()).with_aliases(vec![urn("old")]),
        );

        let secrets = goal(PropertyMap::new())
            .with_aliases(vec![urn("old")])
            .with_additional_secret_outputs(vec![PropertyKey::from("password")]);
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &secrets);
        assert_eq!(violation_message(result), "additionalSecretOutputs changed: added password");

        let result = check(&plan, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(
            violation_message(result),
            format!("aliases changed: deleted {}", urn("old"))
        );
    }

    #[test]
    fn test_update_satisfied_by_same() {
        let plan = constraint(PropertyMap::new(), props(&[("K", "b".into())]), &[]);
        let old = props(&[("K", "a".into())]);

        assert!(check(&plan, &old, &props(&[("K", "b".into())])).is_ok());

        let result = check(&plan, &old, &props(&[("K", "a".into())]));
        assert_eq!(violation_message(result), "properties changed: ~K");

        // Already at the planned value before the run.
        let old = props(&[("K", "b".into())]);
        assert!(check(&plan, &old, &props(&[("K", "b".into())])).is_ok());
    }

    #[test]
    fn test_update_onto_planned_add() {
        let plan = constraint(props(&[("K", "x".into())]), PropertyMap::new(), &[]);
        let old = props(&[("K", "stale".into())]);

        assert!(check(&plan, &old, &props(&[("K", "x".into())])).is_ok());

        let result = check(&plan, &old, &props(&[("K", "y".into())]));
        assert_eq!(violation_message(result), "properties changed: ~K");
    }

    #[test]
    fn test_planned_add_missing_from_inputs() {
        let plan = constraint(props(&[("K", "x".into())]), PropertyMap::new(), &[]);
        let result = check(&plan, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(violation_message(result), "properties changed: -K");
    }

    #[test]
    fn test_planned_update_materialized_as_add() {
        let plan = constraint(PropertyMap::new(), props(&[("K", "x".into())]), &[]);
        let result = check(&plan, &PropertyMap::new(), &props(&[("K", "x".into())]));
        // Flagged by both the forward and the symmetric pass.
        assert_eq!(violation_message(result), "properties changed: +K, +K");
    }

    #[test]
    fn test_planned_update_missing_from_inputs() {
        let plan = constraint(PropertyMap::new(), props(&[("K", "x".into())]), &[]);
        let result = check(&plan, &PropertyMap::new(), &PropertyMap::new());
        assert_eq!(violation_message(result), "properties changed: -K");
    }

    #[test]
    fn test_deletion_is_strict() {
        let plan = constraint(PropertyMap::new(), PropertyMap::new(), &["K"]);
        let old = props(&[("K", "a".into())]);

        assert!(check(&plan, &old, &PropertyMap::new()).is_ok());

        let result = check(&plan, &old, &props(&[("K", "a".into())]));
        assert_eq!(violation_message(result), "properties changed: ~K");

        let result = check(&plan, &PropertyMap::new(), &props(&[("K", "new".into())]));
        assert_eq!(violation_message(result), "properties changed: +K, +K");

        let result = check(&plan, &old, &props(&[("K", "b".into())]));
        assert_eq!(violation_message(result), "properties changed: ~K, ~K");
    }

    #[test]
    fn test_unplanned_changes() {
        let plan = constraint(PropertyMap::new(), PropertyMap::new(), &[]);
        let old = props(&[("a", "1".into()), ("m", "1".into())]);
        let new = props(&[("m", "2".into()), ("z", "1".into())]);

        let result = check(&plan, &old, &new);
        assert_eq!(violation_message(result), "properties changed: +z, -a, ~m");
    }

    #[test]
    fn test_unknown_plan_values_accept_anything() {
        let plan = constraint(
            props(&[("zone", PropertyValue::Unknown)]),
            props(&[("size", PropertyValue::Unknown)]),
            &[],
        );
        let old = props(&[("size", "5".into())]);

        assert!(check(&plan, &old, &props(&[("size", "7".into()), ("zone", "b".into())])).is_ok());
        assert!(check(&plan, &old, &props(&[("size", "5".into()), ("zone", "c".into())])).is_ok());

        let result = check(&plan, &old, &props(&[("size", "5".into())]));
        assert_eq!(violation_message(result), "properties changed: -zone");
    }

    #[test]
    fn test_added_value_must_match_plan() {
        let plan = constraint(props(&[("K", "x".into())]), PropertyMap::new(), &[]);
        let result = check(&plan, &PropertyMap::new(), &props(&[("K", "y".into())]));
        assert_eq!(violation_message(result), "properties changed: +K");
    }

    #[test]
    fn test_property_dependencies() {
        let recorded = goal(PropertyMap::new())
            .with_property_dependencies(PropertyKey::from("size"), vec![urn("db")]);
        let plan = planned(&PropertyMap::new(), &recorded);

        // Omitting the key is tolerated.
        assert!(check(&plan, &PropertyMap::new(), &PropertyMap::new()).is_ok());

        let changed = goal(PropertyMap::new())
            .with_property_dependencies(PropertyKey::from("size"), vec![urn("cache")]);
        let result = plan.check_goal(&PropertyMap::new(), &PropertyMap::new(), &changed);
        assert_eq!(
            violation_message(result),
            format!(
                "dependencies for size changed: added {}; deleted {}",
                urn("cache"),
                urn("db")
            )
        );
    }

    #[test]
    fn test_structural_violation_wins_over_properties() {
        let plan = constraint(PropertyMap::new(), PropertyMap::new(), &[]);
        let changed = goal(props(&[("a", "1".into())])).with_protect(true);
        let result = plan.check_goal(&PropertyMap::new(), &changed.properties, &changed);
        assert_eq!(result, Err(ConstraintViolation::ProtectChanged { expected: false }));
    }

    #[test]
    fn test_missing_plan_requires_no_changes() {
        let state = ResourceState::new(TYPE, urn("web"), true, props(&[("A", "1".into())]));

        let same = props(&[("A", "1".into())]);
        assert!(check_missing_plan(&state, &same, &goal(same.clone())).is_ok());

        let changed = props(&[("A", "2".into())]);
        let result = check_missing_plan(&state, &changed, &goal(changed.clone()));
        assert_eq!(violation_message(result), "properties changed: ~A");
    }

    #[test]
    fn test_missing_plan_copies_options() {
        let state =
            ResourceState::new(TYPE, urn("web"), true, PropertyMap::new()).with_protect(true);
        let result = check_missing_plan(&state, &PropertyMap::new(), &goal(PropertyMap::new()));
        assert_eq!(violation_message(result), "protect changed (expected true)");
    }

    #[test]
    fn test_end_to_end_unknown_provider_id() {
        let recorded = goal(PropertyMap::new()).with_provider(format!("urn::ref::{UNKNOWN_ID}"));
        let mut goal_plan = GoalPlan::from_goal(&PropertyMap::new(), Some(&recorded)).unwrap();
        goal_plan.updates = props(&[("size", "10".into())]);
        let plan = ResourcePlan::new(Some(goal_plan), vec![StepOp::Update]);

        let old = props(&[("size", "5".into())]);
        let program = goal(props(&[("size", "10".into())])).with_provider("urn::ref::concrete-id");
        assert!(plan.check_goal(&old, &program.properties, &program).is_ok());
    }

    #[test]
    fn test_plan_check_resource_dispatch() {
        let mut plan = Plan::new(ConfigMap::new());
        let desired = goal(props(&[("size", "1".into())]));
        plan.insert(urn("web"), planned(&PropertyMap::new(), &desired));

        assert!(plan.check_resource(&urn("web"), None, &desired.properties, &desired).is_ok());

        let stranger = Goal::new(TYPE, "api", true, PropertyMap::new());
        let err = plan
            .check_resource(&urn("api"), None, &PropertyMap::new(), &stranger)
            .unwrap_err();
        assert_eq!(err.violation, ConstraintViolation::NotInPlan);
        assert_eq!(err.urn, urn("api"));

        let state = ResourceState::new(TYPE, urn("api"), true, props(&[("x", "1".into())]));
        let drifted = props(&[("x", "2".into())]);
        let err = plan
            .check_resource(&urn("api"), Some(&state), &drifted, &stranger)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("resource {} violates plan: properties changed: ~x", urn("api"))
        );
    }

    #[test]
    fn test_check_resource_reports_identity_change() {
        let mut plan = Plan::new(ConfigMap::new());
        plan.insert(urn("web"), planned(&PropertyMap::new(), &goal(PropertyMap::new())));

        let renamed = Goal::new(TYPE, "api", true, PropertyMap::new());
        let err = plan
            .check_resource(&urn("web"), None, &PropertyMap::new(), &renamed)
            .unwrap_err();
        assert_eq!(err.urn, urn("web"));
        assert_eq!(
            err.violation.to_string(),
            "resource identity changed (expected pkg:mod:Res web, got pkg:mod:Res api)"
        );

        let state = ResourceState::new("pkg:mod:Other", urn("db"), true, PropertyMap::new());
        let retyped = Goal::new(TYPE, "db", true, PropertyMap::new());
        let err = plan
            .check_resource(&urn("db"), Some(&state), &PropertyMap::new(), &retyped)
            .unwrap_err();
        assert_eq!(
            err.violation,
            ConstraintViolation::IdentityChanged {
                expected_type: String::from("pkg:mod:Other"),
                expected_name: String::from("db"),
                actual_type: String::from(TYPE),
                actual_name: String::from("db"),
            }
        );
    }

    #[test]
    fn test_identity_not_checked_for_planned_deletion() {
        let mut plan = Plan::new(ConfigMap::new());
        plan.insert(urn("old"), ResourcePlan::new(None, vec![StepOp::Delete]));

        let other = Goal::new("pkg:mod:Other", "renamed", true, PropertyMap::new());
        let err = plan
            .check_resource(&urn("old"), None, &PropertyMap::new(), &other)
            .unwrap_err();
        assert_eq!(err.violation, ConstraintViolation::UnexpectedlyNotDeleted);
    }

    #[test]
    fn test_checks_run_concurrently() {
        let old = props(&[("size", "5".into())]);
        let desired = goal(props(&[("size", "10".into())]));
        let plan = planned(&old, &desired);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| plan.check_goal(&old, &desired.properties, &desired)))
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });
    }
}
