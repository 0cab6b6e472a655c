//! Whole-run verification against a plan.
//!
//! A [`RunSnapshot`] records, for every resource a run registered, its prior
//! state, the inputs and goal the program produced and the step operation
//! the engine generated. [`PlanVerifier`] checks each of them against the
//! plan, then looks for planned work the run never did.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{ConstraintViolation, PlanViolation};
use crate::planner::{Plan, ResourcePlan, StepOp};
use crate::resource::{Goal, PropertyMap, ResourceState, Urn};

/// Everything a run did, resource by resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Resources registered or touched by the run.
    #[serde(default)]
    pub resources: Vec<ResourceRun>,
}

/// One resource as seen by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRun {
    /// Resource URN.
    pub urn: Urn,
    /// State before the run, if the resource existed.
    #[serde(default)]
    pub old_state: Option<ResourceState>,
    /// Inputs after provider checks.
    #[serde(default)]
    pub inputs: PropertyMap,
    /// Goal registered by the program, absent for resources the run deleted.
    #[serde(default)]
    pub goal: Option<Goal>,
    /// Step operation the engine generated.
    #[serde(default)]
    pub op: Option<StepOp>,
}

impl RunSnapshot {
    /// URNs of resources that existed before the run.
    #[must_use]
    pub fn existing_urns(&self) -> BTreeSet<Urn> {
        self.resources
            .iter()
            .filter_map(|run| run.old_state.as_ref().map(|state| state.urn.clone()))
            .collect()
    }

    /// Returns true if the run touched `urn`.
    #[must_use]
    pub fn contains(&self, urn: &Urn) -> bool {
        self.resources.iter().any(|run| &run.urn == urn)
    }
}

/// Outcome of verifying a run.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    /// Number of resources checked.
    pub checked: usize,
    /// Violations, sorted by URN.
    pub violations: Vec<PlanViolation>,
    /// `(referencing, referenced)` pairs that resolve neither to a planned
    /// resource nor to a resource that existed before the run.
    pub unresolved: Vec<(Urn, Urn)>,
}

impl VerificationReport {
    /// Returns true if no resource violated the plan.
    #[must_use]
    pub const fn is_conforming(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns true if any reference could not be resolved.
    #[must_use]
    pub const fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// URNs with at least one violation.
    #[must_use]
    pub fn violating_urns(&self) -> BTreeSet<&Urn> {
        self.violations.iter().map(|v| &v.urn).collect()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_conforming() {
            writeln!(f, "Run conforms to plan ({} resources checked)", self.checked)?;
        } else {
            writeln!(
                f,
                "Run violates plan ({} of {} resources):",
                self.violating_urns().len(),
                self.checked
            )?;
            for violation in &self.violations {
                writeln!(f, "  - {violation}")?;
            }
        }

        for (from, to) in &self.unresolved {
            writeln!(f, "  ! {from} references unknown resource {to}")?;
        }

        Ok(())
    }
}

/// Checks runs against a plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanVerifier<'a> {
    plan: &'a Plan,
}

impl<'a> PlanVerifier<'a> {
    /// Creates a verifier for `plan`.
    #[must_use]
    pub const fn new(plan: &'a Plan) -> Self {
        Self { plan }
    }

    /// Verifies every resource of `snapshot`, then reports planned
    /// resources the run never touched.
    #[must_use]
    pub fn verify(&self, snapshot: &RunSnapshot) -> VerificationReport {
        info!(
            "Verifying {} resources against a plan of {}",
            snapshot.resources.len(),
            self.plan.len()
        );

        let mut violations: Vec<PlanViolation> = snapshot
            .resources
            .iter()
            .flat_map(|run| self.check_run(run))
            .collect();

        violations.extend(self.missing_operations(snapshot));
        violations.sort_by(|a, b| a.urn.cmp(&b.urn));

        for violation in &violations {
            warn!("{violation}");
        }

        let unresolved = self.plan.unresolved_references(&snapshot.existing_urns());
        for (from, to) in &unresolved {
            warn!("{from} references {to}, which is neither planned nor existing");
        }

        let report = VerificationReport {
            checked: snapshot.resources.len(),
            violations,
            unresolved,
        };

        if report.is_conforming() {
            info!("Run conforms to plan");
        } else {
            info!("Run violates plan: {} violations", report.violations.len());
        }

        report
    }

    /// Checks a single resource: its goal first, then its operation.
    ///
    /// Each call is independent of the others, so resources can be checked
    /// in any order or in parallel. A goal that names some other resource
    /// than its plan entry or prior state is reported, never trusted.
    #[must_use]
    pub fn check_run(&self, run: &ResourceRun) -> Vec<PlanViolation> {
        debug!("Checking {}", run.urn);
        let mut violations = Vec::new();

        if let Some(goal) = &run.goal
            && let Err(violation) =
                self.plan
                    .check_resource(&run.urn, run.old_state.as_ref(), &run.inputs, goal)
        {
            violations.push(violation);
        }

        if let Some(op) = run.op
            && let Err(violation) = self.check_op(&run.urn, op)
        {
            violations.push(PlanViolation::new(run.urn.clone(), violation));
        }

        violations
    }

    /// Resources without a plan entry may only be left alone.
    fn check_op(&self, urn: &Urn, op: StepOp) -> Result<(), ConstraintViolation> {
        match self.plan.get(urn) {
            Some(plan) => plan.check_op(op),
            None => ResourcePlan::new(None, vec![StepOp::Same]).check_op(op),
        }
    }

    fn missing_operations(&self, snapshot: &RunSnapshot) -> Vec<PlanViolation> {
        self.plan
            .resource_plans
            .iter()
            .filter(|(urn, plan)| plan.expects_operations() && !snapshot.contains(urn))
            .map(|(urn, _)| {
                PlanViolation::new(urn.clone(), ConstraintViolation::NoOperationsGenerated)
            })
            .collect()
    }
}
