//! Deployment plans and plan checking.
//!
//! This module holds the plan data model, the constraint records extracted
//! from resource goals when a plan is built, and the checks that decide
//! whether a later run stays within a plan.

mod checker;
mod differ;
mod goal_plan;
mod plan;

pub use checker::check_missing_plan;
pub use differ::{changed_sets, diff_property_dependencies, diff_sets, SetDiff};
pub use goal_plan::GoalPlan;
pub use plan::{Manifest, Plan, ResourcePlan, StepOp, ENGINE_VERSION};
