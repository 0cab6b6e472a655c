// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Deploy Plan Check
//!
//! Constraint checking of infrastructure deployments against a previously
//! recorded plan.
//!
//! ## Overview
//!
//! A deployment engine can record a [`planner::Plan`] during a preview: for
//! every resource, the operations it expects and a constraint record of the
//! goal it expects the program to produce. A later run can then be checked
//! against that plan, so that what gets applied is what was reviewed.
//!
//! Plans are constraints, not scripts:
//!
//! - Unknown planned values accept any concrete value
//! - A `same` may stand in for an `update`, and an `update` for a replacement
//! - Resource options (provider, parent, protect, timeouts...) must match
//!
//! ## Modules
//!
//! - [`resource`]: Property values, goals, resource state and URNs
//! - [`planner`]: Plans, constraint records and the goal checker
//! - [`verifier`]: Whole-run verification against a plan
//! - [`config`]: Settings, stack configuration and document loading
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use deploy_plan_check::config::ConfigMap;
//! use deploy_plan_check::planner::{GoalPlan, Plan, ResourcePlan, StepOp};
//! use deploy_plan_check::resource::{Goal, PropertyKey, PropertyMap, ResourceState, Urn};
//!
//! let urn = Urn::from_parts("dev", "proj", "pkg:mod:Bucket", "logs");
//! let mut old = PropertyMap::new();
//! old.insert(PropertyKey::from("size"), "5".into());
//! let mut new = PropertyMap::new();
//! new.insert(PropertyKey::from("size"), "10".into());
//!
//! let goal = Goal::new("pkg:mod:Bucket", "logs", true, new.clone());
//! let mut plan = Plan::new(ConfigMap::new());
//! plan.insert(
//!     urn.clone(),
//!     ResourcePlan::new(GoalPlan::from_goal(&old, Some(&goal)), vec![StepOp::Update]),
//! );
//!
//! let state = ResourceState::new("pkg:mod:Bucket", urn.clone(), true, old);
//! assert!(plan.check_resource(&urn, Some(&state), &new, &goal).is_ok());
//!
//! let mut drifted = PropertyMap::new();
//! drifted.insert(PropertyKey::from("size"), "20".into());
//! let drifted_goal = Goal::new("pkg:mod:Bucket", "logs", true, drifted.clone());
//! let err = plan.check_resource(&urn, Some(&state), &drifted, &drifted_goal).unwrap_err();
//! assert!(err.to_string().ends_with("properties changed: ~size"));
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod resource;
pub mod verifier;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigMap, OutputFormat, Settings};
pub use error::{ConstraintViolation, PlanCheckError, PlanViolation, Result};
pub use planner::{GoalPlan, Plan, ResourcePlan, StepOp};
pub use resource::{Goal, PropertyMap, PropertyValue, ResourceState, Urn};
pub use verifier::{PlanVerifier, RunSnapshot, VerificationReport};
