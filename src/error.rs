//! Error types for plan constraint checking.
//!
//! This module provides the error hierarchy for every stage of a check run:
//! configuration, plan/run document loading, provider reference parsing,
//! and the constraint violations reported by the goal checker.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::path::PathBuf;
use thiserror::Error;

use crate::planner::{SetDiff, StepOp};
use crate::resource::{DeleteBeforeReplace, PropertyKey, Urn};

/// The main error type for the plan checker.
#[derive(Debug, Error)]
pub enum PlanCheckError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan or run document errors.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Provider reference errors.
    #[error("Provider reference error: {0}")]
    Provider(#[from] ProviderRefError),

    /// A resource does not conform to the plan.
    #[error(transparent)]
    Violation(#[from] PlanViolation),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file was not found.
    #[error("Settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The settings file could not be parsed.
    #[error("Failed to parse settings: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A setting has an invalid value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Setting that failed validation.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

/// Errors raised while loading or writing plan and run documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document was not found.
    #[error("Document not found: {path}")]
    NotFound {
        /// Path to the missing document.
        path: PathBuf,
    },

    /// The file extension is not a supported format.
    #[error("Unsupported document format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat {
        /// Path of the rejected document.
        path: PathBuf,
    },

    /// The document could not be decoded.
    #[error("Failed to parse {location}: {message}")]
    Parse {
        /// Where the document came from.
        location: String,
        /// Description of the parse error.
        message: String,
    },

    /// The document could not be encoded.
    #[error("Failed to serialize document: {message}")]
    Serialize {
        /// Description of the serialization error.
        message: String,
    },
}

/// Errors raised when a provider reference string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderRefError {
    /// The reference string was empty.
    #[error("provider reference is empty")]
    Empty,

    /// The `::` separator between URN and ID is missing.
    #[error("expected '<urn>::<id>' in provider reference '{reference}'")]
    MissingSeparator {
        /// The offending reference.
        reference: String,
    },

    /// The URN part is empty or not a URN.
    #[error("invalid provider URN '{urn}'")]
    InvalidUrn {
        /// The offending URN text.
        urn: String,
    },

    /// The ID part is empty.
    #[error("provider reference '{reference}' has an empty ID")]
    EmptyId {
        /// The offending reference.
        reference: String,
    },
}

/// A single way in which a resource's goal or operation departs from its plan.
///
/// Structural variants are reported one at a time; all property-level changes
/// are collected into [`ConstraintViolation::PropertiesChanged`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintViolation {
    /// The plan expected the resource to be deleted.
    #[error("resource unexpectedly not deleted")]
    UnexpectedlyNotDeleted,

    /// The goal names a different resource than the one the plan entry or
    /// prior state was recorded for.
    #[error(
        "resource identity changed (expected {expected_type} {expected_name}, \
         got {actual_type} {actual_name})"
    )]
    IdentityChanged {
        /// Recorded resource type.
        expected_type: String,
        /// Recorded resource name.
        expected_name: String,
        /// Type carried by the goal.
        actual_type: String,
        /// Name carried by the goal.
        actual_name: String,
    },

    /// Custom vs. component kind differs.
    #[error("resource kind changed (expected {expected})")]
    KindChanged {
        /// `custom` or `component`.
        expected: &'static str,
    },

    /// A provider reference could not be parsed.
    #[error("failed to parse provider reference {reference}: {source}")]
    ProviderParse {
        /// The reference that failed to parse.
        reference: String,
        /// Why it failed.
        source: ProviderRefError,
    },

    /// The provider differs from the planned one.
    #[error("provider changed (expected {expected})")]
    ProviderChanged {
        /// Planned provider reference.
        expected: String,
    },

    /// The parent differs from the planned one.
    #[error("parent changed (expected {expected})")]
    ParentChanged {
        /// Planned parent URN, empty for none.
        expected: String,
    },

    /// The protect flag differs.
    #[error("protect changed (expected {expected})")]
    ProtectChanged {
        /// Planned protect flag.
        expected: bool,
    },

    /// The delete-before-replace option differs.
    #[error("deleteBeforeReplace changed (expected {expected})")]
    DeleteBeforeReplaceChanged {
        /// Planned tri-state value.
        expected: DeleteBeforeReplace,
    },

    /// The import ID differs.
    #[error("importID changed (expected {expected})")]
    ImportIdChanged {
        /// Planned import ID, empty for none.
        expected: String,
    },

    /// A custom timeout differs.
    #[error("{operation} timeout changed (expected {expected})")]
    TimeoutChanged {
        /// `create`, `update` or `delete`.
        operation: &'static str,
        /// Planned timeout in seconds.
        expected: f64,
    },

    /// The ignore-changes list differs.
    #[error("ignoreChanges changed: {diff}")]
    IgnoreChangesChanged {
        /// Added and removed entries.
        diff: SetDiff,
    },

    /// The additional secret outputs differ.
    #[error("additionalSecretOutputs changed: {diff}")]
    AdditionalSecretOutputsChanged {
        /// Added and removed entries.
        diff: SetDiff,
    },

    /// The alias set differs.
    #[error("aliases changed: {diff}")]
    AliasesChanged {
        /// Added and removed entries.
        diff: SetDiff,
    },

    /// The dependency set differs.
    #[error("dependencies changed: {diff}")]
    DependenciesChanged {
        /// Added and removed entries.
        diff: SetDiff,
    },

    /// One or more properties changed outside the plan's constraints.
    #[error("properties changed: {}", .changes.join(", "))]
    PropertiesChanged {
        /// Sorted `+key`, `-key` and `~key` tags.
        changes: Vec<String>,
    },

    /// The dependencies of a single property differ.
    #[error("dependencies for {key} changed: {diff}")]
    PropertyDependenciesChanged {
        /// Property whose dependencies changed.
        key: PropertyKey,
        /// Added and removed entries.
        diff: SetDiff,
    },

    /// The step operation is not one the plan allows.
    #[error("operation {actual} not allowed (expected {expected})")]
    OperationNotAllowed {
        /// Operation that was generated.
        actual: StepOp,
        /// Comma-separated planned operations.
        expected: String,
    },

    /// A new resource appeared that the plan knows nothing about.
    #[error("resource not in plan")]
    NotInPlan,

    /// The plan recorded operations for a resource the run never touched.
    #[error("expected resource operations but none were generated")]
    NoOperationsGenerated,
}

/// A constraint violation attributed to a specific resource.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("resource {urn} violates plan: {violation}")]
pub struct PlanViolation {
    /// Resource that violated its plan.
    pub urn: Urn,
    /// What went wrong.
    #[source]
    pub violation: ConstraintViolation,
}

/// Result type alias for plan checker operations.
pub type Result<T> = std::result::Result<T, PlanCheckError>;

impl PlanCheckError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error reports a plan violation rather than a
    /// failure of the checker itself.
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }
}

impl ConfigError {
    /// Creates an invalid value error for a specific setting.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl DocumentError {
    /// Creates a parse error for the given location.
    #[must_use]
    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl PlanViolation {
    /// Attributes a violation to a resource.
    #[must_use]
    pub const fn new(urn: Urn, violation: ConstraintViolation) -> Self {
        Self { urn, violation }
    }
}

impl Serialize for PlanViolation {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("PlanViolation", 2)?;
        state.serialize_field("urn", &self.urn)?;
        state.serialize_field("violation", &self.violation.to_string())?;
        state.end()
    }
}
