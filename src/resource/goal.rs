//! Resource goals: the desired state a program computes for a resource.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::property::{PropertyKey, PropertyMap};
use super::urn::Urn;

/// Per-property dependency sets.
pub type PropertyDependencies = BTreeMap<PropertyKey, Vec<Urn>>;

/// Per-operation timeouts, in seconds. Zero means "provider default".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomTimeouts {
    /// Create timeout.
    #[serde(default)]
    pub create: f64,
    /// Update timeout.
    #[serde(default)]
    pub update: f64,
    /// Delete timeout.
    #[serde(default)]
    pub delete: f64,
}

impl CustomTimeouts {
    /// Creates a set of timeouts.
    #[must_use]
    pub const fn new(create: f64, update: f64, delete: f64) -> Self {
        Self {
            create,
            update,
            delete,
        }
    }
}

/// Whether a replacement deletes the old resource before creating the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum DeleteBeforeReplace {
    /// No explicit choice.
    #[default]
    Unset,
    /// Delete first.
    True,
    /// Create first.
    False,
}

impl From<Option<bool>> for DeleteBeforeReplace {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::True,
            Some(false) => Self::False,
        }
    }
}

impl From<DeleteBeforeReplace> for Option<bool> {
    fn from(value: DeleteBeforeReplace) -> Self {
        match value {
            DeleteBeforeReplace::Unset => None,
            DeleteBeforeReplace::True => Some(true),
            DeleteBeforeReplace::False => Some(false),
        }
    }
}

impl fmt::Display for DeleteBeforeReplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unset => "no value",
            Self::True => "true",
            Self::False => "false",
        };
        write!(f, "{s}")
    }
}

/// Desired state for a resource as computed by the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Resource type token.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource name.
    pub name: String,
    /// True if managed by a provider plugin, false for a component.
    pub custom: bool,
    /// Input properties.
    #[serde(default)]
    pub properties: PropertyMap,
    /// Parent resource, if any.
    #[serde(default)]
    pub parent: Option<Urn>,
    /// Protect the resource from deletion.
    #[serde(default)]
    pub protect: bool,
    /// Resources this resource depends on.
    #[serde(default)]
    pub dependencies: Vec<Urn>,
    /// Provider reference, empty for components.
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
    /// ID to import, empty if not importing.
    #[serde(default)]
    pub id: String,
    /// Per-operation timeouts.
    #[serde(default)]
    pub custom_timeouts: CustomTimeouts,
}

impl Goal {
    /// Creates a goal with the given identity and properties and default
    /// options.
    #[must_use]
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        custom: bool,
        properties: PropertyMap,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            custom,
            properties,
            parent: None,
            protect: false,
            dependencies: Vec::new(),
            provider: String::new(),
            property_dependencies: PropertyDependencies::new(),
            delete_before_replace: DeleteBeforeReplace::Unset,
            ignore_changes: Vec::new(),
            additional_secret_outputs: Vec::new(),
            aliases: Vec::new(),
            id: String::new(),
            custom_timeouts: CustomTimeouts::default(),
        }
    }

    /// Sets the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: Urn) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the protect flag.
    #[must_use]
    pub const fn with_protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Urn>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the provider reference.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sets the dependencies of a single property.
    #[must_use]
    pub fn with_property_dependencies(mut self, key: PropertyKey, urns: Vec<Urn>) -> Self {
        self.property_dependencies.insert(key, urns);
        self
    }

    /// Sets the delete-before-replace option.
    #[must_use]
    pub const fn with_delete_before_replace(mut self, dbr: DeleteBeforeReplace) -> Self {
        self.delete_before_replace = dbr;
        self
    }

    /// Sets the ignore-changes list.
    #[must_use]
    pub fn with_ignore_changes(mut self, ignore_changes: Vec<String>) -> Self {
        self.ignore_changes = ignore_changes;
        self
    }

    /// Sets the additional secret outputs.
    #[must_use]
    pub fn with_additional_secret_outputs(mut self, keys: Vec<PropertyKey>) -> Self {
        self.additional_secret_outputs = keys;
        self
    }

    /// Sets the aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<Urn>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Sets the import ID.
    #[must_use]
    pub fn with_import_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the custom timeouts.
    #[must_use]
    pub const fn with_custom_timeouts(mut self, timeouts: CustomTimeouts) -> Self {
        self.custom_timeouts = timeouts;
        self
    }
}
