//! Recorded resource state from a previous deployment.

use serde::{Deserialize, Serialize};

use super::goal::{CustomTimeouts, PropertyDependencies};
use super::property::{PropertyKey, PropertyMap};
use super::urn::Urn;

/// The last recorded state of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    /// Resource type token.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Unique resource name.
    pub urn: Urn,
    /// True if managed by a provider plugin.
    pub custom: bool,
    /// Provider-assigned ID.
    #[serde(default)]
    pub id: String,
    /// Inputs recorded at the last deployment.
    #[serde(default)]
    pub inputs: PropertyMap,
    /// Outputs recorded at the last deployment.
    #[serde(default)]
    pub outputs: PropertyMap,
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
    /// Outputs always treated as secret.
    #[serde(default)]
    pub additional_secret_outputs: Vec<PropertyKey>,
    /// Other URNs this resource may be known as.
    #[serde(default)]
    pub aliases: Vec<Urn>,
    /// Per-operation timeouts.
    #[serde(default)]
    pub custom_timeouts: CustomTimeouts,
}

impl ResourceState {
    /// Creates a state with the given identity and outputs and default
    /// options.
    #[must_use]
    pub fn new(
        resource_type: impl Into<String>,
        urn: Urn,
        custom: bool,
        outputs: PropertyMap,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            urn,
            custom,
            id: String::new(),
            inputs: outputs.clone(),
            outputs,
            parent: None,
            protect: false,
            dependencies: Vec::new(),
            provider: String::new(),
            property_dependencies: PropertyDependencies::new(),
            additional_secret_outputs: Vec::new(),
            aliases: Vec::new(),
            custom_timeouts: CustomTimeouts::default(),
        }
    }

    /// Returns the resource name from the URN.
    #[must_use]
    pub fn name(&self) -> &str {
        self.urn.name()
    }

    /// Sets the provider reference.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Urn>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the protect flag.
    #[must_use]
    pub const fn with_protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }
}
