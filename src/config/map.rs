//! Stack configuration captured in a plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    /// The value, or its ciphertext when secret.
    pub value: String,
    /// True if the value is secret.
    #[serde(default)]
    pub secret: bool,
}

impl ConfigValue {
    /// Creates a plain value.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: false,
        }
    }

    /// Creates a secret value.
    #[must_use]
    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: true,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            write!(f, "[secret]")
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Configuration keyed by `namespace:key`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, ConfigValue>);

impl ConfigMap {
    /// Creates an empty configuration map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets `namespace:key`, returning the previous value.
    pub fn insert(
        &mut self,
        namespace: &str,
        key: &str,
        value: ConfigValue,
    ) -> Option<ConfigValue> {
        self.0.insert(format!("{namespace}:{key}"), value)
    }

    /// Gets `namespace:key`.
    #[must_use]
    pub fn get(&self, namespace: &str, key: &str) -> Option<&ConfigValue> {
        self.0.get(&format!("{namespace}:{key}"))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over full keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of secret entries.
    #[must_use]
    pub fn secret_count(&self) -> usize {
        self.0.values().filter(|v| v.secret).count()
    }
}
