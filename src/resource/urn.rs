//! Resource URNs and provider references.
//!
//! A URN names a resource uniquely within a deployment:
//! `urn:pulumi:<stack>::<project>::<qualified type>::<name>`. A provider
//! reference joins a provider resource's URN and its instance ID with `::`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProviderRefError;

use super::property::UNKNOWN_SENTINEL;

/// Separator between URN components.
const URN_DELIMITER: &str = "::";

/// Provider ID used when the provider instance is not yet known.
pub const UNKNOWN_ID: &str = UNKNOWN_SENTINEL;

/// Unique resource name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Creates a URN from its string form.
    #[must_use]
    pub fn new(urn: impl Into<String>) -> Self {
        Self(urn.into())
    }

    /// Builds a URN from its components.
    #[must_use]
    pub fn from_parts(stack: &str, project: &str, qualified_type: &str, name: &str) -> Self {
        Self(format!("urn:pulumi:{stack}::{project}::{qualified_type}::{name}"))
    }

    /// Returns the URN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty URN.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this looks like a URN.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.starts_with("urn:") && self.0.contains(URN_DELIMITER)
    }

    /// Returns the resource name, the last `::` component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0
            .rsplit_once(URN_DELIMITER)
            .map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Returns the resource type, the last `$`-separated segment of the
    /// qualified type component.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        let qualified = self
            .0
            .rsplit_once(URN_DELIMITER)
            .and_then(|(head, _)| head.rsplit_once(URN_DELIMITER))
            .map_or("", |(_, qualified)| qualified);
        qualified.rsplit('$').next().unwrap_or(qualified)
    }
}

impl From<&str> for Urn {
    fn from(urn: &str) -> Self {
        Self(urn.to_string())
    }
}

impl From<String> for Urn {
    fn from(urn: String) -> Self {
        Self(urn)
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed provider reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReference {
    urn: Urn,
    id: String,
}

impl ProviderReference {
    /// Creates a provider reference.
    #[must_use]
    pub fn new(urn: Urn, id: impl Into<String>) -> Self {
        Self { urn, id: id.into() }
    }

    /// Parses `<urn>::<id>`, splitting at the last separator.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, lacks a separator, or has an
    /// invalid URN or an empty ID.
    pub fn parse(reference: &str) -> std::result::Result<Self, ProviderRefError> {
        if reference.is_empty() {
            return Err(ProviderRefError::Empty);
        }

        let (urn, id) = reference.rsplit_once(URN_DELIMITER).ok_or_else(|| {
            ProviderRefError::MissingSeparator {
                reference: reference.to_string(),
            }
        })?;

        let urn = Urn::from(urn);
        if !urn.is_valid() {
            return Err(ProviderRefError::InvalidUrn {
                urn: urn.to_string(),
            });
        }
        if id.is_empty() {
            return Err(ProviderRefError::EmptyId {
                reference: reference.to_string(),
            });
        }

        Ok(Self::new(urn, id))
    }

    /// Returns the provider resource's URN.
    #[must_use]
    pub const fn urn(&self) -> &Urn {
        &self.urn
    }

    /// Returns the provider instance ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if the instance ID is the unknown sentinel.
    #[must_use]
    pub fn has_unknown_id(&self) -> bool {
        self.id == UNKNOWN_ID
    }
}

impl fmt::Display for ProviderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{URN_DELIMITER}{}", self.urn, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RES_URN: &str = "urn:pulumi:dev::proj::parent$pkg:mod:Res::web";

    #[test]
    fn test_urn_components() {
        let urn = Urn::from(RES_URN);
        assert_eq!(urn.name(), "web");
        assert_eq!(urn.resource_type(), "pkg:mod:Res");
        assert!(urn.is_valid());
    }

    #[test]
    fn test_from_parts() {
        let urn = Urn::from_parts("dev", "proj", "pkg:mod:Res", "web");
        assert_eq!(urn.as_str(), "urn:pulumi:dev::proj::pkg:mod:Res::web");
        assert_eq!(urn.resource_type(), "pkg:mod:Res");
    }

    #[test]
    fn test_parse_provider_reference() {
        let text = "urn:pulumi:dev::proj::pulumi:providers:aws::default::abc-123";
        let reference = ProviderReference::parse(text).unwrap();
        assert_eq!(
            reference.urn().as_str(),
            "urn:pulumi:dev::proj::pulumi:providers:aws::default"
        );
        assert_eq!(reference.id(), "abc-123");
        assert!(!reference.has_unknown_id());
        assert_eq!(reference.to_string(), text);
    }

    #[test]
    fn test_parse_unknown_id() {
        let text = format!("urn::ref::{UNKNOWN_ID}");
        let reference = ProviderReference::parse(&text).unwrap();
        assert_eq!(reference.urn().as_str(), "urn::ref");
        assert!(reference.has_unknown_id());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ProviderReference::parse(""), Err(ProviderRefError::Empty));
        assert!(matches!(
            ProviderReference::parse("no-separator"),
            Err(ProviderRefError::MissingSeparator { .. })
        ));
        assert!(matches!(
            ProviderReference::parse("notaurn::id"),
            Err(ProviderRefError::InvalidUrn { .. })
        ));
        assert!(matches!(
            ProviderReference::parse("urn:pulumi:dev::proj::t::n::"),
            Err(ProviderRefError::EmptyId { .. })
        ));
    }
}
