//! Property values and property maps.
//!
//! Resource inputs and outputs are trees of [`PropertyValue`]s keyed by
//! [`PropertyKey`]. Two markers need care: [`PropertyValue::Unknown`] is a
//! placeholder for a value that will only be known at apply time, and
//! [`PropertyValue::Secret`] wraps a sensitive value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Wire form of an unknown value.
pub const UNKNOWN_SENTINEL: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Signature key marking a specially encoded object.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature value identifying a secret.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Name of a single resource property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyKey(String);

impl PropertyKey {
    /// Creates a property key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for PropertyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    /// Absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    Array(Vec<PropertyValue>),
    /// A nested property map.
    Object(PropertyMap),
    /// A value that must be treated as sensitive.
    Secret(Box<PropertyValue>),
    /// A value that is not known until apply time.
    Unknown,
}

/// An ordered map of property keys to values.
pub type PropertyMap = BTreeMap<PropertyKey, PropertyValue>;

impl PropertyValue {
    /// Creates a string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Wraps a value as a secret.
    #[must_use]
    pub fn secret(value: Self) -> Self {
        Self::Secret(Box::new(value))
    }

    /// Returns false only for [`PropertyValue::Null`].
    #[must_use]
    pub const fn has_value(&self) -> bool {
        !matches!(self, Self::Null)
    }

    /// Returns true for [`PropertyValue::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true for [`PropertyValue::Secret`].
    #[must_use]
    pub const fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }

    /// Compares two values, treating an unknown on either side as matching
    /// anything, including absence.
    #[must_use]
    pub fn deep_equals_include_unknowns(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, _) | (_, Self::Unknown) => true,
            (Self::Secret(a), Self::Secret(b)) => a.deep_equals_include_unknowns(b),
            (Self::Secret(_), _) | (_, Self::Secret(_)) => false,
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| x.deep_equals_include_unknowns(y))
            }
            (Self::Object(a), Self::Object(b)) => map_deep_equals_include_unknowns(a, b),
            (a, b) => a == b,
        }
    }
}

/// Compares two property maps key by key over the union of their keys. A key
/// missing on one side compares as [`PropertyValue::Null`].
#[must_use]
pub fn map_deep_equals_include_unknowns(a: &PropertyMap, b: &PropertyMap) -> bool {
    let null = PropertyValue::Null;
    a.iter()
        .all(|(k, v)| v.deep_equals_include_unknowns(b.get(k).unwrap_or(&null)))
        && b.iter()
            .filter(|(k, _)| !a.contains_key(*k))
            .all(|(_, v)| null.deep_equals_include_unknowns(v))
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) if s == UNKNOWN_SENTINEL => Self::Unknown,
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(mut fields) => {
                let is_secret = fields
                    .get(SIG_KEY)
                    .and_then(Value::as_str)
                    .is_some_and(|sig| sig == SECRET_SIG);
                if is_secret {
                    let inner = fields.remove("value").unwrap_or(Value::Null);
                    return Self::secret(Self::from(inner));
                }
                Self::Object(
                    fields
                        .into_iter()
                        .map(|(k, v)| (PropertyKey::from(k), Self::from(v)))
                        .collect(),
                )
            }
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Self::Null,
            PropertyValue::Bool(b) => Self::Bool(b),
            PropertyValue::Number(n) => Number::from_f64(n).map_or(Self::Null, Self::Number),
            PropertyValue::String(s) => Self::String(s),
            PropertyValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            PropertyValue::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.0, Self::from(v)))
                    .collect(),
            ),
            PropertyValue::Secret(inner) => {
                let mut fields = Map::new();
                fields.insert(SIG_KEY.to_string(), Self::String(SECRET_SIG.to_string()));
                fields.insert(String::from("value"), Self::from(*inner));
                Self::Object(fields)
            }
            PropertyValue::Unknown => Self::String(UNKNOWN_SENTINEL.to_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => write!(f, "[{} items]", items.len()),
            Self::Object(fields) => write!(f, "{{{} fields}}", fields.len()),
            Self::Secret(_) => write!(f, "[secret]"),
            Self::Unknown => write!(f, "[unknown]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn object(entries: &[(&str, PropertyValue)]) -> PropertyValue {
        PropertyValue::Object(
            entries
                .iter()
                .map(|(k, v)| (PropertyKey::from(*k), v.clone()))
                .collect(),
        )
    }

    fn arb_value() -> impl Strategy<Value = PropertyValue> {
        let leaf = prop_oneof![
            Just(PropertyValue::Null),
            Just(PropertyValue::Unknown),
            any::<bool>().prop_map(PropertyValue::Bool),
            (-1000i32..1000).prop_map(|n| PropertyValue::Number(f64::from(n))),
            "[a-z]{0,6}".prop_map(PropertyValue::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(PropertyValue::Array),
                inner.clone().prop_map(PropertyValue::secret),
                prop::collection::btree_map("[a-c]", inner, 0..3).prop_map(|m| {
                    PropertyValue::Object(
                        m.into_iter().map(|(k, v)| (PropertyKey::from(k), v)).collect(),
                    )
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_unknown_matches_any_value(v in arb_value()) {
            prop_assert!(PropertyValue::Unknown.deep_equals_include_unknowns(&v));
            prop_assert!(v.deep_equals_include_unknowns(&PropertyValue::Unknown));
        }

        #[test]
        fn test_deep_equality_is_reflexive(v in arb_value()) {
            prop_assert!(v.deep_equals_include_unknowns(&v));
        }
    }

    #[test]
    fn test_nested_unknown_matches() {
        let planned = object(&[("size", PropertyValue::Unknown), ("name", "a".into())]);
        let actual = object(&[("size", 10.0.into()), ("name", "a".into())]);
        assert!(planned.deep_equals_include_unknowns(&actual));

        let other = object(&[("size", 10.0.into()), ("name", "b".into())]);
        assert!(!planned.deep_equals_include_unknowns(&other));
    }

    #[test]
    fn test_unknown_field_matches_absent_field() {
        let planned = object(&[("size", PropertyValue::Unknown)]);
        let actual = object(&[]);
        assert!(planned.deep_equals_include_unknowns(&actual));
        assert!(actual.deep_equals_include_unknowns(&planned));
    }

    #[test]
    fn test_extra_field_is_not_equal() {
        let a = object(&[("x", "1".into())]);
        let b = object(&[("x", "1".into()), ("y", "2".into())]);
        assert!(!a.deep_equals_include_unknowns(&b));
        assert!(!b.deep_equals_include_unknowns(&a));
    }

    #[test]
    fn test_secret_only_equals_secret() {
        let plain = PropertyValue::from("hunter2");
        let secret = PropertyValue::secret(plain.clone());
        assert!(!secret.deep_equals_include_unknowns(&plain));
        assert!(secret.deep_equals_include_unknowns(&PropertyValue::secret("hunter2".into())));
    }

    #[test]
    fn test_array_length_matters() {
        let a = PropertyValue::Array(vec!["x".into()]);
        let b = PropertyValue::Array(vec!["x".into(), "y".into()]);
        assert!(!a.deep_equals_include_unknowns(&b));
    }

    #[test]
    fn test_json_wire_form() {
        let json = serde_json::json!({
            "size": UNKNOWN_SENTINEL,
            "password": { SIG_KEY: SECRET_SIG, "value": "hunter2" },
            "tags": ["a", 1.5, true, null],
        });
        let value: PropertyValue = serde_json::from_value(json.clone()).unwrap();

        let PropertyValue::Object(fields) = &value else {
            panic!("expected object, got {value:?}");
        };
        assert!(fields[&PropertyKey::from("size")].is_unknown());
        assert!(fields[&PropertyKey::from("password")].is_secret());

        assert_eq!(serde_json::to_value(&value).unwrap(), json);
    }
}
