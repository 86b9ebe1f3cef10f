//! Values bound to environment variable names.
//!
//! An [`EnvValue`] is whatever a precedence source supplies for a name: the
//! live process environment only ever yields strings, while defaults and
//! resolver documents may carry numbers, booleans, null and nested data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name → value mapping used for defaults and the loaded environment.
pub type EnvMap = BTreeMap<String, EnvValue>;

/// A resolved value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Explicitly undefined. Never produced by deserialization.
    #[default]
    #[serde(skip)]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<EnvValue>),
    Map(BTreeMap<String, EnvValue>),
}

impl EnvValue {
    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is the empty string.
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for EnvValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<serde_yaml::Value> for EnvValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::String(s),
            Value::Sequence(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Mapping(map) => Self::Map(
                map.into_iter()
                    .filter_map(|(k, v)| yaml_key(&k).map(|k| (k, Self::from(v))))
                    .collect(),
            ),
            Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

/// Render a YAML mapping key as a variable name.
///
/// Scalar keys are stringified (`1: x` becomes `"1"`); structured keys are dropped.
pub(crate) fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
