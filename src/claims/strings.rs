use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::claims::time::json_type;
use crate::error::{Error, Result};

/// A claim holding either a single string or an array of strings (`aud`)
///
/// A single entry serialises back as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClaimStrings(Vec<String>);

impl ClaimStrings {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn one(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalise the JSON form of `claim`; `null` is an empty list
    pub fn from_value(claim: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(single) => Ok(Self::one(single.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(Error::InvalidClaimType {
                        claim: claim.to_string(),
                        reason: format!("array entries must be strings, found {}", json_type(other)),
                    }),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self),
            other => Err(Error::InvalidClaimType {
                claim: claim.to_string(),
                reason: format!("expected a string or array of strings, found {}", json_type(other)),
            }),
        }
    }
}

impl From<&str> for ClaimStrings {
    fn from(value: &str) -> Self {
        Self::one(value)
    }
}

impl From<Vec<String>> for ClaimStrings {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[&str; N]> for ClaimStrings {
    fn from(values: [&str; N]) -> Self {
        Self(values.into_iter().map(String::from).collect())
    }
}

impl Serialize for ClaimStrings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ClaimStrings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value("aud", &value).map_err(de::Error::custom)
    }
}
