use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token header: an ordered JSON object
///
/// Field order is preserved so a re-encoded header matches what was signed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(Map<String, Value>);

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signing method name (`alg`), if present and a string
    pub fn alg(&self) -> Option<&str> {
        self.str_field("alg")
    }

    /// Token type (`typ`)
    pub fn typ(&self) -> Option<&str> {
        self.str_field("typ")
    }

    /// Compression method name (`zip`)
    pub fn zip(&self) -> Option<&str> {
        self.str_field("zip")
    }

    /// Key ID (`kid`)
    pub fn kid(&self) -> Option<&str> {
        self.str_field("kid")
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

impl Deref for Header {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for Header {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_fields() {
        let header: Header =
            serde_json::from_value(json!({"alg": "HS256", "typ": "JWT", "kid": "k1"})).unwrap();
        assert_eq!(header.alg(), Some("HS256"));
        assert_eq!(header.typ(), Some("JWT"));
        assert_eq!(header.kid(), Some("k1"));
        assert_eq!(header.zip(), None);
    }

    #[test]
    fn test_non_string_alg_is_absent() {
        let header: Header = serde_json::from_value(json!({"alg": 256})).unwrap();
        assert_eq!(header.alg(), None);
        assert!(header.get("alg").is_some());
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut header = Header::new();
        header.insert("typ", "JWT");
        header.insert("alg", "EdDSA");
        header.insert("zip", "gzip");
        assert_eq!(
            serde_json::to_string(&header).unwrap(),
            r#"{"typ":"JWT","alg":"EdDSA","zip":"gzip"}"#
        );
    }
}
