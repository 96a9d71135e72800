use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claims::time::json_type;
use crate::claims::{ClaimStrings, Claims, NumericDate, ValidationHelper};
use crate::error::{Error, ErrorKind, Result, ValidationError};

/// Open claims set: any JSON object
///
/// Standard claims are read on demand through the typed getters, which
/// normalise their values. A standard claim holding the wrong JSON type is
/// reported as `CLAIMS_INVALID`, never treated as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapClaims(Map<String, Value>);

impl MapClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// `exp`, normalised
    pub fn expires_at(&self) -> Result<Option<NumericDate>> {
        self.time_claim("exp")
    }

    /// `nbf`, normalised
    pub fn not_before(&self) -> Result<Option<NumericDate>> {
        self.time_claim("nbf")
    }

    /// `iat`, normalised
    pub fn issued_at(&self) -> Result<Option<NumericDate>> {
        self.time_claim("iat")
    }

    /// `aud` as a list, whether sent as a string or an array
    pub fn audience(&self) -> Result<Option<ClaimStrings>> {
        match self.present("aud") {
            None => Ok(None),
            Some(value) => ClaimStrings::from_value("aud", value).map(Some),
        }
    }

    pub fn issuer(&self) -> Result<Option<&str>> {
        self.string_claim("iss")
    }

    pub fn subject(&self) -> Result<Option<&str>> {
        self.string_claim("sub")
    }

    pub fn id(&self) -> Result<Option<&str>> {
        self.string_claim("jti")
    }

    /// Claim value, treating JSON `null` as absent
    fn present(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    fn time_claim(&self, name: &str) -> Result<Option<NumericDate>> {
        match self.present(name) {
            None => Ok(None),
            Some(value) => NumericDate::from_value(value)
                .map(Some)
                .map_err(|e| Error::InvalidClaimType {
                    claim: name.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn string_claim(&self, name: &str) -> Result<Option<&str>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(Error::InvalidClaimType {
                claim: name.to_string(),
                reason: format!("expected a string, found {}", json_type(other)),
            }),
        }
    }
}

impl Claims for MapClaims {
    /// Runs every check and reports all failures together
    fn validate(&self, helper: &ValidationHelper) -> std::result::Result<(), ValidationError> {
        let mut errors = ValidationError::default();

        match self.expires_at() {
            Ok(exp) => collect(&mut errors, helper.validate_expires_at(exp)),
            Err(e) => errors.push(ErrorKind::CLAIMS_INVALID, e),
        }

        match self.not_before() {
            Ok(nbf) => collect(&mut errors, helper.validate_not_before(nbf)),
            Err(e) => errors.push(ErrorKind::CLAIMS_INVALID, e),
        }

        if helper.verifies_issued_at() {
            match self.issued_at() {
                Ok(iat) => collect(&mut errors, helper.validate_issued_at(iat)),
                Err(e) => errors.push(ErrorKind::CLAIMS_INVALID, e),
            }
        }

        if helper.audience().is_some() {
            match self.audience() {
                Ok(aud) => collect(&mut errors, helper.validate_audience(aud.as_ref())),
                Err(e) => errors.push(ErrorKind::CLAIMS_INVALID | ErrorKind::AUDIENCE_INVALID, e),
            }
        }

        if helper.issuer().is_some() {
            match self.issuer() {
                Ok(iss) => collect(&mut errors, helper.validate_issuer(iss)),
                Err(e) => errors.push(ErrorKind::CLAIMS_INVALID | ErrorKind::ISSUER_INVALID, e),
            }
        }

        errors.into_result()
    }
}

fn collect(errors: &mut ValidationError, result: std::result::Result<(), ValidationError>) {
    if let Err(e) = result {
        errors.merge(e);
    }
}

impl Deref for MapClaims {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MapClaims {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Map<String, Value>> for MapClaims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for MapClaims {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidJson(format!(
                "claims must be a JSON object, found {}",
                json_type(&other)
            ))),
        }
    }
}
