use serde::{Deserialize, Serialize};

use crate::claims::{ClaimResult, ClaimStrings, Claims, NumericDate, ValidationHelper};
use crate::error::ValidationError;

/// Registered claims as defined in RFC 7519 Section 4.1
///
/// Every field is optional; absence only fails validation when the
/// [`ValidationHelper`] requires that claim. Embed it with
/// `#[serde(flatten)]` in an application claims type and delegate
/// [`Claims::validate`] to it to get the standard checks.
///
/// # Examples
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct AppClaims {
///     #[serde(flatten)]
///     standard: StandardClaims,
///     role: String,
/// }
///
/// impl Claims for AppClaims {
///     fn validate(&self, helper: &ValidationHelper) -> Result<(), ValidationError> {
///         self.standard.validate(helper)
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardClaims {
    /// Audience (aud) - recipients the token is intended for
    #[serde(rename = "aud", default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<ClaimStrings>,

    /// Expiration Time (exp)
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NumericDate>,

    /// JWT ID (jti)
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Issued At (iat)
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<NumericDate>,

    /// Issuer (iss)
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Not Before (nbf)
    #[serde(rename = "nbf", default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<NumericDate>,

    /// Subject (sub)
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Claims for StandardClaims {
    fn validate(&self, helper: &ValidationHelper) -> Result<(), ValidationError> {
        let checks: [ClaimResult; 5] = [
            helper.validate_expires_at(self.expires_at),
            helper.validate_not_before(self.not_before),
            helper.validate_issued_at(self.issued_at),
            helper.validate_audience(self.audience.as_ref()),
            helper.validate_issuer(self.issuer.as_deref()),
        ];

        let mut errors = ValidationError::default();
        for error in checks.into_iter().filter_map(Result::err) {
            errors.merge(error);
        }
        errors.into_result()
    }
}
