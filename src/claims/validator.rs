use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use constant_time_eq::constant_time_eq;

use crate::claims::{ClaimStrings, NumericDate};
use crate::error::{Error, ErrorKind, ValidationError};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// Result of a single claim check
pub type ClaimResult = std::result::Result<(), ValidationError>;

/// Clock, leeway and expectations used to validate claims
///
/// Built once per parse call. Time checks:
/// - `exp` fails iff `now - leeway > exp`
/// - `nbf` fails iff `now + leeway < nbf`
/// - `iat` (only when enabled) fails iff `now + leeway < iat`
///
/// Audience and issuer are only checked when an expected value is set; a
/// missing claim then fails.
#[derive(Clone)]
pub struct ValidationHelper {
    clock: Clock,
    leeway: Duration,
    audience: Option<String>,
    issuer: Option<String>,
    verify_iat: bool,
}

impl Default for ValidationHelper {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemTime::now),
            leeway: Duration::ZERO,
            audience: None,
            issuer: None,
            verify_iat: false,
        }
    }
}

impl fmt::Debug for ValidationHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationHelper")
            .field("leeway", &self.leeway)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("verify_iat", &self.verify_iat)
            .finish_non_exhaustive()
    }
}

impl ValidationHelper {
    /// System clock, no leeway, no audience or issuer expectations
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clock (tests, or a synchronised time source)
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub(crate) fn with_shared_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Tolerance for clock skew between issuer and verifier
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Require `aud` to contain `audience`
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Require `iss` to equal `issuer`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Reject tokens whose `iat` lies in the future
    pub fn with_issued_at(mut self, verify: bool) -> Self {
        self.verify_iat = verify;
        self
    }

    pub fn now(&self) -> SystemTime {
        (self.clock)()
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn verifies_issued_at(&self) -> bool {
        self.verify_iat
    }

    /// Fails with `EXPIRED` iff `now - leeway > exp`
    pub fn validate_expires_at(&self, exp: Option<NumericDate>) -> ClaimResult {
        let Some(exp) = exp else {
            return Ok(());
        };
        let exp = exp.as_system_time();
        let now = self.now();

        // An `exp` so far out that adding leeway overflows never expires
        match exp.checked_add(self.leeway) {
            Some(deadline) if now > deadline => Err(ValidationError::new(
                ErrorKind::EXPIRED,
                Error::Expired {
                    expired_at: exp,
                    expired_by: now.duration_since(exp).unwrap_or_default(),
                },
            )),
            _ => Ok(()),
        }
    }

    /// Fails with `NOT_YET_VALID` iff `now + leeway < nbf`
    pub fn validate_not_before(&self, nbf: Option<NumericDate>) -> ClaimResult {
        let Some(nbf) = nbf else {
            return Ok(());
        };
        let nbf = nbf.as_system_time();
        let now = self.now();

        match now.checked_add(self.leeway) {
            Some(latest) if latest < nbf => Err(ValidationError::new(
                ErrorKind::NOT_YET_VALID,
                Error::NotYetValid {
                    not_before: nbf,
                    early_by: nbf.duration_since(now).unwrap_or_default(),
                },
            )),
            _ => Ok(()),
        }
    }

    /// Fails with `CLAIMS_INVALID` iff enabled and `now + leeway < iat`
    pub fn validate_issued_at(&self, iat: Option<NumericDate>) -> ClaimResult {
        let (true, Some(iat)) = (self.verify_iat, iat) else {
            return Ok(());
        };
        let iat = iat.as_system_time();

        match self.now().checked_add(self.leeway) {
            Some(latest) if latest < iat => Err(ValidationError::new(
                ErrorKind::CLAIMS_INVALID,
                Error::IssuedInFuture { issued_at: iat },
            )),
            _ => Ok(()),
        }
    }

    /// Fails with `AUDIENCE_INVALID` unless `aud` contains the expected audience
    ///
    /// Every entry is compared in constant time, and the scan never stops at
    /// the first match.
    pub fn validate_audience(&self, aud: Option<&ClaimStrings>) -> ClaimResult {
        let Some(expected) = self.audience.as_deref() else {
            return Ok(());
        };

        let aud = match aud {
            Some(aud) if !aud.is_empty() => aud,
            _ => {
                return Err(ValidationError::new(
                    ErrorKind::AUDIENCE_INVALID,
                    Error::MissingClaim("aud".to_string()),
                ))
            }
        };

        let mut found = false;
        for candidate in aud.iter() {
            found |= constant_time_eq(candidate.as_bytes(), expected.as_bytes());
        }

        if found {
            Ok(())
        } else {
            Err(ValidationError::new(
                ErrorKind::AUDIENCE_INVALID,
                Error::AudienceMismatch {
                    expected: expected.to_string(),
                },
            ))
        }
    }

    /// Fails with `ISSUER_INVALID` unless `iss` equals the expected issuer
    pub fn validate_issuer(&self, iss: Option<&str>) -> ClaimResult {
        let Some(expected) = self.issuer.as_deref() else {
            return Ok(());
        };

        match iss {
            None => Err(ValidationError::new(
                ErrorKind::ISSUER_INVALID,
                Error::MissingClaim("iss".to_string()),
            )),
            Some(iss) if constant_time_eq(iss.as_bytes(), expected.as_bytes()) => Ok(()),
            Some(_) => Err(ValidationError::new(
                ErrorKind::ISSUER_INVALID,
                Error::IssuerMismatch {
                    expected: expected.to_string(),
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    const NOW: u64 = 1_700_000_000;

    fn helper() -> ValidationHelper {
        ValidationHelper::new().with_clock(|| UNIX_EPOCH + Duration::from_secs(NOW))
    }

    fn date(seconds: u64) -> Option<NumericDate> {
        Some(NumericDate::new(UNIX_EPOCH + Duration::from_secs(seconds)))
    }

    #[test]
    fn test_absent_claims_pass() {
        let helper = helper().with_issued_at(true);
        assert!(helper.validate_expires_at(None).is_ok());
        assert!(helper.validate_not_before(None).is_ok());
        assert!(helper.validate_issued_at(None).is_ok());
        assert!(helper.validate_audience(None).is_ok());
        assert!(helper.validate_issuer(None).is_ok());
    }

    #[test]
    fn test_expired_reports_distance() {
        let err = helper().validate_expires_at(date(NOW - 100)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EXPIRED);
        assert!(matches!(
            err.cause(),
            Some(Error::Expired { expired_by, .. }) if *expired_by == Duration::from_secs(100)
        ));
    }

    #[test]
    fn test_exp_boundary() {
        // exp == now is still valid; one second later it is not
        assert!(helper().validate_expires_at(date(NOW)).is_ok());
        assert!(helper().validate_expires_at(date(NOW - 1)).is_err());
    }

    #[test]
    fn test_exp_leeway() {
        let exp = date(NOW - 30);
        assert!(helper()
            .with_leeway(Duration::from_secs(30))
            .validate_expires_at(exp)
            .is_ok());
        assert!(helper()
            .with_leeway(Duration::from_secs(29))
            .validate_expires_at(exp)
            .is_err());
    }

    #[test]
    fn test_not_before() {
        let err = helper().validate_not_before(date(NOW + 60)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NOT_YET_VALID);
        assert!(matches!(
            err.cause(),
            Some(Error::NotYetValid { early_by, .. }) if *early_by == Duration::from_secs(60)
        ));

        assert!(helper().validate_not_before(date(NOW)).is_ok());
        assert!(helper()
            .with_leeway(Duration::from_secs(60))
            .validate_not_before(date(NOW + 60))
            .is_ok());
    }

    #[test]
    fn test_issued_at_only_when_enabled() {
        assert!(helper().validate_issued_at(date(NOW + 60)).is_ok());

        let err = helper()
            .with_issued_at(true)
            .validate_issued_at(date(NOW + 60))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CLAIMS_INVALID);
        assert!(matches!(err.cause(), Some(Error::IssuedInFuture { .. })));
    }

    #[test]
    fn test_audience() {
        let aud = ClaimStrings::from(["a", "b"]);
        assert!(helper().with_audience("a").validate_audience(Some(&aud)).is_ok());
        assert!(helper().with_audience("b").validate_audience(Some(&aud)).is_ok());

        let err = helper()
            .with_audience("c")
            .validate_audience(Some(&aud))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AUDIENCE_INVALID);

        let err = helper().with_audience("a").validate_audience(None).unwrap_err();
        assert_eq!(err.cause(), Some(&Error::MissingClaim("aud".to_string())));
        assert!(helper()
            .with_audience("a")
            .validate_audience(Some(&ClaimStrings::default()))
            .is_err());
    }

    #[test]
    fn test_issuer() {
        let helper = helper().with_issuer("https://issuer.example");
        assert!(helper.validate_issuer(Some("https://issuer.example")).is_ok());
        assert_eq!(
            helper.validate_issuer(Some("https://evil.example")).unwrap_err().kind(),
            ErrorKind::ISSUER_INVALID
        );
        assert_eq!(
            helper.validate_issuer(None).unwrap_err().kind(),
            ErrorKind::ISSUER_INVALID
        );
    }

    #[test]
    fn test_far_future_exp_never_overflows() {
        let far = Some(NumericDate::new(UNIX_EPOCH + Duration::from_secs(i64::MAX as u64 / 2)));
        assert!(helper()
            .with_leeway(Duration::from_secs(u64::MAX / 4))
            .validate_expires_at(far)
            .is_ok());
    }
}
