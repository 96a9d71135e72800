//! Error types for token processing
//!
//! Two layers:
//! - [`Error`] is the low-level cause: a decode failure, a key of the wrong
//!   type, a cryptographic mismatch, a violated claim.
//! - [`ValidationError`] is what the parser reports. It carries an
//!   [`ErrorKind`] bitmask holding every violated constraint at once, plus the
//!   chained cause(s). Callers branch on the bitmask, not on the cause.

use std::fmt;
use std::time::{Duration, SystemTime};

use thiserror::Error;

bitflags::bitflags! {
    /// Classes of validation failure, combinable into one set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ErrorKind: u32 {
        /// Token is structurally broken: segments, base64, JSON, compression.
        const MALFORMED         = 1 << 0;
        /// Trust cannot be established: unknown algorithm, key resolution failed.
        const UNVERIFIABLE      = 1 << 1;
        /// Signature mismatch, or the declared algorithm is not permitted.
        const SIGNATURE_INVALID = 1 << 2;
        /// `exp` is in the past.
        const EXPIRED           = 1 << 3;
        /// `nbf` is in the future.
        const NOT_YET_VALID     = 1 << 4;
        /// `aud` does not contain the required audience.
        const AUDIENCE_INVALID  = 1 << 5;
        /// `iss` does not match the required issuer.
        const ISSUER_INVALID    = 1 << 6;
        /// Some other claim problem, e.g. a time claim of the wrong type.
        const CLAIMS_INVALID    = 1 << 7;
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            first = false;
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Low-level cause of a failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Invalid token format: expected 3 segments separated by '.', found {0}")]
    InvalidSegmentCount(usize),

    #[error("Base64URL decoding failed: {0}")]
    InvalidBase64(String),

    #[error("JSON parsing failed: {0}")]
    InvalidJson(String),

    #[error("Token string should not contain 'bearer '")]
    BearerPrefix,

    // ============================================================================
    // Algorithm Errors
    // ============================================================================
    #[error("Token header has no 'alg' field")]
    MissingAlgorithm,

    #[error("Signing method '{0}' is unavailable")]
    UnknownAlgorithm(String),

    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    #[error("The 'none' algorithm is rejected unless explicitly allowed")]
    NoneAlgorithmRejected,

    #[error("Algorithm '{0}' is already registered")]
    DuplicateAlgorithm(String),

    // ============================================================================
    // Key Errors
    // ============================================================================
    #[error("No key resolution callback was provided")]
    MissingKeyfunc,

    #[error("Key resolution failed: {0}")]
    KeyResolution(String),

    #[error("Key type mismatch for {algorithm}: expected {expected}, got {actual}")]
    InvalidKeyType {
        algorithm: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ============================================================================
    // Signature Errors
    // ============================================================================
    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Signing failed: {0}")]
    Signing(String),

    // ============================================================================
    // Compression Errors
    // ============================================================================
    #[error("Compression method '{0}' is unavailable")]
    UnknownCompression(String),

    #[error("Compression failed: {0}")]
    Compression(String),

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("Token is expired by {expired_by:?}")]
    Expired {
        expired_at: SystemTime,
        expired_by: Duration,
    },

    #[error("Token is not valid yet, valid in {early_by:?}")]
    NotYetValid {
        not_before: SystemTime,
        early_by: Duration,
    },

    #[error("Token used before issued")]
    IssuedInFuture { issued_at: SystemTime },

    #[error("Token audience does not contain '{expected}'")]
    AudienceMismatch { expected: String },

    #[error("Token is missing required claim '{0}'")]
    MissingClaim(String),

    #[error("Token issuer does not match '{expected}'")]
    IssuerMismatch { expected: String },

    #[error("Claim '{claim}' is invalid: {reason}")]
    InvalidClaimType { claim: String, reason: String },

    #[error("Invalid numeric date: {0}")]
    InvalidNumericDate(String),

    #[error("Token validation failed with multiple errors: {}", join_errors(.0))]
    Multiple(Vec<Error>),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for token operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by claims validation and the parser
///
/// `kind` is the union of every violated constraint; `cause` chains to the
/// originating error(s). An empty `kind` means "no failure" and is only used
/// while accumulating.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, cause: Error) -> Self {
        Self {
            kind,
            cause: Some(cause),
        }
    }

    /// Failure without an underlying cause
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self { kind, cause: None }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_ref()
    }

    /// Every individual cause, flattening [`Error::Multiple`]
    pub fn causes(&self) -> Vec<&Error> {
        match &self.cause {
            None => Vec::new(),
            Some(Error::Multiple(errors)) => errors.iter().collect(),
            Some(error) => vec![error],
        }
    }

    /// Whether any of the bits in `kind` are set
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind.intersects(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }

    /// Record an additional violation.
    pub fn push(&mut self, kind: ErrorKind, cause: Error) {
        self.merge(Self::new(kind, cause));
    }

    /// Union `other` into `self`, keeping all causes.
    pub fn merge(&mut self, other: ValidationError) {
        self.kind |= other.kind;
        self.cause = match (self.cause.take(), other.cause) {
            (None, other) => other,
            (mine, None) => mine,
            (Some(Error::Multiple(mut mine)), Some(Error::Multiple(theirs))) => {
                mine.extend(theirs);
                Some(Error::Multiple(mine))
            }
            (Some(Error::Multiple(mut mine)), Some(theirs)) => {
                mine.push(theirs);
                Some(Error::Multiple(mine))
            }
            (Some(mine), Some(Error::Multiple(theirs))) => {
                let mut all = Vec::with_capacity(theirs.len() + 1);
                all.push(mine);
                all.extend(theirs);
                Some(Error::Multiple(all))
            }
            (Some(mine), Some(theirs)) => Some(Error::Multiple(vec![mine, theirs])),
        };
    }

    /// `Ok(())` if nothing was recorded, `Err(self)` otherwise
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{cause}"),
            None => write!(f, "Token is invalid ({})", self.kind),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<ErrorKind> for ValidationError {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}
