//! Token parsing and verification
//!
//! [`Parser`] turns a compact token into a [`Token`] by running a fixed
//! pipeline. Structural and trust failures stop it immediately; claims and
//! signature failures accumulate, so a token that is both expired and forged
//! reports both.
//!
//! ```text
//! split ─▶ header ─▶ claims ─▶ method ─▶ allow-list ─▶ keyfunc
//!   │        │         │         │           │            │
//! MALFORMED MALFORMED MALFORMED UNVERIFIABLE SIGNATURE_   UNVERIFIABLE
//!                                            INVALID
//!
//! keyfunc ─▶ claims validation ─▶ signature ─▶ assemble
//!                 │                   │
//!          (merged kinds)      (merged SIGNATURE_INVALID)
//! ```
//!
//! The key-resolution callback receives the token before anything about it is
//! trusted. It is the only step that may block; the parser adds no timeout.
//! When it fails, no signature verification is attempted.
//!
//! # Example
//!
//! ```ignore
//! use tokenseal::*;
//!
//! let parser = Parser::builder()
//!     .allow_algorithms(AlgorithmPolicy::hs256_only())
//!     .leeway(Duration::from_secs(30))
//!     .require_audience("my-api")
//!     .build();
//!
//! let token = parser.parse(raw, |_token| Ok(Key::symmetric(b"secret".to_vec())))?;
//! assert!(token.valid());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::algorithm::{AlgorithmPolicy, SigningMethod, SigningMethodRegistry};
use crate::claims::{Claims, Clock, MapClaims, ValidationHelper};
use crate::compression::{CompressionMethod, CompressionRegistry};
use crate::error::{Error, ErrorKind, Result, ValidationError};
use crate::keys::Key;
use crate::token::{Header, Token};
use crate::utils::base64url;

/// Key-resolution callback
///
/// Receives the decoded but untrusted token and returns the key that should
/// verify it. Remote key lookups belong here.
pub type Keyfunc<'a, C = MapClaims> = dyn Fn(&Token<C>) -> Result<Key> + 'a;

const NONE_ALGORITHM: &str = "none";

/// Options recognised by [`Parser`]
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Algorithms a token may declare; `None` accepts every registered
    /// method except `none`
    pub allowed_algorithms: Option<AlgorithmPolicy>,
    /// Clock-skew tolerance for `exp`, `nbf` and `iat`
    pub leeway: Duration,
    pub skip_claims_validation: bool,
    /// Hand claims numbers through unchanged instead of narrowing
    /// non-integers to `f64`
    pub use_arbitrary_precision_numbers: bool,
    pub required_audience: Option<String>,
    pub required_issuer: Option<String>,
    /// Reject tokens whose `iat` lies in the future
    pub verify_issued_at: bool,
}

/// Parses and verifies compact tokens
///
/// Cheap to clone; the registries and clock are shared.
#[derive(Clone)]
pub struct Parser {
    config: ParserConfig,
    signing_methods: Arc<SigningMethodRegistry>,
    compression_methods: Arc<CompressionRegistry>,
    clock: Clock,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .field("signing_methods", &self.signing_methods)
            .field("compression_methods", &self.compression_methods)
            .finish_non_exhaustive()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Default options, global registries, system clock
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            signing_methods: SigningMethodRegistry::global(),
            compression_methods: CompressionRegistry::global(),
            clock: Arc::new(SystemTime::now),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::default()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The helper claims validation runs with
    ///
    /// Useful for re-validating claims outside the pipeline with the same
    /// clock, leeway and expectations.
    pub fn validation_helper(&self) -> ValidationHelper {
        let mut helper = ValidationHelper::new()
            .with_shared_clock(Arc::clone(&self.clock))
            .with_leeway(self.config.leeway)
            .with_issued_at(self.config.verify_issued_at);
        if let Some(audience) = &self.config.required_audience {
            helper = helper.with_audience(audience.clone());
        }
        if let Some(issuer) = &self.config.required_issuer {
            helper = helper.with_issuer(issuer.clone());
        }
        helper
    }

    /// Parse into [`MapClaims`]
    pub fn parse<F>(&self, raw: &str, keyfunc: F) -> std::result::Result<Token, ParseError>
    where
        F: Fn(&Token) -> Result<Key>,
    {
        self.parse_with_claims(raw, keyfunc)
    }

    /// Parse into a caller-chosen claims type
    pub fn parse_with_claims<C, F>(
        &self,
        raw: &str,
        keyfunc: F,
    ) -> std::result::Result<Token<C>, ParseError<C>>
    where
        C: Claims,
        F: Fn(&Token<C>) -> Result<Key>,
    {
        let keyfunc: &Keyfunc<'_, C> = &keyfunc;
        self.parse_with_keyfunc(raw, Some(keyfunc))
    }

    /// Run the full pipeline
    ///
    /// A missing callback is itself a failure (`UNVERIFIABLE`), so a token is
    /// never accepted without a key having been resolved for it.
    pub fn parse_with_keyfunc<C: Claims>(
        &self,
        raw: &str,
        keyfunc: Option<&Keyfunc<'_, C>>,
    ) -> std::result::Result<Token<C>, ParseError<C>> {
        // Split
        let segments: Vec<&str> = raw.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = segments[..] else {
            return Err(reject(
                None,
                "split",
                ErrorKind::MALFORMED,
                Error::InvalidSegmentCount(segments.len()),
            ));
        };

        // Header
        let header = match decode_header(header_b64) {
            Ok(header) => header,
            Err(cause) => {
                let cause = if has_bearer_prefix(raw) {
                    Error::BearerPrefix
                } else {
                    cause
                };
                return Err(reject(None, "header", ErrorKind::MALFORMED, cause));
            }
        };

        // Claims
        let compression = match header.get("zip") {
            None => None,
            Some(zip) => {
                let name = zip.as_str().map_or_else(|| zip.to_string(), str::to_string);
                match self.compression_methods.lookup(&name) {
                    Some(method) => Some(method),
                    None => {
                        let cause = Error::UnknownCompression(name);
                        return Err(reject(None, "claims", ErrorKind::MALFORMED, cause)
                            .with_header(header));
                    }
                }
            }
        };
        let claims = match self.decode_claims::<C>(claims_b64, compression.as_deref()) {
            Ok(claims) => claims,
            Err(cause) => {
                return Err(
                    reject(None, "claims", ErrorKind::MALFORMED, cause).with_header(header)
                )
            }
        };

        let mut token = Token::parsed(raw, header, claims, signature_b64);
        if let Some(compression) = compression {
            token.set_compression(compression);
        }

        // Method
        let Some(alg) = token.header().alg().map(str::to_string) else {
            return Err(reject(
                Some(token),
                "method",
                ErrorKind::UNVERIFIABLE,
                Error::MissingAlgorithm,
            ));
        };
        let Some(method) = self.signing_methods.lookup(&alg) else {
            return Err(reject(
                Some(token),
                "method",
                ErrorKind::UNVERIFIABLE,
                Error::UnknownAlgorithm(alg),
            ));
        };
        let method: Arc<dyn SigningMethod> = Arc::from(method);
        token.set_method(Arc::clone(&method));

        // Allow-list
        if let Some(policy) = &self.config.allowed_algorithms {
            if let Err(cause) = policy.validate(&alg) {
                return Err(reject(
                    Some(token),
                    "allow-list",
                    ErrorKind::SIGNATURE_INVALID,
                    cause,
                ));
            }
        }
        if alg == NONE_ALGORITHM {
            warn!(allowed = self.allows_unsecured(), "token declares alg none");
        }
        if alg == NONE_ALGORITHM && !self.allows_unsecured() {
            return Err(reject(
                Some(token),
                "allow-list",
                ErrorKind::SIGNATURE_INVALID,
                Error::NoneAlgorithmRejected,
            ));
        }

        // Key
        let key = match keyfunc.map(|keyfunc| keyfunc(&token)) {
            Some(Ok(key)) => key,
            Some(Err(cause)) => {
                return Err(reject(Some(token), "key", ErrorKind::UNVERIFIABLE, cause))
            }
            None => {
                return Err(reject(
                    Some(token),
                    "key",
                    ErrorKind::UNVERIFIABLE,
                    Error::MissingKeyfunc,
                ))
            }
        };

        let mut error = ValidationError::default();

        // Claims validation
        if !self.config.skip_claims_validation {
            if let Err(claims_error) = token.claims().validate(&self.validation_helper()) {
                debug!(stage = "claims", kind = %claims_error.kind(), "token claims rejected");
                error.merge(claims_error);
            }
        }

        // Signature
        let signing_input = &raw[..header_b64.len() + 1 + claims_b64.len()];
        if let Err(cause) = method.verify(signing_input, signature_b64, &key) {
            debug!(stage = "signature", alg = %alg, "token signature rejected");
            error.push(ErrorKind::SIGNATURE_INVALID, cause);
        }

        // Assemble
        if error.is_empty() {
            token.mark_valid();
            Ok(token)
        } else {
            Err(ParseError {
                token: Some(token),
                header: None,
                error,
            })
        }
    }

    fn allows_unsecured(&self) -> bool {
        self.config
            .allowed_algorithms
            .as_ref()
            .is_some_and(|policy| policy.is_allowed(NONE_ALGORITHM))
    }

    fn decode_claims<C: Claims>(
        &self,
        segment: &str,
        compression: Option<&dyn CompressionMethod>,
    ) -> Result<C> {
        let mut payload = base64url::decode_bytes(segment)?;
        if let Some(compression) = compression {
            payload = compression.decompress(&payload)?;
        }

        let value: Value = serde_json::from_slice(&payload)
            .map_err(|e| Error::InvalidJson(format!("Failed to parse claims: {e}")))?;
        let value = if self.config.use_arbitrary_precision_numbers {
            value
        } else {
            narrow_numbers(value)?
        };

        serde_json::from_value(value)
            .map_err(|e| Error::InvalidJson(format!("Failed to decode claims: {e}")))
    }
}

fn decode_header(segment: &str) -> Result<Header> {
    let bytes = base64url::decode_bytes(segment)?;
    serde_json::from_slice::<Map<String, Value>>(&bytes)
        .map(Header::from)
        .map_err(|e| Error::InvalidJson(format!("Failed to parse header: {e}")))
}

fn has_bearer_prefix(raw: &str) -> bool {
    raw.get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "))
}

/// Fixed-width numeric mode: integers that fit 64 bits stay exact, every
/// other number becomes the nearest `f64`
fn narrow_numbers(value: Value) -> Result<Value> {
    Ok(match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => Value::Number(number),
        Value::Number(number) => {
            let narrowed = number
                .as_f64()
                .and_then(Number::from_f64)
                .ok_or_else(|| Error::InvalidJson(format!("Number {number} out of range")))?;
            Value::Number(narrowed)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(narrow_numbers)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(name, value)| narrow_numbers(value).map(|value| (name, value)))
                .collect::<Result<Map<_, _>>>()?,
        ),
        other => other,
    })
}

fn reject<C>(
    token: Option<Token<C>>,
    stage: &'static str,
    kind: ErrorKind,
    cause: Error,
) -> ParseError<C> {
    debug!(stage, kind = %kind, "token rejected");
    ParseError {
        token,
        header: None,
        error: ValidationError::new(kind, cause),
    }
}

/// Consuming builder for [`Parser`]
#[derive(Default)]
pub struct ParserBuilder {
    config: ParserConfig,
    signing_methods: Option<Arc<SigningMethodRegistry>>,
    compression_methods: Option<Arc<CompressionRegistry>>,
    clock: Option<Clock>,
}

impl ParserBuilder {
    /// Only accept tokens declaring one of these algorithms
    pub fn allow_algorithms(mut self, policy: AlgorithmPolicy) -> Self {
        self.config.allowed_algorithms = Some(policy);
        self
    }

    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.config.leeway = leeway;
        self
    }

    /// Skip `exp`/`nbf`/`aud`/`iss` checks; the signature is still verified
    pub fn without_claims_validation(mut self) -> Self {
        self.config.skip_claims_validation = true;
        self
    }

    pub fn with_arbitrary_precision_numbers(mut self) -> Self {
        self.config.use_arbitrary_precision_numbers = true;
        self
    }

    pub fn require_audience(mut self, audience: impl Into<String>) -> Self {
        self.config.required_audience = Some(audience.into());
        self
    }

    pub fn require_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.required_issuer = Some(issuer.into());
        self
    }

    pub fn verify_issued_at(mut self) -> Self {
        self.config.verify_issued_at = true;
        self
    }

    /// Replace the system clock
    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Use a private signing method registry instead of the global one
    pub fn signing_methods(mut self, registry: Arc<SigningMethodRegistry>) -> Self {
        self.signing_methods = Some(registry);
        self
    }

    /// Use a private compression registry instead of the global one
    pub fn compression_methods(mut self, registry: Arc<CompressionRegistry>) -> Self {
        self.compression_methods = Some(registry);
        self
    }

    pub fn build(self) -> Parser {
        Parser {
            config: self.config,
            signing_methods: self
                .signing_methods
                .unwrap_or_else(SigningMethodRegistry::global),
            compression_methods: self
                .compression_methods
                .unwrap_or_else(CompressionRegistry::global),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemTime::now)),
        }
    }
}

/// A rejected token
///
/// `token` holds whatever was decoded before the failure (it is `None` when
/// the header or claims could not be decoded) and always reports
/// `valid() == false`. A header that decoded before a claims failure is
/// still available through [`ParseError::header`].
pub struct ParseError<C = MapClaims> {
    pub token: Option<Token<C>>,
    header: Option<Header>,
    pub error: ValidationError,
}

impl<C> ParseError<C> {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Whether any of the flags in `kind` are set
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.error.is(kind)
    }

    pub fn token(&self) -> Option<&Token<C>> {
        self.token.as_ref()
    }

    /// The decoded header, if decoding got that far
    pub fn header(&self) -> Option<&Header> {
        self.token
            .as_ref()
            .map(Token::header)
            .or(self.header.as_ref())
    }

    fn with_header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }
}

impl<C> From<ParseError<C>> for ValidationError {
    fn from(error: ParseError<C>) -> Self {
        error.error
    }
}

impl<C: fmt::Debug> fmt::Debug for ParseError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseError")
            .field("token", &self.token)
            .field("header", &self.header)
            .field("error", &self.error)
            .finish()
    }
}

impl<C> fmt::Display for ParseError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<C: fmt::Debug> std::error::Error for ParseError<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Parse with a default [`Parser`]
pub fn parse<F>(raw: &str, keyfunc: F) -> std::result::Result<Token, ParseError>
where
    F: Fn(&Token) -> Result<Key>,
{
    Parser::new().parse(raw, keyfunc)
}

/// Parse into `C` with a default [`Parser`]
pub fn parse_with_claims<C, F>(raw: &str, keyfunc: F) -> std::result::Result<Token<C>, ParseError<C>>
where
    C: Claims,
    F: Fn(&Token<C>) -> Result<Key>,
{
    Parser::new().parse_with_claims(raw, keyfunc)
}
