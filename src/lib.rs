//! # tokenseal - Compact Signed Token Verification
//!
//! > Issue and verify compact signed tokens (JWT/JWS compact serialisation) in Rust.
//!
//! **tokenseal** signs claims into `header.claims.signature` strings and turns such strings back
//! into trusted values through a single verification pipeline. Every rejection is reported as a
//! [`ValidationError`]: a set of [`ErrorKind`] flags plus the underlying cause, so callers branch
//! on *why* a token was refused instead of matching error strings.
//!
//! ## Overview
//!
//! A token is three base64url segments: a JSON header naming the signing method (`alg`) and an
//! optional compression method (`zip`), the JSON claims, and the signature over the first two
//! segments. Verifying one is the whole trust boundary of an application, and the classic bugs
//! live here: algorithm confusion, `alg: none` downgrades, missing expiry checks and timing
//! leaks in signature comparison.
//!
//! **tokenseal** runs every token through the same [`Parser`] pipeline. Structural and trust
//! failures stop it; claims and signature failures accumulate, so a token that is both expired
//! and forged reports both. A returned [`Token`] is authenticated only when
//! [`Token::valid`] is `true`, and the parser never returns `Ok` for an invalid token.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tokenseal::*;
//!
//! let key = Key::symmetric(b"secret".to_vec());
//! let raw = Token::new(HS256, MapClaims::new().with("sub", "user123")).signed_string(&key)?;
//!
//! let token = Parser::builder()
//!     .allow_algorithms(AlgorithmPolicy::hs256_only())
//!     .build()
//!     .parse(&raw, known_keyfunc("HS256", key))?;
//!
//! assert!(token.valid());
//! assert_eq!(token.claims().subject()?, Some("user123"));
//! ```
//!
//! ## Verification Flow
//!
//! ```text
//! split            exactly three segments                 MALFORMED
//!   │
//! header           base64url + JSON object                MALFORMED
//!   │
//! claims           zip, base64url, JSON, claims type      MALFORMED
//!   │
//! method           `alg` present and registered           UNVERIFIABLE
//!   │
//! allow-list       policy membership, `none` opt-in       SIGNATURE_INVALID
//!   │
//! keyfunc          caller resolves the key                UNVERIFIABLE
//!   │
//! claims checks    exp / nbf / iat / aud / iss            merged
//!   │
//! signature        method verifies segments 0 and 1       merged
//!   ▼
//! Token (valid = true) or ParseError
//! ```
//!
//! ## Algorithm Support
//!
//! All signing methods implement the [`SigningMethod`] trait and are looked up by name in a
//! [`SigningMethodRegistry`]:
//!
//! - **HMAC**: HS256, HS384, HS512
//! - **RSA PKCS#1 v1.5**: RS256, RS384, RS512
//! - **RSA-PSS**: PS256, PS384, PS512 (salt length auto-detected on verification)
//! - **EdDSA**: Ed25519
//! - **none**: unsigned, rejected unless the parser's [`AlgorithmPolicy`] lists it
//!
//! Registering a name twice is a programming error and panics; the first registration stays.
//!
//! ## Cargo Features
//!
//! All enabled by default:
//!
//! - `rsa`: RS256/384/512 and PS256/384/512
//! - `eddsa`: Ed25519
//! - `compression`: `gzip` and `DEF` claims compression
//!
//! HMAC and `none` are always available.
//!
//! ## Claims Validation
//!
//! [`MapClaims`] holds any JSON object; [`StandardClaims`] holds the seven registered claims and
//! can be flattened into an application type. Time claims are accepted as integers, floats or
//! numeric strings. With leeway `L`:
//!
//! - `exp` fails iff `now - L > exp`
//! - `nbf` fails iff `now + L < nbf`
//! - `iat` (opt-in) fails iff `now + L < iat`
//!
//! ## Security
//!
//! ### Algorithm Confusion Prevention
//!
//! Restrict algorithms explicitly with [`ParserBuilder::allow_algorithms`]. A token declaring an
//! algorithm outside the policy is reported exactly like a bad signature.
//!
//! ### "none" Algorithm Rejection
//!
//! `alg: none` is rejected unless the policy names it, see
//! [`AlgorithmPolicy::with_unsecured_none`].
//!
//! ### Timing Attack Protection
//!
//! HMAC signatures, audiences and issuers are compared with the
//! [`constant_time_eq`](https://crates.io/crates/constant_time_eq) crate.
//!
//! ## References
//!
//! - [RFC 7515](https://datatracker.ietf.org/doc/html/rfc7515): JSON Web Signature (JWS)
//! - [RFC 7519](https://datatracker.ietf.org/doc/html/rfc7519): JSON Web Token (JWT)
//! - [RFC 8725](https://datatracker.ietf.org/doc/html/rfc8725): JSON Web Signature Best Practices

// Core modules
pub mod error;
pub mod utils;

// Algorithm system
pub mod algorithm;
pub mod keys;

// Claims and validation
pub mod claims;
pub mod compression;

// Token types
pub mod token;

// Verification pipeline (main public API)
pub mod parser;

// ============================================================================
// PUBLIC API
// ============================================================================

// Main flow types
pub use parser::{parse, parse_with_claims, Keyfunc, ParseError, Parser, ParserBuilder, ParserConfig};
pub use token::{known_keyfunc, Header, Token};

// Claims
pub use claims::{ClaimStrings, Claims, MapClaims, NumericDate, StandardClaims, ValidationHelper};

// Signing methods
pub use algorithm::{
    AlgorithmId, AlgorithmPolicy, SigningMethod, SigningMethodRegistry, HS256, HS384, HS512, NONE,
};
#[cfg(feature = "eddsa")]
pub use algorithm::EDDSA;
#[cfg(feature = "rsa")]
pub use algorithm::{PssSaltLength, PS256, PS384, PS512, RS256, RS384, RS512};
pub use compression::{CompressionMethod, CompressionRegistry};
pub use keys::Key;

// Errors
pub use error::{Error, ErrorKind, Result, ValidationError};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn secret() -> Key {
        Key::symmetric(b"secret".to_vec())
    }

    fn sign(claims: serde_json::Value) -> String {
        Token::new(HS256, MapClaims::try_from(claims).unwrap())
            .signed_string(&secret())
            .unwrap()
    }

    #[test]
    fn test_full_flow_hmac() {
        let raw = sign(json!({"foo": "bar"}));
        let token = parse(&raw, |_| Ok(secret())).unwrap();

        assert!(token.valid());
        assert_eq!(
            serde_json::to_value(token.claims()).unwrap(),
            json!({"foo": "bar"})
        );
    }

    #[test]
    fn test_expired_bitmask_is_exactly_expired() {
        let raw = sign(json!({"foo": "bar", "exp": now() - 100}));
        let err = parse(&raw, |_| Ok(secret())).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EXPIRED);
        assert!(!err.token.unwrap().valid());
    }

    #[test]
    fn test_audience_list() {
        let raw = sign(json!({"aud": ["a", "b"]}));

        let accepted = Parser::builder()
            .require_audience("a")
            .build()
            .parse(&raw, |_| Ok(secret()));
        assert!(accepted.is_ok());

        let rejected = Parser::builder()
            .require_audience("c")
            .build()
            .parse(&raw, |_| Ok(secret()))
            .unwrap_err();
        assert_eq!(rejected.kind(), ErrorKind::AUDIENCE_INVALID);
    }

    #[test]
    fn test_signature_verification_fails() {
        let raw = sign(json!({"iss": "https://example.com"}));
        let err = parse(&raw, |_| Ok(Key::symmetric(b"wrong".to_vec()))).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SIGNATURE_INVALID);
        assert_eq!(err.error.cause(), Some(&Error::SignatureInvalid));
    }

    #[test]
    fn test_issuer_validation_fails() {
        let raw = sign(json!({"iss": "https://untrusted.com"}));
        let err = Parser::builder()
            .require_issuer("https://trusted.com")
            .build()
            .parse(&raw, |_| Ok(secret()))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ISSUER_INVALID);
    }

    #[test]
    #[cfg(feature = "compression")]
    fn test_compressed_round_trip() {
        let key = secret();
        let raw = Token::new(HS384, MapClaims::new().with("data", "x".repeat(512)))
            .with_compression(Arc::new(compression::Gzip))
            .signed_string(&key)
            .unwrap();

        let token = parse(&raw, known_keyfunc("HS384", key)).unwrap();
        assert_eq!(token.header().zip(), Some("gzip"));
        assert_eq!(token.compression().map(|c| c.name()), Some("gzip"));
        assert_eq!(token.claims()["data"].as_str().map(str::len), Some(512));
    }

    #[test]
    #[cfg(feature = "eddsa")]
    fn test_private_registry_without_none() {
        let registry = Arc::new(SigningMethodRegistry::new());
        algorithm::hmac::register(&registry);

        let raw = Token::new(EDDSA, MapClaims::new())
            .signed_string(&Key::ed25519_private_seed(&[7u8; 32]).unwrap())
            .unwrap();
        let err = Parser::builder()
            .signing_methods(registry)
            .build()
            .parse(&raw, |_| Ok(secret()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UNVERIFIABLE);
    }

    #[test]
    fn test_leeway_covers_clock_skew() {
        let raw = sign(json!({"exp": now() - 30, "nbf": now() + 30}));

        let err = parse(&raw, |_| Ok(secret())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EXPIRED | ErrorKind::NOT_YET_VALID);

        let token = Parser::builder()
            .leeway(Duration::from_secs(120))
            .build()
            .parse(&raw, |_| Ok(secret()))
            .unwrap();
        assert!(token.valid());
    }
}
