//! Per-algorithm round-trip tests
//!
//! Each supported algorithm must:
//! 1. Sign a token
//! 2. Parse and verify it through the full pipeline
//! 3. Preserve all claims through the round-trip

#[cfg(feature = "rsa")]
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use tokenseal::*;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn claims() -> MapClaims {
    MapClaims::try_from(json!({
        "iss": "https://example.com",
        "sub": "test-user",
        "aud": "test-app",
        "exp": now() + 3600,
        "iat": now(),
    }))
    .unwrap()
}

#[cfg(feature = "rsa")]
fn rsa_private() -> &'static Key {
    static KEY: OnceLock<Key> = OnceLock::new();
    KEY.get_or_init(|| {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        Key::rsa_private(&key).unwrap()
    })
}

fn round_trip<M>(method: M, signing_key: &Key, verifying_key: Key, policy: AlgorithmPolicy)
where
    M: SigningMethod + Copy + 'static,
{
    let alg = method.alg().to_string();
    let original = claims();
    let raw = Token::new(method, original.clone())
        .signed_string(signing_key)
        .unwrap();

    let token = Parser::builder()
        .allow_algorithms(policy)
        .require_issuer("https://example.com")
        .require_audience("test-app")
        .build()
        .parse(&raw, known_keyfunc(&alg, verifying_key))
        .unwrap_or_else(|e| panic!("{alg} round trip failed: {e}"));

    assert!(token.valid());
    assert_eq!(token.header().alg(), Some(alg.as_str()));
    assert_eq!(token.claims(), &original);
    assert_eq!(token.raw(), raw);
}

// ============================================================================
// HMAC Algorithm Round-Trips (HS256, HS384, HS512)
// ============================================================================

mod hmac_tests {
    use super::*;

    fn secret() -> Key {
        Key::symmetric(b"test-secret-hmac-key".to_vec())
    }

    #[test]
    fn round_trip_hs256() {
        round_trip(HS256, &secret(), secret(), AlgorithmPolicy::hs256_only());
    }

    #[test]
    fn round_trip_hs384() {
        round_trip(HS384, &secret(), secret(), AlgorithmPolicy::hmac_any());
    }

    #[test]
    fn round_trip_hs512() {
        round_trip(HS512, &secret(), secret(), AlgorithmPolicy::hmac_any());
    }

    #[test]
    fn known_vector_foo_bar() {
        let key = Key::symmetric(b"secret".to_vec());
        let raw = Token::new(HS256, MapClaims::new().with("foo", "bar"))
            .signed_string(&key)
            .unwrap();

        let token = parse(&raw, |_| Ok(key.clone())).unwrap();
        assert!(token.valid());
        assert_eq!(token.claims().get("foo"), Some(&json!("bar")));
    }
}

// ============================================================================
// RSA Algorithm Round-Trips (RS256, RS384, RS512)
// ============================================================================

#[cfg(feature = "rsa")]
mod rsa_tests {
    use super::*;

    #[test]
    fn round_trip_rs256() {
        let key = rsa_private();
        round_trip(RS256, key, key.public_key(), AlgorithmPolicy::rs256_only());
    }

    #[test]
    fn round_trip_rs384() {
        let key = rsa_private();
        round_trip(RS384, key, key.public_key(), AlgorithmPolicy::rsa_any());
    }

    #[test]
    fn round_trip_rs512() {
        let key = rsa_private();
        round_trip(RS512, key, key.public_key(), AlgorithmPolicy::rsa_any());
    }

    #[test]
    fn rsa_requires_private_key_to_sign() {
        let public = rsa_private().public_key();
        let result = Token::new(RS256, MapClaims::new()).signed_string(&public);
        assert!(matches!(result, Err(Error::InvalidKeyType { .. })));
    }
}

// ============================================================================
// RSA-PSS Algorithm Round-Trips (PS256, PS384, PS512)
// ============================================================================

#[cfg(feature = "rsa")]
mod rsa_pss_tests {
    use super::*;

    #[test]
    fn round_trip_ps256() {
        let key = rsa_private();
        round_trip(PS256, key, key.public_key(), AlgorithmPolicy::rsa_pss_any());
    }

    #[test]
    fn round_trip_ps384() {
        let key = rsa_private();
        round_trip(PS384, key, key.public_key(), AlgorithmPolicy::rsa_pss_any());
    }

    #[test]
    fn round_trip_ps512() {
        let key = rsa_private();
        round_trip(PS512, key, key.public_key(), AlgorithmPolicy::rsa_pss_any());
    }

    #[test]
    fn fixed_salt_verifier_accepts_own_signatures() {
        let key = rsa_private();
        let raw = Token::new(PS256, MapClaims::new().with("sub", "user"))
            .signed_string(key)
            .unwrap();

        let registry = std::sync::Arc::new(SigningMethodRegistry::new());
        let strict = PS256.with_verify_salt(PssSaltLength::EqualsHash);
        registry.register("PS256", move || Box::new(strict));

        let token = Parser::builder()
            .signing_methods(registry)
            .build()
            .parse(&raw, known_keyfunc("PS256", key.public_key()))
            .unwrap();
        assert!(token.valid());
    }
}

// ============================================================================
// EdDSA Round-Trip
// ============================================================================

#[cfg(feature = "eddsa")]
mod eddsa_tests {
    use super::*;

    #[test]
    fn round_trip_eddsa() {
        let key = Key::ed25519_private_seed(&[42u8; 32]).unwrap();
        round_trip(EDDSA, &key, key.public_key(), AlgorithmPolicy::eddsa_only());
    }

    #[test]
    fn eddsa_is_deterministic() {
        let key = Key::ed25519_private_seed(&[42u8; 32]).unwrap();
        let token = Token::new(EDDSA, MapClaims::new().with("sub", "user"));
        assert_eq!(
            token.signed_string(&key).unwrap(),
            token.signed_string(&key).unwrap()
        );
    }
}

// ============================================================================
// Cross-algorithm failures
// ============================================================================

#[test]
#[cfg(feature = "rsa")]
fn wrong_key_family_is_signature_invalid() {
    let raw = Token::new(HS256, claims())
        .signed_string(&Key::symmetric(b"secret".to_vec()))
        .unwrap();

    let err = parse(&raw, |_| Ok(rsa_private().public_key())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SIGNATURE_INVALID);
    assert!(matches!(err.error.cause(), Some(Error::InvalidKeyType { .. })));
}

#[test]
fn structured_claims_round_trip() {
    let key = Key::symmetric(b"secret".to_vec());
    let original = StandardClaims {
        subject: Some("user".to_string()),
        audience: Some(ClaimStrings::from(["a", "b"])),
        expires_at: Some(NumericDate::from_seconds(now() as i64 + 60).unwrap()),
        ..Default::default()
    };

    let raw = Token::new(HS256, original.clone())
        .signed_string(&key)
        .unwrap();
    let token = parse_with_claims::<StandardClaims, _>(&raw, |_| Ok(key.clone())).unwrap();

    assert!(token.valid());
    assert_eq!(token.claims(), &original);
}
