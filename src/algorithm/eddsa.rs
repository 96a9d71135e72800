use crate::algorithm::{SigningMethod, SigningMethodRegistry};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::utils::base64url;

use ring::signature::{UnparsedPublicKey, ED25519};

/// EdDSA signing method over Ed25519
///
/// Signatures are deterministic: the same key and input always produce the
/// same 64 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdDsa;

/// EdDSA algorithm (Ed25519)
pub const EDDSA: EdDsa = EdDsa;

/// Register EdDSA
pub fn register(registry: &SigningMethodRegistry) {
    registry.register(EDDSA.alg(), || Box::new(EDDSA));
}

impl SigningMethod for EdDsa {
    fn alg(&self) -> &str {
        "EdDSA"
    }

    fn sign(&self, signing_input: &str, key: &Key) -> Result<String> {
        let private = key.as_ed25519_private(self.alg())?;
        let signature = private.pair().sign(signing_input.as_bytes());
        Ok(base64url::encode_bytes(signature.as_ref()))
    }

    fn verify(&self, signing_input: &str, signature: &str, key: &Key) -> Result<()> {
        let public = key.as_ed25519_public(self.alg())?;
        let signature_bytes = base64url::decode_bytes(signature)?;

        UnparsedPublicKey::new(&ED25519, public.as_bytes())
            .verify(signing_input.as_bytes(), &signature_bytes)
            .map_err(|_| Error::SignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::Ed25519KeyPair;

    const SIGNING_INPUT: &str = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9.eyJmb28iOiJiYXIifQ";

    fn generate_key_pair() -> (Key, Key) {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let private = Key::ed25519_private_der(pkcs8.as_ref()).unwrap();
        let public = private.public_key();
        (private, public)
    }

    #[test]
    fn test_eddsa_round_trip() {
        let (private, public) = generate_key_pair();
        let signature = EDDSA.sign(SIGNING_INPUT, &private).unwrap();
        assert_eq!(base64url::decode_bytes(&signature).unwrap().len(), 64);
        assert!(EDDSA.verify(SIGNING_INPUT, &signature, &public).is_ok());
    }

    #[test]
    fn test_eddsa_is_deterministic() {
        let private = Key::ed25519_private_seed(&[42u8; 32]).unwrap();
        assert_eq!(
            EDDSA.sign(SIGNING_INPUT, &private).unwrap(),
            EDDSA.sign(SIGNING_INPUT, &private).unwrap()
        );
    }

    #[test]
    fn test_eddsa_wrong_key() {
        let (private, _) = generate_key_pair();
        let (_, other_public) = generate_key_pair();
        let signature = EDDSA.sign(SIGNING_INPUT, &private).unwrap();
        assert!(matches!(
            EDDSA.verify(SIGNING_INPUT, &signature, &other_public),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn test_eddsa_tampered_input() {
        let (private, public) = generate_key_pair();
        let signature = EDDSA.sign(SIGNING_INPUT, &private).unwrap();
        assert!(matches!(
            EDDSA.verify("eyJhbGciOiJFZERTQSJ9.e30", &signature, &public),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn test_eddsa_key_types() {
        let (private, _) = generate_key_pair();
        assert!(matches!(
            EDDSA.verify(SIGNING_INPUT, "", &private),
            Err(Error::InvalidKeyType { .. })
        ));
        assert!(matches!(
            EDDSA.sign(SIGNING_INPUT, &Key::symmetric(b"secret".to_vec())),
            Err(Error::InvalidKeyType { .. })
        ));
    }
}
