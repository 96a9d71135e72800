use crate::algorithm::{HashAlg, SigningMethod, SigningMethodRegistry};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::utils::base64url;

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

/// HMAC signing method (symmetric)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacSha {
    name: &'static str,
    hash: HashAlg,
}

/// HS256 algorithm (HMAC with SHA-256)
pub const HS256: HmacSha = HmacSha {
    name: "HS256",
    hash: HashAlg::Sha256,
};

/// HS384 algorithm (HMAC with SHA-384)
pub const HS384: HmacSha = HmacSha {
    name: "HS384",
    hash: HashAlg::Sha384,
};

/// HS512 algorithm (HMAC with SHA-512)
pub const HS512: HmacSha = HmacSha {
    name: "HS512",
    hash: HashAlg::Sha512,
};

/// Register HS256, HS384 and HS512
pub fn register(registry: &SigningMethodRegistry) {
    for method in [HS256, HS384, HS512] {
        registry.register(method.name, move || Box::new(method));
    }
}

impl HmacSha {
    fn secret<'k>(&self, key: &'k Key) -> Result<&'k [u8]> {
        let secret = key.as_symmetric(self.name)?.as_bytes();
        if secret.is_empty() {
            return Err(Error::InvalidKey("HMAC secret must not be empty".to_string()));
        }
        Ok(secret)
    }

    fn compute(&self, signing_input: &str, secret: &[u8]) -> Result<Vec<u8>> {
        match self.hash {
            HashAlg::Sha256 => mac::<Hmac<Sha256>>(signing_input, secret),
            HashAlg::Sha384 => mac::<Hmac<Sha384>>(signing_input, secret),
            HashAlg::Sha512 => mac::<Hmac<Sha512>>(signing_input, secret),
        }
    }
}

impl SigningMethod for HmacSha {
    fn alg(&self) -> &str {
        self.name
    }

    fn sign(&self, signing_input: &str, key: &Key) -> Result<String> {
        let secret = self.secret(key)?;
        let signature = self.compute(signing_input, secret)?;
        Ok(base64url::encode_bytes(&signature))
    }

    /// Verify signature with constant-time comparison
    fn verify(&self, signing_input: &str, signature: &str, key: &Key) -> Result<()> {
        let secret = self.secret(key)?;
        let provided_signature = base64url::decode_bytes(signature)?;
        let expected_signature = self.compute(signing_input, secret)?;

        if provided_signature.len() != expected_signature.len() {
            return Err(Error::SignatureInvalid);
        }

        if constant_time_eq(&provided_signature, &expected_signature) {
            Ok(())
        } else {
            Err(Error::SignatureInvalid)
        }
    }
}

fn mac<M: Mac + hmac::digest::KeyInit>(signing_input: &str, secret: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        <M as Mac>::new_from_slice(secret).map_err(|e| Error::InvalidKey(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
