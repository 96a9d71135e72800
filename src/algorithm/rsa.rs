use crate::algorithm::{HashAlg, SigningMethod, SigningMethodRegistry};
use crate::error::{Error, Result};
use crate::keys::{Key, RsaPrivateKey, RsaPublicKey};
use crate::utils::base64url;

use ring::rand::SystemRandom;
use ring::signature::{self, RsaEncoding, RsaParameters, RsaPublicKeyComponents};

/// RSA PKCS#1 v1.5 signing method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaPkcs1 {
    name: &'static str,
    hash: HashAlg,
}

/// RS256 algorithm (RSA with SHA-256)
pub const RS256: RsaPkcs1 = RsaPkcs1 {
    name: "RS256",
    hash: HashAlg::Sha256,
};

/// RS384 algorithm (RSA with SHA-384)
pub const RS384: RsaPkcs1 = RsaPkcs1 {
    name: "RS384",
    hash: HashAlg::Sha384,
};

/// RS512 algorithm (RSA with SHA-512)
pub const RS512: RsaPkcs1 = RsaPkcs1 {
    name: "RS512",
    hash: HashAlg::Sha512,
};

/// Register RS256, RS384 and RS512
pub fn register(registry: &SigningMethodRegistry) {
    for method in [RS256, RS384, RS512] {
        registry.register(method.name, move || Box::new(method));
    }
}

impl RsaPkcs1 {
    fn encoding(&self) -> &'static dyn RsaEncoding {
        match self.hash {
            HashAlg::Sha256 => &signature::RSA_PKCS1_SHA256,
            HashAlg::Sha384 => &signature::RSA_PKCS1_SHA384,
            HashAlg::Sha512 => &signature::RSA_PKCS1_SHA512,
        }
    }

    fn parameters(&self) -> &'static RsaParameters {
        match self.hash {
            HashAlg::Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            HashAlg::Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            HashAlg::Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }
}

impl SigningMethod for RsaPkcs1 {
    fn alg(&self) -> &str {
        self.name
    }

    fn sign(&self, signing_input: &str, key: &Key) -> Result<String> {
        let private = key.as_rsa_private(self.name)?;
        sign_rsa(signing_input, private, self.encoding())
    }

    fn verify(&self, signing_input: &str, signature: &str, key: &Key) -> Result<()> {
        let public = key.as_rsa_public(self.name)?;
        verify_rsa(signing_input, signature, public, self.parameters())
    }
}

/// RSA signing shared by the PKCS#1 v1.5 and PSS encodings
pub(crate) fn sign_rsa(
    signing_input: &str,
    private: &RsaPrivateKey,
    encoding: &'static dyn RsaEncoding,
) -> Result<String> {
    let pair = private.pair();
    let mut signature = vec![0u8; pair.public().modulus_len()];
    pair.sign(
        encoding,
        &SystemRandom::new(),
        signing_input.as_bytes(),
        &mut signature,
    )
    .map_err(|e| Error::Signing(format!("RSA signing failed: {e}")))?;
    Ok(base64url::encode_bytes(&signature))
}

/// Generic RSA signature verification
pub(crate) fn verify_rsa(
    signing_input: &str,
    signature: &str,
    public: &RsaPublicKey,
    parameters: &'static RsaParameters,
) -> Result<()> {
    // Decode the signature from Base64URL
    let signature_bytes = base64url::decode_bytes(signature)?;

    let components = RsaPublicKeyComponents {
        n: public.modulus(),
        e: public.exponent(),
    };

    components
        .verify(parameters, signing_input.as_bytes(), &signature_bytes)
        .map_err(|_| Error::SignatureInvalid)
}
