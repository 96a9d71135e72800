//! RSA-PSS signing methods (PS256, PS384, PS512)
//!
//! Signing always uses a salt as long as the hash output. Verification can
//! either demand that salt length or accept any salt length the signer chose,
//! since implementations disagree on the default: some sign with a
//! hash-length salt, others with the maximum the modulus allows.

use ::rsa::pss::Pss;
use ::rsa::traits::PublicKeyParts;
use ::rsa::BigUint;
use ring::signature::{self, RsaEncoding, RsaParameters};
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm::rsa::{sign_rsa, verify_rsa};
use crate::algorithm::{HashAlg, SigningMethod, SigningMethodRegistry};
use crate::error::{Error, Result};
use crate::keys::{Key, RsaPublicKey};
use crate::utils::base64url;

/// Modulus sizes accepted for verification, matching the fixed-salt path
const MODULUS_BITS: std::ops::RangeInclusive<usize> = 2048..=8192;

/// Salt length accepted when verifying a PSS signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PssSaltLength {
    /// Salt length must equal the hash output length
    EqualsHash,
    /// Any salt length is accepted; it is recovered from the signature
    #[default]
    Auto,
}

/// RSA-PSS signing method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaPss {
    name: &'static str,
    hash: HashAlg,
    verify_salt: PssSaltLength,
}

/// PS256 algorithm (RSA-PSS with SHA-256)
pub const PS256: RsaPss = RsaPss {
    name: "PS256",
    hash: HashAlg::Sha256,
    verify_salt: PssSaltLength::Auto,
};

/// PS384 algorithm (RSA-PSS with SHA-384)
pub const PS384: RsaPss = RsaPss {
    name: "PS384",
    hash: HashAlg::Sha384,
    verify_salt: PssSaltLength::Auto,
};

/// PS512 algorithm (RSA-PSS with SHA-512)
pub const PS512: RsaPss = RsaPss {
    name: "PS512",
    hash: HashAlg::Sha512,
    verify_salt: PssSaltLength::Auto,
};

/// Register PS256, PS384 and PS512 with auto-detected salt length
pub fn register(registry: &SigningMethodRegistry) {
    for method in [PS256, PS384, PS512] {
        registry.register(method.name, move || Box::new(method));
    }
}

impl RsaPss {
    /// Same algorithm with a different verification salt policy
    pub const fn with_verify_salt(mut self, salt: PssSaltLength) -> Self {
        self.verify_salt = salt;
        self
    }

    pub fn verify_salt(&self) -> PssSaltLength {
        self.verify_salt
    }

    fn encoding(&self) -> &'static dyn RsaEncoding {
        match self.hash {
            HashAlg::Sha256 => &signature::RSA_PSS_SHA256,
            HashAlg::Sha384 => &signature::RSA_PSS_SHA384,
            HashAlg::Sha512 => &signature::RSA_PSS_SHA512,
        }
    }

    fn parameters(&self) -> &'static RsaParameters {
        match self.hash {
            HashAlg::Sha256 => &signature::RSA_PSS_2048_8192_SHA256,
            HashAlg::Sha384 => &signature::RSA_PSS_2048_8192_SHA384,
            HashAlg::Sha512 => &signature::RSA_PSS_2048_8192_SHA512,
        }
    }

    fn verify_any_salt(
        &self,
        signing_input: &str,
        signature: &str,
        public: &RsaPublicKey,
    ) -> Result<()> {
        if !MODULUS_BITS.contains(&public.as_rsa().n().bits()) {
            return Err(Error::SignatureInvalid);
        }

        let signature_bytes = base64url::decode_bytes(signature)?;
        let salt_len = recover_salt_len(public, &signature_bytes, self.hash)
            .ok_or(Error::SignatureInvalid)?;

        let hashed = self.hash.digest(&[signing_input.as_bytes()]);
        let key = public.as_rsa();
        let scheme = match self.hash {
            HashAlg::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
            HashAlg::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
            HashAlg::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        };
        let result = key.verify(scheme, &hashed, &signature_bytes);
        result.map_err(|_| Error::SignatureInvalid)
    }
}

impl SigningMethod for RsaPss {
    fn alg(&self) -> &str {
        self.name
    }

    fn sign(&self, signing_input: &str, key: &Key) -> Result<String> {
        let private = key.as_rsa_private(self.name)?;
        sign_rsa(signing_input, private, self.encoding())
    }

    fn verify(&self, signing_input: &str, signature: &str, key: &Key) -> Result<()> {
        let public = key.as_rsa_public(self.name)?;
        match self.verify_salt {
            PssSaltLength::EqualsHash => {
                verify_rsa(signing_input, signature, public, self.parameters())
            }
            PssSaltLength::Auto => self.verify_any_salt(signing_input, signature, public),
        }
    }
}

/// Recover the salt length from the EMSA-PSS encoding inside `signature`
/// (RFC 8017 section 9.1.2). Returns `None` when the encoding is malformed;
/// the full check is left to the verifier.
fn recover_salt_len(public: &RsaPublicKey, signature: &[u8], hash: HashAlg) -> Option<usize> {
    let key = public.as_rsa();
    if signature.len() != key.size() {
        return None;
    }

    let n = key.n();
    let s = BigUint::from_bytes_be(signature);
    if &s >= n {
        return None;
    }
    let m = s.modpow(key.e(), n).to_bytes_be();

    let em_bits = n.bits().checked_sub(1)?;
    let em_len = em_bits.div_ceil(8);
    let h_len = hash.output_len();
    if m.len() > em_len || em_len < h_len + 2 {
        return None;
    }

    let mut em = vec![0u8; em_len - m.len()];
    em.extend_from_slice(&m);
    if em[em_len - 1] != 0xbc {
        return None;
    }

    let (masked_db, rest) = em.split_at(em_len - h_len - 1);
    let h = &rest[..h_len];

    let mut db = mgf1(hash, h, masked_db.len());
    for (d, m) in db.iter_mut().zip(masked_db) {
        *d ^= m;
    }
    db[0] &= 0xff >> (8 * em_len - em_bits);

    let separator = db.iter().position(|b| *b != 0)?;
    if db[separator] != 0x01 {
        return None;
    }
    Some(db.len() - separator - 1)
}

/// MGF1 mask generation (RFC 8017 appendix B.2.1)
fn mgf1(hash: HashAlg, seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len + hash.output_len());
    let mut counter: u32 = 0;
    while mask.len() < len {
        mask.extend(hash.digest(&[seed, &counter.to_be_bytes()[..]]));
        counter += 1;
    }
    mask.truncate(len);
    mask
}
