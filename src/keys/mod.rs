/// Key material handed to signing methods
///
/// This module provides a type-safe abstraction over the supported key types:
/// - Symmetric secrets (HMAC)
/// - RSA public keys and key pairs (RSA PKCS#1 v1.5 and RSA-PSS)
/// - Ed25519 public keys and key pairs (EdDSA)
///
/// Signing requires a private key, verification a public key. Passing the
/// wrong kind yields [`Error::InvalidKeyType`]; use [`Key::public_key`] to
/// derive the verification key from a key pair.
use std::fmt;
#[cfg(any(feature = "rsa", feature = "eddsa"))]
use std::sync::Arc;

#[cfg(feature = "eddsa")]
use ring::signature::{Ed25519KeyPair, KeyPair};
#[cfg(feature = "rsa")]
use ring::signature::RsaKeyPair;
#[cfg(feature = "rsa")]
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
#[cfg(feature = "rsa")]
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey};
#[cfg(feature = "rsa")]
use rsa::traits::PublicKeyParts;
#[cfg(feature = "eddsa")]
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::error::{Error, Result};

/// Ed25519 algorithm identifier (RFC 8410)
#[cfg(feature = "eddsa")]
const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

#[cfg(feature = "eddsa")]
/// Ed25519 public key length in bytes
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// A key that can be used to sign or verify a token
#[derive(Debug, Clone)]
pub enum Key {
    /// Shared secret for HMAC algorithms
    Symmetric(SymmetricKey),

    /// RSA public key (verification)
    #[cfg(feature = "rsa")]
    RsaPublic(RsaPublicKey),

    /// RSA key pair (signing)
    #[cfg(feature = "rsa")]
    RsaPrivate(RsaPrivateKey),

    /// Ed25519 public key (verification)
    #[cfg(feature = "eddsa")]
    Ed25519Public(Ed25519PublicKey),

    /// Ed25519 key pair (signing)
    #[cfg(feature = "eddsa")]
    Ed25519Private(Ed25519PrivateKey),
}

impl Key {
    /// Create a symmetric key from bytes
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Self {
        Key::Symmetric(SymmetricKey::new(secret.into()))
    }

    /// RSA public key from PEM (`PUBLIC KEY` or `RSA PUBLIC KEY`)
    #[cfg(feature = "rsa")]
    pub fn rsa_public_pem(pem: &str) -> Result<Self> {
        RsaPublicKey::from_pem(pem).map(Key::RsaPublic)
    }

    /// RSA public key from DER (SubjectPublicKeyInfo or PKCS#1)
    #[cfg(feature = "rsa")]
    pub fn rsa_public_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_der(der).map(Key::RsaPublic)
    }

    /// RSA key pair from PEM (`PRIVATE KEY` or `RSA PRIVATE KEY`)
    #[cfg(feature = "rsa")]
    pub fn rsa_private_pem(pem: &str) -> Result<Self> {
        RsaPrivateKey::from_pem(pem).map(Key::RsaPrivate)
    }

    /// RSA key pair from DER (PKCS#8 or PKCS#1)
    #[cfg(feature = "rsa")]
    pub fn rsa_private_der(der: &[u8]) -> Result<Self> {
        RsaPrivateKey::from_der(der).map(Key::RsaPrivate)
    }

    /// RSA key pair from an in-memory `rsa` key
    #[cfg(feature = "rsa")]
    pub fn rsa_private(key: &rsa::RsaPrivateKey) -> Result<Self> {
        RsaPrivateKey::from_rsa(key).map(Key::RsaPrivate)
    }

    /// Ed25519 public key from its 32 raw bytes
    #[cfg(feature = "eddsa")]
    pub fn ed25519_public(bytes: &[u8]) -> Result<Self> {
        Ed25519PublicKey::from_bytes(bytes).map(Key::Ed25519Public)
    }

    /// Ed25519 public key from a `PUBLIC KEY` PEM block
    #[cfg(feature = "eddsa")]
    pub fn ed25519_public_pem(pem: &str) -> Result<Self> {
        Ed25519PublicKey::from_pem(pem).map(Key::Ed25519Public)
    }

    /// Ed25519 key pair from a 32-byte seed
    #[cfg(feature = "eddsa")]
    pub fn ed25519_private_seed(seed: &[u8]) -> Result<Self> {
        Ed25519PrivateKey::from_seed(seed).map(Key::Ed25519Private)
    }

    /// Ed25519 key pair from PKCS#8 DER
    #[cfg(feature = "eddsa")]
    pub fn ed25519_private_der(der: &[u8]) -> Result<Self> {
        Ed25519PrivateKey::from_pkcs8_der(der).map(Key::Ed25519Private)
    }

    /// Ed25519 key pair from a `PRIVATE KEY` PEM block
    #[cfg(feature = "eddsa")]
    pub fn ed25519_private_pem(pem: &str) -> Result<Self> {
        Ed25519PrivateKey::from_pem(pem).map(Key::Ed25519Private)
    }

    /// Get key type name for error messages
    pub fn key_type(&self) -> &'static str {
        match self {
            Key::Symmetric(_) => "Symmetric",
            #[cfg(feature = "rsa")]
            Key::RsaPublic(_) => "RSA public",
            #[cfg(feature = "rsa")]
            Key::RsaPrivate(_) => "RSA private",
            #[cfg(feature = "eddsa")]
            Key::Ed25519Public(_) => "Ed25519 public",
            #[cfg(feature = "eddsa")]
            Key::Ed25519Private(_) => "Ed25519 private",
        }
    }

    /// The verification key matching this key
    ///
    /// Public and symmetric keys are returned as-is.
    pub fn public_key(&self) -> Key {
        match self {
            #[cfg(feature = "rsa")]
            Key::RsaPrivate(key) => Key::RsaPublic(key.public().clone()),
            #[cfg(feature = "eddsa")]
            Key::Ed25519Private(key) => Key::Ed25519Public(key.public()),
            other => other.clone(),
        }
    }

    /// Get as symmetric key or return error
    pub fn as_symmetric(&self, algorithm: &str) -> Result<&SymmetricKey> {
        match self {
            Key::Symmetric(key) => Ok(key),
            _ => Err(self.mismatch(algorithm, "Symmetric")),
        }
    }

    /// Get as RSA public key or return error
    #[cfg(feature = "rsa")]
    pub fn as_rsa_public(&self, algorithm: &str) -> Result<&RsaPublicKey> {
        match self {
            Key::RsaPublic(key) => Ok(key),
            _ => Err(self.mismatch(algorithm, "RSA public")),
        }
    }

    /// Get as RSA key pair or return error
    #[cfg(feature = "rsa")]
    pub fn as_rsa_private(&self, algorithm: &str) -> Result<&RsaPrivateKey> {
        match self {
            Key::RsaPrivate(key) => Ok(key),
            _ => Err(self.mismatch(algorithm, "RSA private")),
        }
    }

    /// Get as Ed25519 public key or return error
    #[cfg(feature = "eddsa")]
    pub fn as_ed25519_public(&self, algorithm: &str) -> Result<&Ed25519PublicKey> {
        match self {
            Key::Ed25519Public(key) => Ok(key),
            _ => Err(self.mismatch(algorithm, "Ed25519 public")),
        }
    }

    /// Get as Ed25519 key pair or return error
    #[cfg(feature = "eddsa")]
    pub fn as_ed25519_private(&self, algorithm: &str) -> Result<&Ed25519PrivateKey> {
        match self {
            Key::Ed25519Private(key) => Ok(key),
            _ => Err(self.mismatch(algorithm, "Ed25519 private")),
        }
    }

    fn mismatch(&self, algorithm: &str, expected: &str) -> Error {
        Error::InvalidKeyType {
            algorithm: algorithm.to_string(),
            expected: expected.to_string(),
            actual: self.key_type().to_string(),
        }
    }
}

/// Symmetric key for HMAC algorithms
#[derive(Clone)]
pub struct SymmetricKey {
    secret: Vec<u8>,
}

impl SymmetricKey {
    /// Create a new symmetric key
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Get the secret bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("len", &self.secret.len())
            .finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for SymmetricKey {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

impl From<&[u8]> for SymmetricKey {
    fn from(secret: &[u8]) -> Self {
        Self::new(secret.to_vec())
    }
}

impl From<&str> for SymmetricKey {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes().to_vec())
    }
}

/// RSA public key
///
/// Keeps the parsed key alongside its big-endian modulus and exponent, which
/// is the form the verifier consumes.
#[cfg(feature = "rsa")]
#[derive(Debug, Clone)]
pub struct RsaPublicKey {
    inner: rsa::RsaPublicKey,
    n: Vec<u8>,
    e: Vec<u8>,
}

#[cfg(feature = "rsa")]
impl RsaPublicKey {
    pub fn from_pem(pem: &str) -> Result<Self> {
        rsa::RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| rsa::RsaPublicKey::from_pkcs1_pem(pem))
            .map(Self::from)
            .map_err(|e| Error::InvalidKey(format!("RSA public key PEM: {e}")))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        rsa::RsaPublicKey::from_public_key_der(der)
            .or_else(|_| rsa::RsaPublicKey::from_pkcs1_der(der))
            .map(Self::from)
            .map_err(|e| Error::InvalidKey(format!("RSA public key DER: {e}")))
    }

    /// Modulus, big-endian
    pub fn modulus(&self) -> &[u8] {
        &self.n
    }

    /// Public exponent, big-endian
    pub fn exponent(&self) -> &[u8] {
        &self.e
    }

    /// Modulus length in bytes
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn as_rsa(&self) -> &rsa::RsaPublicKey {
        &self.inner
    }
}

#[cfg(feature = "rsa")]
impl From<rsa::RsaPublicKey> for RsaPublicKey {
    fn from(inner: rsa::RsaPublicKey) -> Self {
        let n = inner.n().to_bytes_be();
        let e = inner.e().to_bytes_be();
        Self { inner, n, e }
    }
}

/// RSA key pair
#[cfg(feature = "rsa")]
#[derive(Debug, Clone)]
pub struct RsaPrivateKey {
    pair: Arc<RsaKeyPair>,
    public: RsaPublicKey,
}

#[cfg(feature = "rsa")]
impl RsaPrivateKey {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| rsa::RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| Error::InvalidKey(format!("RSA private key PEM: {e}")))?;
        Self::from_rsa(&key)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let key = rsa::RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| rsa::RsaPrivateKey::from_pkcs1_der(der))
            .map_err(|e| Error::InvalidKey(format!("RSA private key DER: {e}")))?;
        Self::from_rsa(&key)
    }

    /// Build from an in-memory key. The modulus must be 2048 to 8192 bits.
    pub fn from_rsa(key: &rsa::RsaPrivateKey) -> Result<Self> {
        let pkcs8 = key
            .to_pkcs8_der()
            .map_err(|e| Error::InvalidKey(format!("RSA private key encoding: {e}")))?;
        let pair = RsaKeyPair::from_pkcs8(pkcs8.as_bytes())
            .map_err(|e| Error::InvalidKey(format!("RSA private key rejected: {e}")))?;

        Ok(Self {
            pair: Arc::new(pair),
            public: RsaPublicKey::from(key.to_public_key()),
        })
    }

    pub(crate) fn pair(&self) -> &RsaKeyPair {
        &self.pair
    }

    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }
}

/// Ed25519 public key
#[cfg(feature = "eddsa")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519PublicKey([u8; ED25519_PUBLIC_KEY_LEN]);

#[cfg(feature = "eddsa")]
impl Ed25519PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; ED25519_PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "Ed25519 public key must be {ED25519_PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Parse a DER SubjectPublicKeyInfo carrying an Ed25519 key
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let info = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::InvalidKey(format!("Ed25519 public key DER: {e}")))?;
        if info.algorithm.oid != ED25519_OID {
            return Err(Error::InvalidKey(format!(
                "not an Ed25519 key (algorithm {})",
                info.algorithm.oid
            )));
        }
        let raw = info
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| Error::InvalidKey("Ed25519 public key bits".to_string()))?;
        Self::from_bytes(raw)
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        let (_, doc) = spki::Document::from_pem(pem)
            .map_err(|e| Error::InvalidKey(format!("Ed25519 public key PEM: {e}")))?;
        Self::from_der(doc.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_LEN] {
        &self.0
    }
}

/// Ed25519 key pair
#[cfg(feature = "eddsa")]
#[derive(Debug, Clone)]
pub struct Ed25519PrivateKey {
    pair: Arc<Ed25519KeyPair>,
}

#[cfg(feature = "eddsa")]
impl Ed25519PrivateKey {
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let pair = Ed25519KeyPair::from_seed_unchecked(seed)
            .map_err(|e| Error::InvalidKey(format!("Ed25519 seed: {e}")))?;
        Ok(Self {
            pair: Arc::new(pair),
        })
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
            .map_err(|e| Error::InvalidKey(format!("Ed25519 private key DER: {e}")))?;
        Ok(Self {
            pair: Arc::new(pair),
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        let (_, doc) = pkcs8::SecretDocument::from_pem(pem)
            .map_err(|e| Error::InvalidKey(format!("Ed25519 private key PEM: {e}")))?;
        Self::from_pkcs8_der(doc.as_bytes())
    }

    pub(crate) fn pair(&self) -> &Ed25519KeyPair {
        &self.pair
    }

    pub fn public(&self) -> Ed25519PublicKey {
        let mut raw = [0u8; ED25519_PUBLIC_KEY_LEN];
        raw.copy_from_slice(self.pair.public_key().as_ref());
        Ed25519PublicKey(raw)
    }
}
