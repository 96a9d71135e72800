mod traits;

#[cfg(feature = "eddsa")]
pub mod eddsa;
pub mod hmac;
pub mod none;
pub mod registry;
#[cfg(feature = "rsa")]
pub mod rsa;
#[cfg(feature = "rsa")]
pub mod rsa_pss;

#[cfg(feature = "eddsa")]
pub use eddsa::{EdDsa, EDDSA};
pub use hmac::{HmacSha, HS256, HS384, HS512};
pub use none::{NoneMethod, NONE};
pub use registry::{SigningMethodFactory, SigningMethodRegistry};
#[cfg(feature = "rsa")]
pub use rsa::{RsaPkcs1, RS256, RS384, RS512};
#[cfg(feature = "rsa")]
pub use rsa_pss::{PssSaltLength, RsaPss, PS256, PS384, PS512};
pub use traits::{BoxedSigningMethod, SigningMethod};

use std::str::FromStr;

#[cfg(feature = "rsa")]
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

/// Algorithm identifier from the token header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmId {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,

    /// RSA PKCS#1 v1.5 with SHA-256
    RS256,
    /// RSA PKCS#1 v1.5 with SHA-384
    RS384,
    /// RSA PKCS#1 v1.5 with SHA-512
    RS512,

    /// RSA-PSS with SHA-256
    PS256,
    /// RSA-PSS with SHA-384
    PS384,
    /// RSA-PSS with SHA-512
    PS512,

    /// Ed25519
    EdDSA,

    /// Unsigned token
    None,
}

/// Algorithm families sharing key types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Hmac,
    Rsa,
    RsaPss,
    EdDsa,
    None,
}

impl AlgorithmId {
    /// Every built-in algorithm, `none` last
    pub const ALL: [AlgorithmId; 11] = [
        AlgorithmId::HS256,
        AlgorithmId::HS384,
        AlgorithmId::HS512,
        AlgorithmId::RS256,
        AlgorithmId::RS384,
        AlgorithmId::RS512,
        AlgorithmId::PS256,
        AlgorithmId::PS384,
        AlgorithmId::PS512,
        AlgorithmId::EdDSA,
        AlgorithmId::None,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmId::HS256 => "HS256",
            AlgorithmId::HS384 => "HS384",
            AlgorithmId::HS512 => "HS512",
            AlgorithmId::RS256 => "RS256",
            AlgorithmId::RS384 => "RS384",
            AlgorithmId::RS512 => "RS512",
            AlgorithmId::PS256 => "PS256",
            AlgorithmId::PS384 => "PS384",
            AlgorithmId::PS512 => "PS512",
            AlgorithmId::EdDSA => "EdDSA",
            AlgorithmId::None => "none",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            AlgorithmId::HS256 | AlgorithmId::HS384 | AlgorithmId::HS512 => AlgorithmFamily::Hmac,
            AlgorithmId::RS256 | AlgorithmId::RS384 | AlgorithmId::RS512 => AlgorithmFamily::Rsa,
            AlgorithmId::PS256 | AlgorithmId::PS384 | AlgorithmId::PS512 => {
                AlgorithmFamily::RsaPss
            }
            AlgorithmId::EdDSA => AlgorithmFamily::EdDsa,
            AlgorithmId::None => AlgorithmFamily::None,
        }
    }

    /// Check if algorithm is HMAC-based (symmetric)
    pub fn is_symmetric(&self) -> bool {
        self.family() == AlgorithmFamily::Hmac
    }

    /// Check if algorithm is asymmetric (RSA/RSA-PSS/EdDSA)
    pub fn is_asymmetric(&self) -> bool {
        matches!(
            self.family(),
            AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss | AlgorithmFamily::EdDsa
        )
    }
}

impl FromStr for AlgorithmId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digest used by the HMAC and RSA families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HashAlg {
    Sha256,
    Sha384,
    Sha512,
}

#[cfg(feature = "rsa")]
impl HashAlg {
    pub(crate) fn output_len(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }

    /// Hash the concatenation of `parts`
    pub(crate) fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().to_vec()
        }

        match self {
            HashAlg::Sha256 => run::<Sha256>(parts),
            HashAlg::Sha384 => run::<Sha384>(parts),
            HashAlg::Sha512 => run::<Sha512>(parts),
        }
    }
}

/// Policy for allowed algorithms
///
/// Names are compared exactly. `none` is never part of a policy unless it is
/// listed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    allowed: Vec<String>,
}

impl AlgorithmPolicy {
    /// Create a policy that allows only specific algorithms
    pub fn allow_only(algorithms: impl IntoIterator<Item = AlgorithmId>) -> Self {
        Self::allow_names(algorithms.into_iter().map(|id| id.as_str()))
    }

    /// Create a policy from algorithm names, including custom registered ones
    pub fn allow_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut allowed: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !allowed.contains(&name) {
                allowed.push(name);
            }
        }
        Self { allowed }
    }

    /// Create a policy that allows every built-in signing algorithm except `none`
    pub fn allow_all() -> Self {
        Self::allow_only(
            AlgorithmId::ALL
                .into_iter()
                .filter(|id| *id != AlgorithmId::None),
        )
    }

    /// Policy that allows only HS256
    ///
    /// This is the recommended policy for HMAC-based validation when you control
    /// the signing key and algorithm.
    pub fn hs256_only() -> Self {
        Self::allow_only([AlgorithmId::HS256])
    }

    /// Policy that allows any HMAC algorithm (HS256, HS384, HS512)
    ///
    /// # Security Warning
    ///
    /// Using multiple HMAC variants with the same key is not recommended.
    /// Prefer algorithm-specific policies like [`hs256_only()`](Self::hs256_only).
    pub fn hmac_any() -> Self {
        Self::allow_only([AlgorithmId::HS256, AlgorithmId::HS384, AlgorithmId::HS512])
    }

    /// Policy that allows only RS256
    pub fn rs256_only() -> Self {
        Self::allow_only([AlgorithmId::RS256])
    }

    /// Policy that allows any RSA PKCS#1 v1.5 algorithm (RS256, RS384, RS512)
    pub fn rsa_any() -> Self {
        Self::allow_only([AlgorithmId::RS256, AlgorithmId::RS384, AlgorithmId::RS512])
    }

    /// Policy that allows any RSA-PSS algorithm (PS256, PS384, PS512)
    pub fn rsa_pss_any() -> Self {
        Self::allow_only([AlgorithmId::PS256, AlgorithmId::PS384, AlgorithmId::PS512])
    }

    /// Policy that allows only EdDSA
    pub fn eddsa_only() -> Self {
        Self::allow_only([AlgorithmId::EdDSA])
    }

    /// Policy that allows the asymmetric algorithms (RSA, RSA-PSS, EdDSA)
    pub fn asymmetric() -> Self {
        Self::allow_only(AlgorithmId::ALL.into_iter().filter(AlgorithmId::is_asymmetric))
    }

    /// Add the unsigned `none` algorithm to this policy
    ///
    /// # Security Warning
    ///
    /// Tokens declaring `alg: none` carry no signature. Only opt in when the
    /// transport already authenticates the token.
    pub fn with_unsecured_none(mut self) -> Self {
        if !self.is_allowed(AlgorithmId::None.as_str()) {
            self.allowed.push(AlgorithmId::None.as_str().to_string());
        }
        self
    }

    /// Check if an algorithm is allowed
    pub fn is_allowed(&self, algorithm: &str) -> bool {
        self.allowed.iter().any(|a| a == algorithm)
    }

    /// Validate algorithm against policy
    pub fn validate(&self, algorithm: &str) -> Result<()> {
        if self.is_allowed(algorithm) {
            Ok(())
        } else {
            Err(Error::AlgorithmNotAllowed {
                found: algorithm.to_string(),
                allowed: self.allowed.clone(),
            })
        }
    }

    /// Get list of allowed algorithms
    pub fn allowed_algorithms(&self) -> &[String] {
        &self.allowed
    }
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_from_str() {
        assert!(matches!(
            "UNKNOWN".parse::<AlgorithmId>(),
            Err(Error::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            "hs256".parse::<AlgorithmId>(),
            Err(Error::UnknownAlgorithm(_))
        ));

        for id in AlgorithmId::ALL {
            assert_eq!(id.as_str().parse::<AlgorithmId>().unwrap(), id);
        }
        assert_eq!("none".parse::<AlgorithmId>().unwrap(), AlgorithmId::None);
        assert_eq!("EdDSA".parse::<AlgorithmId>().unwrap(), AlgorithmId::EdDSA);
    }

    #[test]
    fn test_algorithm_families() {
        assert!(AlgorithmId::HS384.is_symmetric());
        assert!(AlgorithmId::PS256.is_asymmetric());
        assert!(AlgorithmId::EdDSA.is_asymmetric());
        assert!(!AlgorithmId::None.is_symmetric());
        assert!(!AlgorithmId::None.is_asymmetric());
        assert_eq!(AlgorithmId::RS512.family(), AlgorithmFamily::Rsa);
    }

    #[test]
    fn test_algorithm_policy() {
        let policy = AlgorithmPolicy::allow_only([AlgorithmId::HS256]);
        assert!(policy.is_allowed("HS256"));
        assert!(!policy.is_allowed("HS384"));
        assert!(policy.validate("HS256").is_ok());
        assert!(matches!(
            policy.validate("HS384"),
            Err(Error::AlgorithmNotAllowed { .. })
        ));
    }

    #[test]
    fn test_allow_all_excludes_none() {
        let policy = AlgorithmPolicy::allow_all();
        assert_eq!(policy.allowed_algorithms().len(), 10);
        assert!(!policy.is_allowed("none"));
        assert!(policy.clone().with_unsecured_none().is_allowed("none"));
        assert!(!AlgorithmPolicy::asymmetric().is_allowed("HS256"));
    }

    #[test]
    fn test_allow_names_deduplicates() {
        let policy = AlgorithmPolicy::allow_names(["HS256", "HS256", "custom"]);
        assert_eq!(policy.allowed_algorithms(), ["HS256", "custom"]);
    }

    #[test]
    #[cfg(feature = "rsa")]
    fn test_hash_output_len() {
        for hash in [HashAlg::Sha256, HashAlg::Sha384, HashAlg::Sha512] {
            assert_eq!(hash.digest(&[b"abc"]).len(), hash.output_len());
        }
        assert_eq!(
            HashAlg::Sha256.digest(&[b"a", b"bc"]),
            HashAlg::Sha256.digest(&[b"abc"])
        );
    }
}
