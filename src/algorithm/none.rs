use crate::algorithm::{SigningMethod, SigningMethodRegistry};
use crate::error::{Error, Result};
use crate::keys::Key;

/// The unsigned `none` algorithm
///
/// Signs to the empty string and accepts only an empty signature. The parser
/// rejects `alg: none` unless the caller's algorithm policy lists it, so having
/// this method registered does not by itself make unsigned tokens acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoneMethod;

/// `none` algorithm
pub const NONE: NoneMethod = NoneMethod;

/// Register `none`
pub fn register(registry: &SigningMethodRegistry) {
    registry.register(NONE.alg(), || Box::new(NONE));
}

impl SigningMethod for NoneMethod {
    fn alg(&self) -> &str {
        "none"
    }

    fn sign(&self, _signing_input: &str, _key: &Key) -> Result<String> {
        Ok(String::new())
    }

    fn verify(&self, _signing_input: &str, signature: &str, _key: &Key) -> Result<()> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(Error::SignatureInvalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_signs_empty() {
        let key = Key::symmetric(b"ignored".to_vec());
        assert_eq!(NONE.sign("a.b", &key).unwrap(), "");
    }

    #[test]
    fn test_none_verifies_only_empty_signature() {
        let key = Key::symmetric(b"ignored".to_vec());
        assert!(NONE.verify("a.b", "", &key).is_ok());
        assert!(matches!(
            NONE.verify("a.b", "c2ln", &key),
            Err(Error::SignatureInvalid)
        ));
    }
}
