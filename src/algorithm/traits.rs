use crate::error::Result;
use crate::keys::Key;

/// Core trait that every token signing algorithm implements
///
/// Implementations are stateless and shared freely across threads.
/// Signatures cross this trait Base64URL-encoded, exactly as they appear in
/// the third token segment.
pub trait SigningMethod: Send + Sync {
    /// The algorithm identifier written to the `alg` header (e.g. "HS256")
    fn alg(&self) -> &str;

    /// Sign `signing_input` (header.payload) and return the encoded signature
    fn sign(&self, signing_input: &str, key: &Key) -> Result<String>;

    /// Verify a signature
    ///
    /// # Arguments
    /// * `signing_input` - The data that was signed (header.payload)
    /// * `signature` - The Base64URL-encoded signature
    /// * `key` - The key to use for verification
    fn verify(&self, signing_input: &str, signature: &str, key: &Key) -> Result<()>;
}

/// Type alias for boxed signing method trait objects
pub type BoxedSigningMethod = Box<dyn SigningMethod>;
