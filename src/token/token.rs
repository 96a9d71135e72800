use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::algorithm::SigningMethod;
use crate::claims::{Claims, MapClaims};
use crate::compression::CompressionMethod;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::token::Header;
use crate::utils::base64url;

/// A token, either being built for signing or returned by the parser
///
/// A parsed token is only authenticated when [`Token::valid`] is `true`.
/// The parser also hands back rejected tokens (inside
/// [`ParseError`](crate::ParseError)) for diagnostics; those always report
/// `valid() == false` and their header and claims must not be trusted.
pub struct Token<C = MapClaims> {
    raw: String,
    header: Header,
    claims: C,
    signature: String,
    valid: bool,
    method: Option<Arc<dyn SigningMethod>>,
    compression: Option<Arc<dyn CompressionMethod>>,
}

impl<C: Claims> Token<C> {
    /// Start a token signed with `method`
    ///
    /// The header gets `typ: "JWT"` and the method's `alg`.
    ///
    /// # Example
    /// ```ignore
    /// let token = Token::new(HS256, MapClaims::new().with("sub", "user"));
    /// let compact = token.signed_string(&Key::symmetric(b"secret".to_vec()))?;
    /// ```
    pub fn new<M>(method: M, claims: C) -> Self
    where
        M: SigningMethod + 'static,
    {
        Self::with_method(Arc::new(method), claims)
    }

    /// Start a token signed with a shared method, such as one from a registry
    pub fn with_method(method: Arc<dyn SigningMethod>, claims: C) -> Self {
        let mut header = Header::new();
        header.insert("typ", "JWT");
        header.insert("alg", method.alg());

        Self {
            raw: String::new(),
            header,
            claims,
            signature: String::new(),
            valid: false,
            method: Some(method),
            compression: None,
        }
    }

    /// Compress the claims segment and record the method in `zip`
    pub fn with_compression(mut self, compression: Arc<dyn CompressionMethod>) -> Self {
        self.header.insert("zip", compression.name());
        self.compression = Some(compression);
        self
    }

    /// Add or replace a header field
    ///
    /// `alg` and `zip` are owned by the signing and compression methods;
    /// setting them here changes what is declared, not what is applied.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header.insert(name, value);
        self
    }

    /// The first two segments: `base64url(header) "." base64url(claims)`
    pub fn signing_string(&self) -> Result<String> {
        let header = serde_json::to_vec(&self.header)
            .map_err(|e| Error::InvalidJson(format!("Failed to encode header: {e}")))?;
        let mut claims = serde_json::to_vec(&self.claims)
            .map_err(|e| Error::InvalidJson(format!("Failed to encode claims: {e}")))?;

        if let Some(compression) = &self.compression {
            claims = compression.compress(&claims)?;
        }

        Ok(format!(
            "{}.{}",
            base64url::encode_bytes(&header),
            base64url::encode_bytes(&claims)
        ))
    }

    /// Full compact serialisation, signed with `key`
    pub fn signed_string(&self, key: &Key) -> Result<String> {
        let method = self
            .method
            .as_ref()
            .ok_or_else(|| Error::UnknownAlgorithm(self.header.alg().unwrap_or_default().to_string()))?;

        let signing_string = self.signing_string()?;
        let signature = method.sign(&signing_string, key)?;
        Ok(format!("{signing_string}.{signature}"))
    }
}

impl<C> Token<C> {
    pub(crate) fn parsed(raw: &str, header: Header, claims: C, signature: &str) -> Self {
        Self {
            raw: raw.to_string(),
            header,
            claims,
            signature: signature.to_string(),
            valid: false,
            method: None,
            compression: None,
        }
    }

    pub(crate) fn set_method(&mut self, method: Arc<dyn SigningMethod>) {
        self.method = Some(method);
    }

    pub(crate) fn set_compression(&mut self, compression: Arc<dyn CompressionMethod>) {
        self.compression = Some(compression);
    }

    pub(crate) fn mark_valid(&mut self) {
        self.valid = true;
    }

    /// The compact string this token was parsed from; empty when built locally
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &C {
        &self.claims
    }

    pub fn into_claims(self) -> C {
        self.claims
    }

    /// Base64url signature segment as received
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// `true` only after every pipeline check passed
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Signing method resolved from `alg`
    pub fn method(&self) -> Option<&dyn SigningMethod> {
        self.method.as_deref()
    }

    pub fn compression(&self) -> Option<&dyn CompressionMethod> {
        self.compression.as_deref()
    }
}

impl<C: Clone> Clone for Token<C> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            header: self.header.clone(),
            claims: self.claims.clone(),
            signature: self.signature.clone(),
            valid: self.valid,
            method: self.method.clone(),
            compression: self.compression.clone(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Token<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("header", &self.header)
            .field("claims", &self.claims)
            .field("valid", &self.valid)
            .field("method", &self.method.as_ref().map(|m| m.alg()))
            .field("compression", &self.compression.as_ref().map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

/// Key resolution for a single known method and key
///
/// The returned callback hands out `key` only when the token declares `alg`,
/// and fails otherwise.
///
/// # Example
/// ```ignore
/// let token = parse(raw, known_keyfunc("HS256", Key::symmetric(b"secret".to_vec())))?;
/// ```
pub fn known_keyfunc<C>(alg: &str, key: Key) -> impl Fn(&Token<C>) -> Result<Key> {
    let expected = alg.to_string();
    move |token: &Token<C>| match token.header().alg() {
        Some(found) if found == expected => Ok(key.clone()),
        found => Err(Error::KeyResolution(format!(
            "expected algorithm {expected}, token declares {}",
            found.unwrap_or("nothing")
        ))),
    }
}
