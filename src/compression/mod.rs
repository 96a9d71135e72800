//! Optional claims-segment compression
//!
//! A token may name a compression method in its `zip` header. The claims JSON
//! is compressed before encoding when signing, and decompressed after
//! decoding when parsing. Methods are looked up by name in a
//! [`CompressionRegistry`], with the same readers-writer discipline as the
//! signing method registry.
//!
//! Built-in methods:
//! - `none`: identity
//! - `gzip`: gzip container (RFC 1952), with the `compression` feature
//! - `DEF`: raw DEFLATE (RFC 1951), the JWE `zip` value, with the
//!   `compression` feature

#[cfg(feature = "compression")]
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "compression")]
use flate2::read::{DeflateDecoder, GzDecoder};
#[cfg(feature = "compression")]
use flate2::write::{DeflateEncoder, GzEncoder};
use tracing::trace;

use crate::error::{Error, Result};
use crate::utils::registry::Registry;

/// Upper bound on decompressed claims, so a tiny token cannot expand into
/// an unbounded allocation
pub const MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

/// A reversible transform applied to the claims segment
pub trait CompressionMethod: Send + Sync {
    /// Value written to the `zip` header
    fn name(&self) -> &str;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Identity transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoCompression;

/// gzip compression
#[cfg(feature = "compression")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gzip;

/// Raw DEFLATE compression
#[cfg(feature = "compression")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deflate;

impl CompressionMethod for NoCompression {
    fn name(&self) -> &str {
        "none"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

#[cfg(feature = "compression")]
impl CompressionMethod for Gzip {
    fn name(&self) -> &str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).map_err(compression_error)?;
        encoder.finish().map_err(compression_error)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        read_bounded(GzDecoder::new(data))
    }
}

#[cfg(feature = "compression")]
impl CompressionMethod for Deflate {
    fn name(&self) -> &str {
        "DEF"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).map_err(compression_error)?;
        encoder.finish().map_err(compression_error)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        read_bounded(DeflateDecoder::new(data))
    }
}

#[cfg(feature = "compression")]
fn read_bounded(decoder: impl Read) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    // Read one byte past the limit to tell "exactly at" from "over"
    decoder
        .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
        .read_to_end(&mut output)
        .map_err(compression_error)?;

    if output.len() > MAX_DECOMPRESSED_SIZE {
        return Err(Error::Compression(format!(
            "Decompressed claims exceed {MAX_DECOMPRESSED_SIZE} bytes"
        )));
    }
    Ok(output)
}

#[cfg(feature = "compression")]
fn compression_error(e: std::io::Error) -> Error {
    Error::Compression(e.to_string())
}

/// Thread-safe registry of compression methods
pub struct CompressionRegistry {
    methods: Registry<Arc<dyn CompressionMethod>>,
}

impl CompressionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            methods: Registry::new(),
        }
    }

    /// Registry holding `none`, plus `gzip` and `DEF` when compiled in
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(NoCompression));
        #[cfg(feature = "compression")]
        registry.register(Arc::new(Gzip));
        #[cfg(feature = "compression")]
        registry.register(Arc::new(Deflate));
        registry
    }

    /// The process-wide registry, built with [`with_defaults`](Self::with_defaults)
    /// on first use
    pub fn global() -> Arc<CompressionRegistry> {
        static GLOBAL: OnceLock<Arc<CompressionRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_defaults())))
    }

    /// Register a compression method under its own name
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered.
    pub fn register(&self, method: Arc<dyn CompressionMethod>) {
        if let Err(error) = self.try_register(method) {
            panic!("{error}");
        }
    }

    /// Register a compression method, failing on a duplicate name
    pub fn try_register(&self, method: Arc<dyn CompressionMethod>) -> Result<()> {
        let name = method.name().to_string();
        if self.methods.try_insert(&name, method) {
            trace!(name, "registered compression method");
            Ok(())
        } else {
            Err(Error::Compression(format!(
                "Compression method '{name}' is already registered"
            )))
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn CompressionMethod>> {
        self.methods.get(name)
    }

    /// Remove `name`. Removing an unregistered name is a no-op.
    pub fn remove(&self, name: &str) {
        self.methods.remove(name);
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        self.methods.names()
    }
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompressionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
