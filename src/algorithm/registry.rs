//! Algorithm name → signing method lookup
//!
//! A registry maps the `alg` header value to a factory producing the
//! [`SigningMethod`] for it. Lookups never insert: an unknown name is simply
//! `None`, which the parser reports as unverifiable.
//!
//! The process-wide instance returned by [`SigningMethodRegistry::global`]
//! holds every built-in algorithm. Parsers accept any registry, so tests and
//! embedders can run with a private one.

use std::sync::{Arc, OnceLock};

use tracing::trace;

#[cfg(feature = "eddsa")]
use crate::algorithm::eddsa;
#[cfg(feature = "rsa")]
use crate::algorithm::{rsa, rsa_pss};
use crate::algorithm::{hmac, none, SigningMethod};
use crate::error::{Error, Result};
use crate::utils::registry::Registry;

/// Produces a fresh signing method instance on each lookup
pub type SigningMethodFactory = Arc<dyn Fn() -> Box<dyn SigningMethod> + Send + Sync>;

/// Thread-safe registry of signing methods
pub struct SigningMethodRegistry {
    methods: Registry<SigningMethodFactory>,
}

impl SigningMethodRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            methods: Registry::new(),
        }
    }

    /// Registry holding every built-in algorithm compiled in, `none` included
    ///
    /// `none` is only ever accepted by a parser whose allow-list names it.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        hmac::register(&registry);
        #[cfg(feature = "rsa")]
        rsa::register(&registry);
        #[cfg(feature = "rsa")]
        rsa_pss::register(&registry);
        #[cfg(feature = "eddsa")]
        eddsa::register(&registry);
        none::register(&registry);
        registry
    }

    /// The process-wide registry, built with [`with_defaults`](Self::with_defaults)
    /// on first use
    pub fn global() -> Arc<SigningMethodRegistry> {
        static GLOBAL: OnceLock<Arc<SigningMethodRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_defaults())))
    }

    /// Register a signing method factory
    ///
    /// # Panics
    ///
    /// Panics if `alg` is already registered. Replacing an algorithm at
    /// runtime would let one implementation silently stand in for another.
    /// Use [`try_register`](Self::try_register) to handle the conflict instead.
    pub fn register<F>(&self, alg: &str, factory: F)
    where
        F: Fn() -> Box<dyn SigningMethod> + Send + Sync + 'static,
    {
        if let Err(error) = self.try_register(alg, factory) {
            panic!("{error}");
        }
    }

    /// Register a signing method factory, failing on a duplicate name
    ///
    /// On failure the existing registration is left untouched.
    pub fn try_register<F>(&self, alg: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn SigningMethod> + Send + Sync + 'static,
    {
        if self.methods.try_insert(alg, Arc::new(factory)) {
            trace!(alg, "registered signing method");
            Ok(())
        } else {
            Err(Error::DuplicateAlgorithm(alg.to_string()))
        }
    }

    /// Instantiate the signing method registered for `alg`
    pub fn lookup(&self, alg: &str) -> Option<Box<dyn SigningMethod>> {
        self.methods.get(alg).map(|factory| factory())
    }

    pub fn contains(&self, alg: &str) -> bool {
        self.methods.contains(alg)
    }

    /// Remove `alg`. Removing an unregistered name is a no-op.
    pub fn remove(&self, alg: &str) {
        if self.methods.remove(alg) {
            trace!(alg, "removed signing method");
        }
    }

    /// Registered algorithm names, sorted
    pub fn algorithms(&self) -> Vec<String> {
        self.methods.names()
    }
}

impl Default for SigningMethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SigningMethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMethodRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}
