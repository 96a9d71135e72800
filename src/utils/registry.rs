//! Name-keyed container shared by the signing and compression registries
//!
//! Readers take a shared lock and clone the stored value out; writers take
//! the exclusive lock for the whole check-and-insert, so two threads racing
//! to register the same name cannot both succeed.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub(crate) struct Registry<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V: Clone> Registry<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert `value` under `name` unless the name is already taken.
    ///
    /// Returns `false` and leaves the existing entry untouched on conflict.
    pub(crate) fn try_insert(&self, name: &str, value: V) -> bool {
        let mut entries = self.write();
        if entries.contains_key(name) {
            return false;
        }
        entries.insert(name.to_string(), value);
        true
    }

    pub(crate) fn get(&self, name: &str) -> Option<V> {
        self.read().get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Remove `name`; removing an absent name is a no-op.
    pub(crate) fn remove(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    /// Registered names in sorted order
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    // A panic while holding the lock cannot leave the map half-written
    // (every mutation is a single insert/remove), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
