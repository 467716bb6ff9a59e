//! In-memory store

use std::collections::BTreeMap;

use beadline_hal::{KeyValueStore, StorageKey, StoreError};

/// Volatile store for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    namespace: String,
    entries: BTreeMap<StorageKey, Vec<u8>>,
    read_only: bool,
}

impl MemoryStore {
    /// Create an empty store for `namespace`
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            ..Self::default()
        }
    }

    /// Refuse every write
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Seed a payload directly
    pub fn insert(&mut self, key: StorageKey, data: impl Into<Vec<u8>>) {
        self.entries.insert(key, data.into());
    }

    /// Raw payload, if any
    pub fn get(&self, key: StorageKey) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }
}

impl KeyValueStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load(&mut self, key: StorageKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn save(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.insert(key, data.to_vec());
        Ok(())
    }
}
