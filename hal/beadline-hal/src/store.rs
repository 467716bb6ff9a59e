//! Persistent key-value storage abstractions
//!
//! Provides the trait for durable storage of run state that must survive a
//! process restart (tip cursors, waste fill). Each store is scoped to one
//! protocol station's namespace; keys never collide across stations.

use thiserror::Error;

/// Storage keys for persisted run state
///
/// The payload format for each key is owned by the layer that writes it;
/// the store only moves bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// Per-role tip cursor counts
    TipLog,
    /// Waste receptacle fill counter and drop-side toggle
    WasteLog,
}

impl StorageKey {
    /// Stable name used by file-backed stores
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::TipLog => "tip_log",
            StorageKey::WasteLog => "waste_log",
        }
    }
}

/// Errors from storage operations
///
/// A missing key is not an error: `load` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Store refuses writes (e.g. read-only medium)
    #[error("storage is read-only")]
    ReadOnly,
}

/// Namespaced key-value storage
///
/// Implementations should make `save` atomic where the medium allows it, so
/// an interrupted write leaves either the old or the new payload.
pub trait KeyValueStore {
    /// Namespace this store is scoped to (one per protocol station)
    fn namespace(&self) -> &str;

    /// Read the payload stored under `key`
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&mut self, key: StorageKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the payload stored under `key`
    fn save(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StoreError>;

    /// Check if a key exists in storage
    fn exists(&mut self, key: StorageKey) -> bool {
        matches!(self.load(key), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(StorageKey::TipLog.as_str(), "tip_log");
        assert_eq!(StorageKey::WasteLog.as_str(), "waste_log");
    }
}
