//! File-backed store
//!
//! One file per key under `<root>/<namespace>/`, named after the key with
//! a `.json` extension. Writes go to a temporary file that is renamed over
//! the old one, so an interrupted save keeps the previous payload.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use beadline_hal::{KeyValueStore, StorageKey, StoreError};

/// Store rooted at a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    namespace: String,
    dir: PathBuf,
}

impl FileStore {
    /// Open the store for `namespace` under `root`
    ///
    /// Directories are created lazily on the first save.
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            dir: root.as_ref().join(namespace),
        }
    }

    /// Directory holding this namespace's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load(&mut self, key: StorageKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path(key);
        match fs::read(&path) {
            Ok(data) => {
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}
