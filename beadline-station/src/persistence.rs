//! Run-state persistence
//!
//! Converts tip cursors and the waste estimate to and from the bytes a
//! [`KeyValueStore`] holds. Reads never fail: anything missing, unreadable
//! or malformed degrades to the zero state with a warning, so a damaged
//! log costs at most a rack of tips, never a run.
//!
//! Payloads are JSON. The tip log maps role names to consumed counts
//! (`{"tips300": 40}`); the waste log holds the fill estimate and the
//! next drop side (`{"count": 320, "toggle": false}`).

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use beadline_core::tips::PersistedTipState;
use beadline_core::waste::WasteCounter;
use beadline_hal::{KeyValueStore, StorageKey, StoreError};

/// Persistence write errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Store refused or failed the write
    #[error(transparent)]
    Store(#[from] StoreError),
    /// State could not be encoded
    #[error("cannot encode run state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load the tip log
///
/// Returns `None` when nothing usable is stored. Individual entries that
/// are not counts decode as 0 without discarding the rest.
pub fn load_tip_state(store: &mut dyn KeyValueStore) -> Option<PersistedTipState> {
    let bytes = read(store, StorageKey::TipLog)?;
    match serde_json::from_slice::<Map<String, Value>>(&bytes) {
        Ok(entries) => {
            let state = decode_tip_entries(entries);
            info!("Restored tip counts for {} roles", state.counts.len());
            Some(state)
        }
        Err(e) => {
            warn!("Tip log is not a JSON object ({}), starting from zero", e);
            None
        }
    }
}

fn decode_tip_entries(entries: Map<String, Value>) -> PersistedTipState {
    let counts = entries
        .into_iter()
        .map(|(role, value)| {
            let count = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or_else(|| {
                    warn!("Tip log entry `{}` = {} is not a count, using 0", role, value);
                    0
                });
            (role, count)
        })
        .collect();
    PersistedTipState { counts }
}

/// Load the waste log
pub fn load_waste_state(store: &mut dyn KeyValueStore) -> Option<WasteCounter> {
    let bytes = read(store, StorageKey::WasteLog)?;
    match serde_json::from_slice::<WasteCounter>(&bytes) {
        Ok(counter) => {
            info!("Restored waste count {}", counter.count);
            Some(counter)
        }
        Err(e) => {
            warn!("Waste log is malformed ({}), assuming an empty bin", e);
            None
        }
    }
}

fn read(store: &mut dyn KeyValueStore, key: StorageKey) -> Option<Vec<u8>> {
    match store.load(key) {
        Ok(Some(bytes)) => {
            debug!("Read {} bytes of {} from `{}`", bytes.len(), key.as_str(), store.namespace());
            Some(bytes)
        }
        Ok(None) => {
            debug!("No {} stored for `{}`", key.as_str(), store.namespace());
            None
        }
        Err(e) => {
            warn!("Failed to read {}: {}, starting from zero", key.as_str(), e);
            None
        }
    }
}

/// Save the tip log
pub fn save_tip_state(
    store: &mut dyn KeyValueStore,
    state: &PersistedTipState,
) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec(state)?;
    store.save(StorageKey::TipLog, &bytes)?;
    Ok(())
}

/// Save the waste log
pub fn save_waste_state(
    store: &mut dyn KeyValueStore,
    counter: &WasteCounter,
) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec(counter)?;
    store.save(StorageKey::WasteLog, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beadline_drivers::MemoryStore;

    #[test]
    fn test_absent_state() {
        let mut store = MemoryStore::new("station_b");
        assert_eq!(load_tip_state(&mut store), None);
        assert_eq!(load_waste_state(&mut store), None);
    }

    #[test]
    fn test_tip_log_format() {
        let mut store = MemoryStore::new("station_b");
        let mut state = PersistedTipState::default();
        state.counts.insert("tips300".into(), 40);
        save_tip_state(&mut store, &state).unwrap();
        assert_eq!(store.get(StorageKey::TipLog), Some(&br#"{"tips300":40}"#[..]));
        assert_eq!(load_tip_state(&mut store), Some(state));
    }

    #[test]
    fn test_malformed_entry_degrades_alone() {
        let mut store = MemoryStore::new("station_b");
        store.insert(
            StorageKey::TipLog,
            r#"{"tips300": 12, "tips20": "lots", "tips1000": -4}"#,
        );
        let state = load_tip_state(&mut store).unwrap();
        assert_eq!(state.count("tips300"), 12);
        assert_eq!(state.count("tips20"), 0);
        assert_eq!(state.count("tips1000"), 0);
    }

    #[test]
    fn test_garbage_degrades_to_none() {
        let mut store = MemoryStore::new("station_b");
        store.insert(StorageKey::TipLog, "not json");
        store.insert(StorageKey::WasteLog, r#"{"count": "full"}"#);
        assert_eq!(load_tip_state(&mut store), None);
        assert_eq!(load_waste_state(&mut store), None);
    }

    #[test]
    fn test_waste_log_format() {
        let mut store = MemoryStore::new("station_b");
        let counter = WasteCounter {
            count: 320,
            toggle: false,
        };
        save_waste_state(&mut store, &counter).unwrap();
        assert_eq!(
            store.get(StorageKey::WasteLog),
            Some(&br#"{"count":320,"toggle":false}"#[..])
        );
        assert_eq!(load_waste_state(&mut store), Some(counter));
    }

    #[test]
    fn test_read_only_store_reports_error() {
        let mut store = MemoryStore::new("station_b").read_only();
        let err = save_waste_state(&mut store, &WasteCounter::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::Store(StoreError::ReadOnly)));
    }
}
