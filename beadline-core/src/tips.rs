//! Tip inventory
//!
//! Tracks, per pipette role, which tip to pick up next. Each role owns an
//! ordered list of tip slots and a cursor; when the cursor reaches the end
//! the operator is asked to replace the racks and the cursor starts over.
//! Cursors can be exported and restored so a run that spans several
//! sessions does not rediscover tips that are already gone.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{label, Label};
use crate::labware::TipSlot;
use crate::traits::{Operator, OperatorError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tip inventory errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TipError {
    /// No pool registered for this role
    #[error("no tip pool registered for role `{0}`")]
    UnknownRole(String),
    /// Pool registered with no slots
    #[error("tip pool `{0}` has no slots")]
    EmptyPool(String),
    /// Role registered twice
    #[error("tip pool `{0}` is already registered")]
    DuplicateRole(String),
    /// Role name does not fit a label
    #[error("role name `{0}` is too long")]
    RoleTooLong(String),
    /// The replacement pause was not acknowledged
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Cursor values exported for durable storage
///
/// Keyed by role name. A role missing from the map starts at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PersistedTipState {
    /// Tips consumed per role
    pub counts: BTreeMap<String, u32>,
}

impl PersistedTipState {
    /// Cursor stored for `role`, or 0
    pub fn count(&self, role: &str) -> u32 {
        self.counts.get(role).copied().unwrap_or(0)
    }
}

/// Tips available to one pipette role
#[derive(Debug, Clone)]
pub struct TipPool {
    /// Role name (e.g. `tips300`)
    role: Label,
    /// Working volume of the tips, for operator messages (µl)
    tip_volume_ul: u16,
    /// Slots in pick-up order
    slots: Vec<TipSlot>,
    /// Tips consumed in the current epoch
    cursor: usize,
    /// Number of rack replacements so far
    epoch: u32,
}

impl TipPool {
    /// Role name
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// Tips consumed since the last replacement
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Tips per rack set
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of rack replacements so far
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Check if the next acquire needs a replacement
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.slots.len()
    }

    fn replacement_message(&self) -> String {
        format!(
            "Replace {}µl tipracks before resuming.",
            self.tip_volume_ul
        )
    }
}

/// Per-role tip cursors
#[derive(Debug, Clone, Default)]
pub struct TipInventory {
    pools: BTreeMap<Label, TipPool>,
}

impl TipInventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool for `role`
    ///
    /// `slots` is the pick-up order across every rack of the set.
    pub fn add_pool(
        &mut self,
        role: &str,
        tip_volume_ul: u16,
        slots: Vec<TipSlot>,
    ) -> Result<(), TipError> {
        let key = label(role).ok_or_else(|| TipError::RoleTooLong(role.to_owned()))?;
        if slots.is_empty() {
            return Err(TipError::EmptyPool(role.to_owned()));
        }
        if self.pools.contains_key(&key) {
            return Err(TipError::DuplicateRole(role.to_owned()));
        }

        self.pools.insert(
            key.clone(),
            TipPool {
                role: key,
                tip_volume_ul,
                slots,
                cursor: 0,
                epoch: 0,
            },
        );
        Ok(())
    }

    /// Look up a pool
    pub fn pool(&self, role: &str) -> Option<&TipPool> {
        self.pools.values().find(|p| p.role() == role)
    }

    fn pool_mut(&mut self, role: &str) -> Result<&mut TipPool, TipError> {
        self.pools
            .values_mut()
            .find(|p| p.role.as_str() == role)
            .ok_or_else(|| TipError::UnknownRole(role.to_owned()))
    }

    /// Hand out the next unused tip for `role`
    ///
    /// When the rack set is used up the operator is asked to replace it;
    /// this call blocks until they acknowledge, then starts over at the
    /// first slot.
    pub fn acquire(
        &mut self,
        role: &str,
        operator: &mut dyn Operator,
    ) -> Result<TipSlot, TipError> {
        let pool = self.pool_mut(role)?;

        if pool.is_exhausted() {
            let message = pool.replacement_message();
            info!("Tip pool `{}` exhausted, waiting for replacement", role);
            operator.pause(&message)?;
            pool.cursor = 0;
            pool.epoch += 1;
            info!("Tip pool `{}` replenished (epoch {})", role, pool.epoch);
        }

        let slot = pool.slots[pool.cursor];
        pool.cursor += 1;
        debug!(
            "Tip {}/{} for `{}` ({}/{})",
            slot.labware,
            slot.index,
            role,
            pool.cursor,
            pool.capacity()
        );
        Ok(slot)
    }

    /// Hand out a specific tip without touching the cursor
    ///
    /// Used to pick a parked tip back up.
    pub fn acquire_at(&self, role: &str, location: TipSlot) -> Result<TipSlot, TipError> {
        if self.pool(role).is_none() {
            return Err(TipError::UnknownRole(role.to_owned()));
        }
        Ok(location)
    }

    /// Restore cursors from a previous session
    ///
    /// `None` (nothing stored, tracking disabled, or a dry run) resets every
    /// cursor to 0. Counts larger than a pool's capacity are clamped so the
    /// next acquire asks for fresh racks.
    pub fn load_state(&mut self, persisted: Option<&PersistedTipState>) {
        for pool in self.pools.values_mut() {
            let stored = persisted.map_or(0, |p| p.count(pool.role.as_str())) as usize;
            if stored > pool.capacity() {
                warn!(
                    "Stored tip count {} for `{}` exceeds capacity {}, clamping",
                    stored,
                    pool.role(),
                    pool.capacity()
                );
            }
            pool.cursor = stored.min(pool.capacity());
        }

        if let Some(state) = persisted {
            for role in state.counts.keys() {
                if self.pool(role).is_none() {
                    debug!("Ignoring stored tip count for unknown role `{}`", role);
                }
            }
        }
    }

    /// Export the cursors for durable storage
    pub fn snapshot(&self) -> PersistedTipState {
        PersistedTipState {
            counts: self
                .pools
                .values()
                .map(|p| (p.role().to_owned(), p.cursor as u32))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labware::Well;
    use crate::testing::MockOperator;

    fn rack(labware: u8, n: u16) -> Vec<TipSlot> {
        (0..n).map(|i| Well::new(labware, i)).collect()
    }

    fn inventory_96() -> TipInventory {
        let mut tips = TipInventory::new();
        tips.add_pool("tips300", 300, rack(3, 96)).unwrap();
        tips
    }

    #[test]
    fn test_acquire_in_order_then_pause() {
        let mut tips = inventory_96();
        let mut op = MockOperator::default();

        let handed: Vec<TipSlot> = (0..96)
            .map(|_| tips.acquire("tips300", &mut op).unwrap())
            .collect();

        for (i, slot) in handed.iter().enumerate() {
            assert_eq!(slot.index as usize, i);
        }
        assert!(op.pauses.is_empty());
        assert_eq!(tips.pool("tips300").unwrap().cursor(), 96);

        // 97th call pauses, then restarts at the first tip
        let next = tips.acquire("tips300", &mut op).unwrap();
        assert_eq!(op.pauses, vec!["Replace 300µl tipracks before resuming.".to_string()]);
        assert_eq!(next, Well::new(3, 0));
        assert_eq!(tips.pool("tips300").unwrap().cursor(), 1);
        assert_eq!(tips.pool("tips300").unwrap().epoch(), 1);
    }

    #[test]
    fn test_aborted_replacement_keeps_cursor() {
        let mut tips = TipInventory::new();
        tips.add_pool("tips20", 20, rack(7, 2)).unwrap();
        let mut op = MockOperator::default();
        tips.acquire("tips20", &mut op).unwrap();
        tips.acquire("tips20", &mut op).unwrap();

        op.abort_pauses = true;
        assert_eq!(
            tips.acquire("tips20", &mut op),
            Err(TipError::Operator(OperatorError::Aborted))
        );
        assert_eq!(tips.pool("tips20").unwrap().cursor(), 2);
    }

    #[test]
    fn test_acquire_at_leaves_cursor() {
        let mut tips = inventory_96();
        let mut op = MockOperator::default();
        tips.acquire("tips300", &mut op).unwrap();

        let parked = Well::new(7, 16);
        assert_eq!(tips.acquire_at("tips300", parked), Ok(parked));
        assert_eq!(tips.pool("tips300").unwrap().cursor(), 1);
        assert!(matches!(
            tips.acquire_at("tips20", parked),
            Err(TipError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_unknown_role() {
        let mut tips = inventory_96();
        let mut op = MockOperator::default();
        assert_eq!(
            tips.acquire("tips1000", &mut op),
            Err(TipError::UnknownRole("tips1000".into()))
        );
    }

    #[test]
    fn test_pool_registration_rules() {
        let mut tips = inventory_96();
        assert!(matches!(
            tips.add_pool("tips300", 300, rack(4, 8)),
            Err(TipError::DuplicateRole(_))
        ));
        assert!(matches!(
            tips.add_pool("tips20", 20, Vec::new()),
            Err(TipError::EmptyPool(_))
        ));
        assert!(matches!(
            tips.add_pool("a_role_name_that_is_far_too_long", 20, rack(4, 8)),
            Err(TipError::RoleTooLong(_))
        ));
    }

    #[test]
    fn test_load_and_snapshot() {
        let mut tips = inventory_96();
        tips.add_pool("tips20", 20, rack(7, 12)).unwrap();

        let mut stored = PersistedTipState::default();
        stored.counts.insert("tips300".into(), 40);
        stored.counts.insert("tips20".into(), 500);
        stored.counts.insert("retired".into(), 3);
        tips.load_state(Some(&stored));

        assert_eq!(tips.pool("tips300").unwrap().cursor(), 40);
        // Clamped to capacity
        assert_eq!(tips.pool("tips20").unwrap().cursor(), 12);

        let snap = tips.snapshot();
        assert_eq!(snap.count("tips300"), 40);
        assert_eq!(snap.count("tips20"), 12);
        assert!(!snap.counts.contains_key("retired"));

        // Next acquire continues after the restored cursor
        let mut op = MockOperator::default();
        assert_eq!(tips.acquire("tips300", &mut op).unwrap(), Well::new(3, 40));
    }

    #[test]
    fn test_load_none_resets() {
        let mut tips = inventory_96();
        let mut op = MockOperator::default();
        tips.acquire("tips300", &mut op).unwrap();
        tips.load_state(None);
        assert_eq!(tips.pool("tips300").unwrap().cursor(), 0);
    }
}
