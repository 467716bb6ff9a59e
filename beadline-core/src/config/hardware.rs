//! Consumable hardware configuration
//!
//! Tip rack sets and the tip waste receptacle.

use heapless::Vec;

use crate::labware::{LabwareId, TipSlot, Well, COLUMNS_PER_PLATE, ROWS_PER_COLUMN};

use super::types::Label;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum tip racks in one pool
pub const MAX_RACKS: usize = 8;

/// Which slots of each rack a pool draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TipPattern {
    /// Every slot, column-major (single-channel pipettes)
    #[default]
    AllWells,
    /// Row A of each column (8-channel heads pick a full column)
    Columns,
    /// Row B of each column, for racks whose row A was removed so a
    /// multi-channel head picks up seven tips
    ColumnsRowARemoved,
}

/// One tip pool: a role and the racks it draws from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TipPoolConfig {
    /// Role name, also the persisted key (e.g. `tips300`)
    pub role: Label,
    /// Tip working volume (µl)
    pub tip_volume_ul: u16,
    /// Racks in pick-up order
    pub racks: Vec<LabwareId, MAX_RACKS>,
    /// Slot selection within each rack
    #[cfg_attr(feature = "serde", serde(default))]
    pub pattern: TipPattern,
}

impl TipPoolConfig {
    /// Slots in pick-up order across every rack
    pub fn slots(&self) -> std::vec::Vec<TipSlot> {
        self.racks
            .iter()
            .flat_map(|&rack| rack_slots(rack, self.pattern))
            .collect()
    }
}

fn rack_slots(rack: LabwareId, pattern: TipPattern) -> std::vec::Vec<TipSlot> {
    match pattern {
        TipPattern::AllWells => (0..COLUMNS_PER_PLATE * ROWS_PER_COLUMN)
            .map(|i| Well::new(rack, i))
            .collect(),
        TipPattern::Columns => (0..COLUMNS_PER_PLATE)
            .map(|c| Well::column_head(rack, c))
            .collect(),
        TipPattern::ColumnsRowARemoved => (0..COLUMNS_PER_PLATE)
            .map(|c| Well::new(rack, c * ROWS_PER_COLUMN + 1))
            .collect(),
    }
}

/// Tip waste receptacle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WasteConfig {
    /// Trash well tips are ejected into
    pub trash: Well,
    /// Tips the bin holds before it must be emptied
    pub threshold: u32,
    /// Drop offset on "right" calls (mm from top centre)
    pub right_offset_mm: f32,
    /// Drop offset on "left" calls (mm from top centre)
    pub left_offset_mm: f32,
    /// Rail-light blink half-period while waiting to be emptied (ms)
    pub blink_interval_ms: u64,
}

impl Default for WasteConfig {
    fn default() -> Self {
        Self {
            trash: Well::new(12, 0),
            threshold: 960,
            right_offset_mm: 30.0,
            left_offset_mm: -18.0,
            blink_interval_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::label;

    fn pool(pattern: TipPattern, racks: &[LabwareId]) -> TipPoolConfig {
        let mut r = Vec::new();
        for &id in racks {
            r.push(id).unwrap();
        }
        TipPoolConfig {
            role: label("tips").unwrap(),
            tip_volume_ul: 300,
            racks: r,
            pattern,
        }
    }

    #[test]
    fn test_all_wells_pattern() {
        let slots = pool(TipPattern::AllWells, &[8, 9]).slots();
        assert_eq!(slots.len(), 192);
        assert_eq!(slots[0], Well::new(8, 0));
        assert_eq!(slots[96], Well::new(9, 0));
    }

    #[test]
    fn test_column_patterns() {
        let heads = pool(TipPattern::Columns, &[3]).slots();
        assert_eq!(heads.len(), 12);
        assert_eq!(heads[1], Well::new(3, 8));

        let no_a = pool(TipPattern::ColumnsRowARemoved, &[3]).slots();
        assert_eq!(no_a[0], Well::new(3, 1));
        assert_eq!(no_a[11], Well::new(3, 89));
    }
}
