//! Station configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use beadline_core::config::{label, PurificationConfig, TipPattern, TipPoolConfig, WasteConfig};
use beadline_core::labware::{LabwareId, Well};
use beadline_core::level::{InitialFill, LiquidLevelTracker, ReservoirSpec};
use beadline_core::tips::TipInventory;
use beadline_core::waste::WasteManager;

use super::loader::ConfigError;

/// Labware holding the ethanol trough in the default layout
const ETHANOL_RESERVOIR: LabwareId = 2;

/// Racks the default tip pool draws from
const DEFAULT_TIP_RACKS: [LabwareId; 5] = [3, 6, 8, 9, 10];

/// Station identity and run-state handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSection {
    /// Namespace for persisted state; one per protocol station
    pub namespace: String,
    /// Restore and save tip and waste state across sessions
    pub track_tips: bool,
    /// Dry run: no persistence, no blinking, no real-time delays
    pub simulate: bool,
    /// Root directory of the file store
    pub data_dir: PathBuf,
}

impl Default for StationSection {
    fn default() -> Self {
        Self {
            namespace: "station_b".into(),
            track_tips: false,
            simulate: true,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Mounted pipette
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipetteSection {
    /// Channel count (1 or 8)
    pub channels: u8,
    /// Maximum volume (µl)
    pub max_volume_ul: f32,
}

impl Default for PipetteSection {
    fn default() -> Self {
        Self {
            channels: 8,
            max_volume_ul: 300.0,
        }
    }
}

/// One tracked reservoir well
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservoirEntry {
    /// Well liquid is drawn from
    pub well: Well,
    /// Geometry and starting fill
    pub spec: ReservoirSpec,
}

/// Complete station description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Identity and persistence
    pub station: StationSection,
    /// Mounted pipette
    pub pipette: PipetteSection,
    /// Tip pools
    pub tip_pools: Vec<TipPoolConfig>,
    /// Tip waste
    pub waste: WasteConfig,
    /// Tracked reservoirs
    pub reservoirs: Vec<ReservoirEntry>,
    /// Workflow recipe
    pub purification: PurificationConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        let purification = PurificationConfig::default();
        let reservoirs = purification
            .reagent_sources()
            .map(|well| ReservoirEntry {
                well,
                spec: default_reservoir(well.labware),
            })
            .collect();

        let mut racks = heapless::Vec::new();
        for rack in DEFAULT_TIP_RACKS {
            let _ = racks.push(rack);
        }
        let tips = TipPoolConfig {
            role: label("tips300").unwrap_or_default(),
            tip_volume_ul: 300,
            racks,
            pattern: TipPattern::Columns,
        };

        Self {
            station: StationSection::default(),
            pipette: PipetteSection::default(),
            tip_pools: vec![tips],
            waste: WasteConfig::default(),
            reservoirs,
            purification,
        }
    }
}

/// 12-well reagent trough, or the single-well ethanol trough
fn default_reservoir(labware: LabwareId) -> ReservoirSpec {
    let (radius_mm, volume_ul) = if labware == ETHANOL_RESERVOIR {
        (58.0, 150_000.0)
    } else {
        (13.5, 15_000.0)
    };
    ReservoirSpec {
        radius_mm,
        fill: InitialFill::Volume {
            volume_ul,
            headroom_mm: 3.0,
        },
        floor_mm: 1.0,
        loss_factor: 1.0,
    }
}

impl StationConfig {
    /// Tip inventory with every configured pool, cursors at 0
    pub fn build_tips(&self) -> Result<TipInventory, ConfigError> {
        let mut tips = TipInventory::new();
        for pool in &self.tip_pools {
            tips.add_pool(pool.role.as_str(), pool.tip_volume_ul, pool.slots())?;
        }
        Ok(tips)
    }

    /// Level tracker with every configured reservoir registered
    pub fn build_levels(&self) -> Result<LiquidLevelTracker, ConfigError> {
        let mut levels = LiquidLevelTracker::new();
        for entry in &self.reservoirs {
            levels
                .register(entry.well, entry.spec)
                .map_err(|source| ConfigError::Reservoir {
                    well: entry.well,
                    source,
                })?;
        }
        Ok(levels)
    }

    /// Waste manager with an empty bin
    pub fn build_waste(&self) -> WasteManager {
        WasteManager::new(self.waste)
    }
}
