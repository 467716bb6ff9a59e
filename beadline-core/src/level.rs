//! Reservoir liquid-level tracking
//!
//! Keeps the draw height of every shared reservoir in step with the volume
//! withdrawn from it, so aspiration follows the falling surface instead of
//! running dry or crashing into the container bottom. Heights only ever go
//! down; once a withdrawal would cross the floor the reservoir is pinned at
//! the floor for the rest of the run.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::geometry::{self, GeometryError};
use crate::labware::{Location, Well};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reservoir identifier: the well liquid is drawn from
pub type ReservoirId = Well;

/// How the first draw height is determined
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InitialFill {
    /// Known starting draw height above the bottom (mm)
    Height(f32),
    /// Known fill volume; start `headroom_mm` below the computed surface
    Volume {
        /// Volume loaded into the reservoir (µl)
        volume_ul: f32,
        /// Distance below the surface for the first draw (mm)
        headroom_mm: f32,
    },
}

/// Static description of one reservoir
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReservoirSpec {
    /// Cross-section radius (mm)
    pub radius_mm: f32,
    /// Starting fill
    pub fill: InitialFill,
    /// Lowest permitted draw height (mm)
    pub floor_mm: f32,
    /// Multiplier on each height decrement, compensating for volume lost
    /// to tip wetting and dead volume (1.0 = none)
    #[cfg_attr(feature = "serde", serde(default = "default_loss_factor"))]
    pub loss_factor: f32,
}

#[cfg(feature = "serde")]
fn default_loss_factor() -> f32 {
    1.0
}

impl ReservoirSpec {
    /// Reservoir with a known starting height and no loss compensation
    pub const fn with_height(radius_mm: f32, start_mm: f32, floor_mm: f32) -> Self {
        Self {
            radius_mm,
            fill: InitialFill::Height(start_mm),
            floor_mm,
            loss_factor: 1.0,
        }
    }

    /// Starting draw height in mm
    pub fn start_height(&self) -> Result<f32, GeometryError> {
        match self.fill {
            InitialFill::Height(h) => Ok(h),
            InitialFill::Volume {
                volume_ul,
                headroom_mm,
            } => geometry::starting_height(volume_ul, self.radius_mm, headroom_mm),
        }
    }
}

/// Live level of one reservoir
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservoirLevel {
    /// Current draw height above the bottom (mm)
    pub height_mm: f32,
    /// Configured floor (mm)
    pub floor_mm: f32,
    /// Cached cross-sectional area (mm²)
    area_mm2: f32,
    /// Decrement multiplier
    loss_factor: f32,
}

impl ReservoirLevel {
    /// Whether the level has reached the floor
    pub fn is_shallow(&self) -> bool {
        self.height_mm <= self.floor_mm
    }
}

/// Level tracking errors
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LevelError {
    /// Draw requested from a reservoir that was never registered
    #[error("reservoir {0:?} is not registered")]
    UnknownReservoir(ReservoirId),
    /// Reservoir geometry is invalid
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Floor is negative or above the starting height
    #[error("reservoir floor {floor_mm} mm must lie between 0 and the start height {start_mm} mm")]
    InvalidFloor {
        /// Configured floor
        floor_mm: f32,
        /// Computed starting height
        start_mm: f32,
    },
    /// Loss factor below 1 would under-estimate the fall
    #[error("loss factor must be >= 1.0, got {0}")]
    InvalidLossFactor(f32),
    /// Negative withdrawal
    #[error("cannot withdraw a negative volume ({0} µl)")]
    NegativeVolume(f32),
}

/// Tracks the draw height of every registered reservoir
///
/// Levels are created lazily on the first withdrawal and live for the
/// tracker's lifetime.
#[derive(Debug, Default)]
pub struct LiquidLevelTracker {
    /// Registered reservoir descriptions
    specs: BTreeMap<ReservoirId, ReservoirSpec>,
    /// Live levels (only for reservoirs drawn from at least once)
    levels: BTreeMap<ReservoirId, ReservoirLevel>,
}

impl LiquidLevelTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reservoir
    ///
    /// Re-registering replaces the description but keeps any live level.
    pub fn register(&mut self, id: ReservoirId, spec: ReservoirSpec) -> Result<(), LevelError> {
        geometry::cross_sectional_area(spec.radius_mm)?;
        let start_mm = spec.start_height()?;
        if spec.floor_mm < 0.0 || spec.floor_mm > start_mm {
            return Err(LevelError::InvalidFloor {
                floor_mm: spec.floor_mm,
                start_mm,
            });
        }
        if !(spec.loss_factor >= 1.0) {
            return Err(LevelError::InvalidLossFactor(spec.loss_factor));
        }
        let usable_ul = geometry::volume_for_height(start_mm - spec.floor_mm, spec.radius_mm)?;
        debug!(
            "Reservoir {}/{} registered: start {} mm, about {:.0} µl above the floor",
            id.labware, id.index, start_mm, usable_ul
        );
        self.specs.insert(id, spec);
        Ok(())
    }

    /// Check if a reservoir is registered
    pub fn is_registered(&self, id: ReservoirId) -> bool {
        self.specs.contains_key(&id)
    }

    /// Account for withdrawing `volume_ul` and return the draw height
    ///
    /// The returned height is where the withdrawal should happen: the level
    /// after the volume is gone, or the floor if that would be lower.
    pub fn draw_height(&mut self, id: ReservoirId, volume_ul: f32) -> Result<f32, LevelError> {
        if volume_ul < 0.0 {
            return Err(LevelError::NegativeVolume(volume_ul));
        }

        if !self.levels.contains_key(&id) {
            let spec = self
                .specs
                .get(&id)
                .ok_or(LevelError::UnknownReservoir(id))?;
            let level = ReservoirLevel {
                height_mm: spec.start_height()?,
                floor_mm: spec.floor_mm,
                area_mm2: geometry::cross_sectional_area(spec.radius_mm)?,
                loss_factor: spec.loss_factor,
            };
            self.levels.insert(id, level);
        }
        let level = self
            .levels
            .get_mut(&id)
            .ok_or(LevelError::UnknownReservoir(id))?;

        let dh = level.loss_factor * volume_ul / level.area_mm2;
        if level.height_mm - dh > level.floor_mm {
            level.height_mm -= dh;
        } else {
            if !level.is_shallow() {
                debug!(
                    "Reservoir {}/{} reached its {} mm floor",
                    id.labware, id.index, level.floor_mm
                );
            }
            level.height_mm = level.floor_mm;
        }

        Ok(level.height_mm)
    }

    /// Account for a withdrawal and return the aspiration point
    pub fn draw_location(
        &mut self,
        id: ReservoirId,
        volume_ul: f32,
    ) -> Result<Location, LevelError> {
        let height = self.draw_height(id, volume_ul)?;
        Ok(id.bottom(height))
    }

    /// Current level, if the reservoir has been drawn from
    pub fn level(&self, id: ReservoirId) -> Option<&ReservoirLevel> {
        self.levels.get(&id)
    }
}
