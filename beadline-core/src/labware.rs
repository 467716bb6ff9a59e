//! Labware addressing
//!
//! Wells are addressed by labware id plus a column-major index on the
//! 96-well footprint (`index = column * 8 + row`). Tip slots are wells of a
//! tip rack. A [`Location`] is a point relative to a well.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rows per column on the 96-well footprint
pub const ROWS_PER_COLUMN: u16 = 8;

/// Columns on the 96-well footprint
pub const COLUMNS_PER_PLATE: u16 = 12;

/// Labware identifier (deck slot or loader-assigned id)
pub type LabwareId = u8;

/// A single well (or tip slot) on a piece of labware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Well {
    /// Labware the well belongs to
    pub labware: LabwareId,
    /// Column-major well index
    pub index: u16,
}

/// A tip rack position is addressed exactly like a well
pub type TipSlot = Well;

/// Vertical reference point within a well
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Anchor {
    /// Millimetres above the well bottom
    Bottom(f32),
    /// Millimetres relative to the well top (negative = inside the well)
    Top(f32),
    /// Geometric centre of the well
    Center,
}

/// A point the pipette can be sent to
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    /// Target well
    pub well: Well,
    /// Vertical reference
    pub anchor: Anchor,
    /// Lateral offset along the deck x axis (mm)
    pub x_offset_mm: f32,
}

impl Well {
    /// Create a well reference
    pub const fn new(labware: LabwareId, index: u16) -> Self {
        Self { labware, index }
    }

    /// Row-A well of a column (the well a multi-channel head targets)
    pub const fn column_head(labware: LabwareId, column: u16) -> Self {
        Self {
            labware,
            index: column * ROWS_PER_COLUMN,
        }
    }

    /// Column this well belongs to
    pub const fn column(&self) -> u16 {
        self.index / ROWS_PER_COLUMN
    }

    /// Point `mm` above the bottom
    pub const fn bottom(self, mm: f32) -> Location {
        Location::new(self, Anchor::Bottom(mm))
    }

    /// Point `mm` relative to the top
    pub const fn top(self, mm: f32) -> Location {
        Location::new(self, Anchor::Top(mm))
    }

    /// Geometric centre
    pub const fn center(self) -> Location {
        Location::new(self, Anchor::Center)
    }
}

impl Location {
    /// Create an unshifted location
    pub const fn new(well: Well, anchor: Anchor) -> Self {
        Self {
            well,
            anchor,
            x_offset_mm: 0.0,
        }
    }

    /// Same point moved along x by `dx` millimetres
    pub fn shifted_x(self, dx: f32) -> Self {
        Self {
            x_offset_mm: self.x_offset_mm + dx,
            ..self
        }
    }

    /// Neutral headspace above the same well
    ///
    /// Used to void stale air gaps without touching liquid.
    pub fn headspace(self) -> Self {
        self.well.top(0.0)
    }
}
