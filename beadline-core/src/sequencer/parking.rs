//! Tip parking
//!
//! With parking enabled, each sample column owns one slot in an empty tip
//! rack. A column's tip is parked there between delivering a reagent and
//! removing it again, and only that column may pick it back up.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::labware::{LabwareId, TipSlot, Well};

/// Parking errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParkingError {
    /// Parking requested but no rack configured
    #[error("tip parking needs a parking rack")]
    NoRack,
    /// Column already has a parked tip
    #[error("column {0} already has a parked tip")]
    Occupied(u16),
    /// Column has no parked tip to retrieve
    #[error("column {0} has no parked tip")]
    Empty(u16),
}

/// Occupancy of the parking rack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParkingMap {
    rack: Option<LabwareId>,
    parked: BTreeMap<u16, TipSlot>,
}

impl ParkingMap {
    /// Create an empty map over `rack`
    pub fn new(rack: Option<LabwareId>) -> Self {
        Self {
            rack,
            parked: BTreeMap::new(),
        }
    }

    /// Slot reserved for `column`
    pub fn spot(&self, column: u16) -> Result<TipSlot, ParkingError> {
        let rack = self.rack.ok_or(ParkingError::NoRack)?;
        Ok(Well::column_head(rack, column))
    }

    /// Mark `column`'s spot as holding its tip, returning the spot
    pub fn park(&mut self, column: u16) -> Result<TipSlot, ParkingError> {
        let spot = self.spot(column)?;
        if self.is_parked(column) {
            return Err(ParkingError::Occupied(column));
        }
        self.parked.insert(column, spot);
        Ok(spot)
    }

    /// Take back the tip `column` parked
    pub fn retrieve(&mut self, column: u16) -> Result<TipSlot, ParkingError> {
        self.parked
            .remove(&column)
            .ok_or(ParkingError::Empty(column))
    }

    /// Check if `column` has a parked tip
    pub fn is_parked(&self, column: u16) -> bool {
        self.parked.contains_key(&column)
    }

    /// Check if no tips are parked
    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_and_retrieve_same_column() {
        let mut map = ParkingMap::new(Some(7));
        assert_eq!(map.park(2), Ok(Well::new(7, 16)));
        assert!(map.is_parked(2));
        assert_eq!(map.retrieve(2), Ok(Well::new(7, 16)));
        assert!(map.is_empty());
    }

    #[test]
    fn test_other_column_cannot_retrieve() {
        let mut map = ParkingMap::new(Some(7));
        map.park(0).unwrap();
        assert_eq!(map.retrieve(1), Err(ParkingError::Empty(1)));
        assert!(map.is_parked(0));
    }

    #[test]
    fn test_double_park_rejected() {
        let mut map = ParkingMap::new(Some(7));
        map.park(3).unwrap();
        assert_eq!(map.park(3), Err(ParkingError::Occupied(3)));
    }

    #[test]
    fn test_no_rack() {
        let mut map = ParkingMap::new(None);
        assert_eq!(map.park(0), Err(ParkingError::NoRack));
    }
}
