//! Board-agnostic core logic for the bead extraction station
//!
//! This crate contains all orchestration logic that does not depend on a
//! specific robot backend:
//!
//! - Device traits (pipette, magnetic/temperature modules, operator, gantry)
//! - Container geometry and reservoir liquid-level tracking
//! - Tip inventory with replacement checkpoints and persisted cursors
//! - Waste-tip accounting with the empty-waste alert protocol
//! - Volume splitting into air-gapped transfer legs
//! - The purification state machine and its sequencer
//! - Configuration type definitions

#![deny(unsafe_code)]

pub mod config;
pub mod geometry;
pub mod labware;
pub mod level;
pub mod sequencer;
pub mod state;
pub mod tips;
pub mod traits;
pub mod transfer;
pub mod waste;

#[cfg(test)]
pub(crate) mod testing;
