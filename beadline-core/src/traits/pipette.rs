//! Pipette driver trait

use thiserror::Error;

use crate::labware::{Location, TipSlot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Faults reported by robot hardware
///
/// Every hardware fault is fatal to the run: a failed physical transfer
/// leaves reagent state that only a human can adjudicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HardwareFault {
    /// Command needs a tip but none is attached
    #[error("no tip attached")]
    NoTip,
    /// Pick-up requested while a tip is already attached
    #[error("a tip is already attached")]
    TipAlreadyAttached,
    /// Requested volume does not fit in the tip
    #[error("{requested_ul} µl exceeds the {capacity_ul} µl pipette capacity")]
    OverCapacity {
        /// Volume that would be held after the command
        requested_ul: f32,
        /// Physical maximum
        capacity_ul: f32,
    },
    /// Dispense of more than is currently held
    #[error("cannot dispense {requested_ul} µl, only {held_ul} µl held")]
    InsufficientVolume {
        /// Volume requested
        requested_ul: f32,
        /// Volume held
        held_ul: f32,
    },
    /// Module rejected a command parameter
    #[error("{module} rejected {value}: {reason}")]
    OutOfRange {
        /// Module name
        module: &'static str,
        /// Offending value
        value: f32,
        /// Why it was rejected
        reason: &'static str,
    },
    /// Driver-level failure reported by the robot
    #[error("driver fault: {0}")]
    Driver(String),
}

/// Plunger flow rates in µl/s
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowRates {
    /// Aspirate rate
    pub aspirate: f32,
    /// Dispense rate
    pub dispense: f32,
    /// Blow-out rate
    pub blow_out: f32,
}

impl Default for FlowRates {
    fn default() -> Self {
        Self {
            aspirate: 50.0,
            dispense: 150.0,
            blow_out: 300.0,
        }
    }
}

/// Trait for pipette drivers
///
/// Liquid-handling commands return the volume held after the command
/// completes (liquid plus air, in µl). Commands block until the motion is
/// physically done.
pub trait Pipette {
    /// Number of channels (1 or 8)
    fn channels(&self) -> u8;

    /// Physical maximum volume of the mounted pipette (µl)
    fn max_volume(&self) -> f32;

    /// Volume currently held (µl)
    fn current_volume(&self) -> f32;

    /// Check if a tip is attached
    fn has_tip(&self) -> bool;

    /// Current flow rates
    fn flow_rates(&self) -> FlowRates;

    /// Replace the flow rates used by subsequent commands
    fn set_flow_rates(&mut self, rates: FlowRates);

    /// Pick up the tip at `slot`
    fn pick_up_tip(&mut self, slot: TipSlot) -> Result<(), HardwareFault>;

    /// Eject the attached tip at `location`
    fn drop_tip(&mut self, location: Location) -> Result<(), HardwareFault>;

    /// Draw `volume_ul` of liquid at `location`
    fn aspirate(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault>;

    /// Expel `volume_ul` at `location`
    fn dispense(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault>;

    /// Aspirate/dispense `volume_ul` at `location`, `reps` times
    fn mix(&mut self, reps: u8, volume_ul: f32, location: Location) -> Result<f32, HardwareFault>;

    /// Push the plunger past its bottom at `location`
    fn blow_out(&mut self, location: Location) -> Result<f32, HardwareFault>;

    /// Draw `volume_ul` of air at the current position
    fn air_gap(&mut self, volume_ul: f32) -> Result<f32, HardwareFault>;

    /// Move without liquid handling
    fn move_to(&mut self, location: Location) -> Result<f32, HardwareFault>;
}
