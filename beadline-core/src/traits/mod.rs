//! Device abstraction traits
//!
//! These traits define the interface between the orchestration logic and
//! the robot backend. [`Deck`] bundles one handle to each device so the
//! sequencer and the waste manager can be handed a single context.

pub mod modules;
pub mod operator;
pub mod pipette;

pub use beadline_hal::DeckLights;
pub use modules::{MagneticModule, TemperatureModule};
pub use operator::{Gantry, Operator, OperatorError};
pub use pipette::{FlowRates, HardwareFault, Pipette};

/// Handles to every device the engine drives
///
/// Only one logical command stream drives the hardware, so plain mutable
/// borrows suffice. The lights are shared because the empty-waste alert
/// toggles them from a helper thread.
pub struct Deck<'a> {
    /// Pipette used for the workflow
    pub pipette: &'a mut dyn Pipette,
    /// Magnetic module under the sample plate
    pub magnet: &'a mut dyn MagneticModule,
    /// Temperature block under the elution plate, if fitted
    pub temperature: Option<&'a mut dyn TemperatureModule>,
    /// Operator channel
    pub operator: &'a mut dyn Operator,
    /// Robot gantry
    pub gantry: &'a mut dyn Gantry,
    /// Rail lights
    pub lights: &'a dyn DeckLights,
    /// Dry-run simulation flag
    pub simulating: bool,
}

impl core::fmt::Debug for Deck<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Deck")
            .field("channels", &self.pipette.channels())
            .field("has_temperature", &self.temperature.is_some())
            .field("simulating", &self.simulating)
            .finish()
    }
}
