//! Magnetic and temperature module traits

use super::pipette::HardwareFault;

/// Magnetic separation module
///
/// Commands return once the magnets have physically reached position.
pub trait MagneticModule {
    /// Raise the magnets to `height_mm`
    fn engage(&mut self, height_mm: f32) -> Result<(), HardwareFault>;

    /// Lower the magnets fully
    fn disengage(&mut self) -> Result<(), HardwareFault>;

    /// Check if the magnets are raised
    fn is_engaged(&self) -> bool;
}

/// Temperature-controlled block
pub trait TemperatureModule {
    /// Set the block target and wait until it is reached
    fn set_temperature(&mut self, celsius: f32) -> Result<(), HardwareFault>;

    /// Get the current target, if one is set
    fn target(&self) -> Option<f32>;
}
