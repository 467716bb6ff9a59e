//! Simulated deck modules

use tracing::{debug, info};

use beadline_core::traits::{HardwareFault, MagneticModule, TemperatureModule};

/// Highest engage height the magnet can reach (mm)
pub const MAX_ENGAGE_HEIGHT_MM: f32 = 20.0;

/// Temperature block range (°C)
pub const TEMPERATURE_RANGE_C: (f32, f32) = (4.0, 95.0);

/// Simulated magnetic module
#[derive(Debug, Clone, Default)]
pub struct SimMagnet {
    height_mm: Option<f32>,
    engage_count: u32,
}

impl SimMagnet {
    /// Create a disengaged magnet
    pub fn new() -> Self {
        Self::default()
    }

    /// Current engage height, `None` when disengaged
    pub fn height(&self) -> Option<f32> {
        self.height_mm
    }

    /// Number of accepted engage commands
    pub fn engage_count(&self) -> u32 {
        self.engage_count
    }
}

impl MagneticModule for SimMagnet {
    fn engage(&mut self, height_mm: f32) -> Result<(), HardwareFault> {
        if !(0.0..=MAX_ENGAGE_HEIGHT_MM).contains(&height_mm) {
            return Err(HardwareFault::OutOfRange {
                module: "magnetic module",
                value: height_mm,
                reason: "engage height outside 0-20 mm",
            });
        }
        debug!("Magnet engaged at {} mm", height_mm);
        self.height_mm = Some(height_mm);
        self.engage_count += 1;
        Ok(())
    }

    fn disengage(&mut self) -> Result<(), HardwareFault> {
        if self.height_mm.take().is_some() {
            debug!("Magnet disengaged");
        }
        Ok(())
    }

    fn is_engaged(&self) -> bool {
        self.height_mm.is_some()
    }
}

/// Simulated temperature block
#[derive(Debug, Clone, Default)]
pub struct SimTemperature {
    target_c: Option<f32>,
}

impl SimTemperature {
    /// Create an idle block
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemperatureModule for SimTemperature {
    fn set_temperature(&mut self, celsius: f32) -> Result<(), HardwareFault> {
        let (low, high) = TEMPERATURE_RANGE_C;
        if !(low..=high).contains(&celsius) {
            return Err(HardwareFault::OutOfRange {
                module: "temperature module",
                value: celsius,
                reason: "target outside 4-95 °C",
            });
        }
        info!("Temperature block target {} °C", celsius);
        self.target_c = Some(celsius);
        Ok(())
    }

    fn target(&self) -> Option<f32> {
        self.target_c
    }
}
