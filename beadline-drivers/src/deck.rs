//! Simulated gantry and rail lights

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::debug;

use beadline_core::traits::{DeckLights, Gantry, HardwareFault};

/// Simulated gantry
#[derive(Debug, Clone, Default)]
pub struct SimGantry {
    homes: u32,
}

impl SimGantry {
    /// Create a gantry that has not homed yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of homing moves
    pub fn homes(&self) -> u32 {
        self.homes
    }
}

impl Gantry for SimGantry {
    fn home(&mut self) -> Result<(), HardwareFault> {
        self.homes += 1;
        debug!("Gantry homed");
        Ok(())
    }
}

/// Rail lights shared with the empty-waste blinker
#[derive(Debug, Default)]
pub struct SimLights {
    on: AtomicBool,
    switches: AtomicU32,
}

impl SimLights {
    /// Create lights that are off
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of state changes requested
    pub fn switches(&self) -> u32 {
        self.switches.load(Ordering::Acquire)
    }
}

impl DeckLights for SimLights {
    fn set_rail_lights(&self, on: bool) {
        self.on.store(on, Ordering::Release);
        self.switches.fetch_add(1, Ordering::AcqRel);
    }

    fn rail_lights_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}
