//! Minimal recording doubles for unit tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use crate::labware::{Location, TipSlot};
use crate::traits::{
    DeckLights, FlowRates, Gantry, HardwareFault, MagneticModule, Operator, OperatorError,
    Pipette, TemperatureModule,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    PickUp(TipSlot),
    Drop(Location),
    Aspirate(f32, Location),
    Dispense(f32, Location),
    Mix(u8, f32, Location),
    BlowOut(Location),
    AirGap(f32),
    MoveTo(Location),
}

#[derive(Debug)]
pub struct MockPipette {
    pub channels: u8,
    pub max: f32,
    pub held: f32,
    pub tip: bool,
    pub rates: FlowRates,
    pub log: Vec<Cmd>,
    /// Fail the n-th aspirate (1-based)
    pub fail_aspirate: Option<usize>,
    aspirates: usize,
}

impl MockPipette {
    pub fn new(channels: u8, max: f32) -> Self {
        Self {
            channels,
            max,
            held: 0.0,
            tip: false,
            rates: FlowRates::default(),
            log: Vec::new(),
            fail_aspirate: None,
            aspirates: 0,
        }
    }
}

impl Pipette for MockPipette {
    fn channels(&self) -> u8 {
        self.channels
    }
    fn max_volume(&self) -> f32 {
        self.max
    }
    fn current_volume(&self) -> f32 {
        self.held
    }
    fn has_tip(&self) -> bool {
        self.tip
    }
    fn flow_rates(&self) -> FlowRates {
        self.rates
    }
    fn set_flow_rates(&mut self, rates: FlowRates) {
        self.rates = rates;
    }
    fn pick_up_tip(&mut self, slot: TipSlot) -> Result<(), HardwareFault> {
        self.log.push(Cmd::PickUp(slot));
        self.tip = true;
        Ok(())
    }
    fn drop_tip(&mut self, location: Location) -> Result<(), HardwareFault> {
        self.log.push(Cmd::Drop(location));
        self.tip = false;
        self.held = 0.0;
        Ok(())
    }
    fn aspirate(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.aspirates += 1;
        if self.fail_aspirate == Some(self.aspirates) {
            return Err(HardwareFault::Driver("aspirate stalled".into()));
        }
        self.log.push(Cmd::Aspirate(volume_ul, location));
        self.held += volume_ul;
        Ok(self.held)
    }
    fn dispense(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.log.push(Cmd::Dispense(volume_ul, location));
        self.held = (self.held - volume_ul).max(0.0);
        Ok(self.held)
    }
    fn mix(&mut self, reps: u8, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.log.push(Cmd::Mix(reps, volume_ul, location));
        Ok(self.held)
    }
    fn blow_out(&mut self, location: Location) -> Result<f32, HardwareFault> {
        self.log.push(Cmd::BlowOut(location));
        self.held = 0.0;
        Ok(self.held)
    }
    fn air_gap(&mut self, volume_ul: f32) -> Result<f32, HardwareFault> {
        self.log.push(Cmd::AirGap(volume_ul));
        self.held += volume_ul;
        Ok(self.held)
    }
    fn move_to(&mut self, location: Location) -> Result<f32, HardwareFault> {
        self.log.push(Cmd::MoveTo(location));
        Ok(self.held)
    }
}

#[derive(Debug, Default)]
pub struct MockOperator {
    pub pauses: Vec<String>,
    pub delays: Vec<(Duration, String)>,
    pub comments: Vec<String>,
    pub abort_pauses: bool,
}

impl Operator for MockOperator {
    fn pause(&mut self, message: &str) -> Result<(), OperatorError> {
        self.pauses.push(message.to_owned());
        if self.abort_pauses {
            Err(OperatorError::Aborted)
        } else {
            Ok(())
        }
    }
    fn delay(&mut self, duration: Duration, message: &str) -> Result<(), OperatorError> {
        self.delays.push((duration, message.to_owned()));
        Ok(())
    }
    fn comment(&mut self, message: &str) {
        self.comments.push(message.to_owned());
    }
}

#[derive(Debug, Default)]
pub struct MockMagnet {
    pub engaged: Option<f32>,
    pub engage_count: u32,
}

impl MagneticModule for MockMagnet {
    fn engage(&mut self, height_mm: f32) -> Result<(), HardwareFault> {
        self.engaged = Some(height_mm);
        self.engage_count += 1;
        Ok(())
    }
    fn disengage(&mut self) -> Result<(), HardwareFault> {
        self.engaged = None;
        Ok(())
    }
    fn is_engaged(&self) -> bool {
        self.engaged.is_some()
    }
}

#[derive(Debug, Default)]
pub struct MockTemperature {
    pub target: Option<f32>,
}

impl TemperatureModule for MockTemperature {
    fn set_temperature(&mut self, celsius: f32) -> Result<(), HardwareFault> {
        self.target = Some(celsius);
        Ok(())
    }
    fn target(&self) -> Option<f32> {
        self.target
    }
}

#[derive(Debug, Default)]
pub struct MockGantry {
    pub homes: u32,
}

impl Gantry for MockGantry {
    fn home(&mut self) -> Result<(), HardwareFault> {
        self.homes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockLights {
    pub on: AtomicBool,
    pub switches: AtomicU32,
}

impl DeckLights for MockLights {
    fn set_rail_lights(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
        self.switches.fetch_add(1, Ordering::SeqCst);
    }
    fn rail_lights_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}
