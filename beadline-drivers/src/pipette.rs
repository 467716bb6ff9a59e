//! Simulated pipette
//!
//! Tracks the attached tip and the held volume and rejects anything a
//! physical pipette could not do. Every accepted command is recorded so
//! tests can inspect the motion sequence.

use tracing::{debug, warn};

use beadline_core::labware::{Location, TipSlot};
use beadline_core::traits::{FlowRates, HardwareFault, Pipette};

/// Slack allowed when comparing volumes (µl)
const VOLUME_EPSILON: f32 = 1e-3;

/// Accepted pipette command
#[derive(Debug, Clone, PartialEq)]
pub enum PipetteCommand {
    /// Tip picked up
    PickUp(TipSlot),
    /// Tip ejected
    Drop(Location),
    /// Liquid drawn
    Aspirate(f32, Location),
    /// Liquid expelled
    Dispense(f32, Location),
    /// Mix strokes
    Mix(u8, f32, Location),
    /// Blow-out
    BlowOut(Location),
    /// Air drawn
    AirGap(f32),
    /// Plain move
    MoveTo(Location),
}

/// Simulated single- or multi-channel pipette
#[derive(Debug, Clone)]
pub struct SimPipette {
    channels: u8,
    max_volume_ul: f32,
    held_ul: f32,
    tip: Option<TipSlot>,
    rates: FlowRates,
    log: Vec<PipetteCommand>,
    commands: usize,
    fail_at: Option<usize>,
}

impl SimPipette {
    /// Create a pipette with no tip attached
    pub fn new(channels: u8, max_volume_ul: f32) -> Self {
        Self {
            channels,
            max_volume_ul,
            held_ul: 0.0,
            tip: None,
            rates: FlowRates::default(),
            log: Vec::new(),
            commands: 0,
            fail_at: None,
        }
    }

    /// 8-channel 300 µl head
    pub fn multi_300() -> Self {
        Self::new(8, 300.0)
    }

    /// Fail the `n`-th command from now (1-based) with a driver fault
    pub fn inject_fault_after(&mut self, n: usize) {
        self.fail_at = Some(self.commands + n);
    }

    /// Accepted commands, oldest first
    pub fn log(&self) -> &[PipetteCommand] {
        &self.log
    }

    /// Tip currently attached
    pub fn tip(&self) -> Option<TipSlot> {
        self.tip
    }

    /// Number of tips picked up so far
    pub fn pickups(&self) -> usize {
        self.log
            .iter()
            .filter(|c| matches!(c, PipetteCommand::PickUp(_)))
            .count()
    }

    fn begin(&mut self, needs_tip: bool) -> Result<(), HardwareFault> {
        self.commands += 1;
        if self.fail_at == Some(self.commands) {
            self.fail_at = None;
            warn!("Injected pipette fault at command {}", self.commands);
            return Err(HardwareFault::Driver("injected fault".into()));
        }
        if needs_tip && self.tip.is_none() {
            return Err(HardwareFault::NoTip);
        }
        Ok(())
    }

    fn take_in(&mut self, volume_ul: f32) -> Result<f32, HardwareFault> {
        let requested_ul = self.held_ul + volume_ul;
        if requested_ul > self.max_volume_ul + VOLUME_EPSILON {
            return Err(HardwareFault::OverCapacity {
                requested_ul,
                capacity_ul: self.max_volume_ul,
            });
        }
        self.held_ul = requested_ul;
        Ok(self.held_ul)
    }
}

impl Pipette for SimPipette {
    fn channels(&self) -> u8 {
        self.channels
    }

    fn max_volume(&self) -> f32 {
        self.max_volume_ul
    }

    fn current_volume(&self) -> f32 {
        self.held_ul
    }

    fn has_tip(&self) -> bool {
        self.tip.is_some()
    }

    fn flow_rates(&self) -> FlowRates {
        self.rates
    }

    fn set_flow_rates(&mut self, rates: FlowRates) {
        debug!(
            "Flow rates: aspirate {} dispense {} blow-out {}",
            rates.aspirate, rates.dispense, rates.blow_out
        );
        self.rates = rates;
    }

    fn pick_up_tip(&mut self, slot: TipSlot) -> Result<(), HardwareFault> {
        self.begin(false)?;
        if self.tip.is_some() {
            return Err(HardwareFault::TipAlreadyAttached);
        }
        self.tip = Some(slot);
        self.held_ul = 0.0;
        self.log.push(PipetteCommand::PickUp(slot));
        Ok(())
    }

    fn drop_tip(&mut self, location: Location) -> Result<(), HardwareFault> {
        self.begin(true)?;
        self.tip = None;
        self.held_ul = 0.0;
        self.log.push(PipetteCommand::Drop(location));
        Ok(())
    }

    fn aspirate(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.begin(true)?;
        let held = self.take_in(volume_ul)?;
        self.log.push(PipetteCommand::Aspirate(volume_ul, location));
        Ok(held)
    }

    fn dispense(&mut self, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.begin(true)?;
        if volume_ul > self.held_ul + VOLUME_EPSILON {
            return Err(HardwareFault::InsufficientVolume {
                requested_ul: volume_ul,
                held_ul: self.held_ul,
            });
        }
        self.held_ul = (self.held_ul - volume_ul).max(0.0);
        self.log.push(PipetteCommand::Dispense(volume_ul, location));
        Ok(self.held_ul)
    }

    fn mix(&mut self, reps: u8, volume_ul: f32, location: Location) -> Result<f32, HardwareFault> {
        self.begin(true)?;
        if self.held_ul + volume_ul > self.max_volume_ul + VOLUME_EPSILON {
            return Err(HardwareFault::OverCapacity {
                requested_ul: self.held_ul + volume_ul,
                capacity_ul: self.max_volume_ul,
            });
        }
        self.log.push(PipetteCommand::Mix(reps, volume_ul, location));
        Ok(self.held_ul)
    }

    fn blow_out(&mut self, location: Location) -> Result<f32, HardwareFault> {
        self.begin(true)?;
        self.held_ul = 0.0;
        self.log.push(PipetteCommand::BlowOut(location));
        Ok(self.held_ul)
    }

    fn air_gap(&mut self, volume_ul: f32) -> Result<f32, HardwareFault> {
        self.begin(true)?;
        let held = self.take_in(volume_ul)?;
        self.log.push(PipetteCommand::AirGap(volume_ul));
        Ok(held)
    }

    fn move_to(&mut self, location: Location) -> Result<f32, HardwareFault> {
        self.begin(false)?;
        self.log.push(PipetteCommand::MoveTo(location));
        Ok(self.held_ul)
    }
}
