//! Purification sequencer
//!
//! Drives the bind / wash / dry / elute workflow over every sample column.
//! The sequencer owns the workflow state; the consumables (tips, waste,
//! reservoir levels) are owned by the caller so they can be restored from
//! and written back to durable storage around a run.

pub mod executor;
pub mod parking;
mod steps;

use thiserror::Error;
use tracing::info;

use crate::level::LiquidLevelTracker;
use crate::state::{Event, Step};
use crate::tips::{TipError, TipInventory};
use crate::traits::{HardwareFault, OperatorError};
use crate::transfer::PlanError;
use crate::waste::{WasteError, WasteManager};

pub use executor::PurificationSequencer;
pub use parking::{ParkingError, ParkingMap};

/// Sequencer errors
///
/// Every variant is fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    /// Event does not move the run forward
    #[error("event {event:?} is not valid in step {from}")]
    InvalidTransition {
        /// Step the run was in
        from: Step,
        /// Rejected event
        event: Event,
    },
    /// Recipe names a reagent without source wells
    #[error("no source wells configured for {0}")]
    MissingSource(String),
    /// Tip inventory failure
    #[error(transparent)]
    Tip(#[from] TipError),
    /// Transfer could not be planned
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Tip waste failure
    #[error(transparent)]
    Waste(#[from] WasteError),
    /// Tip parking failure
    #[error(transparent)]
    Parking(#[from] ParkingError),
    /// Robot hardware fault
    #[error(transparent)]
    Hardware(#[from] HardwareFault),
    /// Operator aborted or went away
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

impl SequenceError {
    /// Check if the error came from robot hardware
    pub fn is_hardware_fault(&self) -> bool {
        matches!(
            self,
            SequenceError::Hardware(_) | SequenceError::Waste(WasteError::Hardware(_))
        )
    }
}

/// Consumables shared with the rest of the station
#[derive(Debug)]
pub struct Consumables {
    /// Tip cursors
    pub tips: TipInventory,
    /// Tip waste estimate
    pub waste: WasteManager,
    /// Reservoir levels
    pub levels: LiquidLevelTracker,
}

/// Workflow state owned by the sequencer
#[derive(Debug, Clone, PartialEq)]
pub struct PurificationState {
    /// Current step
    pub step: Step,
    /// Magnet position as last commanded
    pub magnet_engaged: bool,
    /// Parked tips
    pub parking: ParkingMap,
    wash_rounds: u8,
}

impl PurificationState {
    /// Fresh state before the run starts
    pub fn new(wash_rounds: u8, parking: ParkingMap) -> Self {
        Self {
            step: Step::Idle,
            magnet_engaged: false,
            parking,
            wash_rounds,
        }
    }

    /// Wash rounds in the recipe
    pub fn wash_rounds(&self) -> u8 {
        self.wash_rounds
    }

    /// Feed a completion event into the state machine
    pub fn apply(&mut self, event: Event) -> Result<Step, SequenceError> {
        let next = self
            .step
            .transition(event, self.wash_rounds)
            .ok_or(SequenceError::InvalidTransition {
                from: self.step,
                event,
            })?;
        info!("Step {} -> {}", self.step, next);
        self.step = next;
        Ok(next)
    }
}
