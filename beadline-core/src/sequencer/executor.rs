//! Sequencer execution
//!
//! Runs the workflow one step at a time. Each finished step is reported
//! to the state machine as a completion event; the state machine decides
//! what runs next.

use tracing::{error, info, warn};

use super::parking::ParkingMap;
use super::steps::Runner;
use super::{Consumables, PurificationState, SequenceError};
use crate::config::PurificationConfig;
use crate::state::{Event, Step};
use crate::traits::Deck;

/// Purification workflow driver
#[derive(Debug, Clone)]
pub struct PurificationSequencer {
    config: PurificationConfig,
    state: PurificationState,
}

impl PurificationSequencer {
    /// Create a sequencer at [`Step::Idle`]
    pub fn new(config: PurificationConfig) -> Self {
        let parking = ParkingMap::new(config.layout.parking_rack);
        let wash_rounds = config.washes.len() as u8;
        Self {
            config,
            state: PurificationState::new(wash_rounds, parking),
        }
    }

    /// Recipe in use
    pub fn config(&self) -> &PurificationConfig {
        &self.config
    }

    /// Workflow state
    pub fn state(&self) -> &PurificationState {
        &self.state
    }

    /// Current step
    pub fn step(&self) -> Step {
        self.state.step
    }

    /// Run every remaining step until [`Step::Done`]
    pub fn run(
        &mut self,
        deck: &mut Deck<'_>,
        stock: &mut Consumables,
    ) -> Result<(), SequenceError> {
        info!(
            "Starting purification of {} samples ({} columns)",
            self.config.sample_count,
            self.config.columns()
        );
        while !self.state.step.is_terminal() {
            self.advance(deck, stock)?;
        }
        info!("Purification complete");
        Ok(())
    }

    /// Execute the current step and move to the next one
    ///
    /// From `Idle` this performs the deck setup and enters `Binding`.
    /// On a hardware fault the attached tip, if any, is dropped into the
    /// trash before the fault is returned.
    pub fn advance(
        &mut self,
        deck: &mut Deck<'_>,
        stock: &mut Consumables,
    ) -> Result<Step, SequenceError> {
        let step = self.state.step;
        let result = self.execute(step, deck, stock);

        let event = match result {
            Ok(event) => event,
            Err(e) => {
                error!("Step {} failed: {}", step, e);
                if e.is_hardware_fault() {
                    release_tip(deck, stock);
                }
                return Err(e);
            }
        };
        self.state.apply(event)
    }

    fn execute(
        &mut self,
        step: Step,
        deck: &mut Deck<'_>,
        stock: &mut Consumables,
    ) -> Result<Event, SequenceError> {
        let mut runner = Runner {
            config: &self.config,
            deck,
            stock,
            state: &mut self.state,
        };

        match step {
            Step::Idle => {
                runner.setup()?;
                Ok(Event::Start)
            }
            Step::Binding => {
                runner.bind()?;
                Ok(Event::BindComplete)
            }
            Step::Washing(round) => {
                runner.wash(round)?;
                Ok(Event::WashComplete(round))
            }
            Step::Drying => {
                runner.dry()?;
                Ok(Event::DryComplete)
            }
            Step::Eluting => {
                runner.elute()?;
                Ok(Event::EluteComplete)
            }
            Step::Done => Err(SequenceError::InvalidTransition {
                from: Step::Done,
                event: Event::EluteComplete,
            }),
        }
    }
}

/// Best-effort tip release after a fault
///
/// Not counted toward the waste and does not flip the drop side.
fn release_tip(deck: &mut Deck<'_>, stock: &Consumables) {
    if !deck.pipette.has_tip() {
        return;
    }
    let trash = stock.waste.config().trash.top(0.0);
    match deck.pipette.drop_tip(trash) {
        Ok(()) => warn!("Dropped attached tip into the trash after fault"),
        Err(e) => error!("Could not release tip after fault: {}", e),
    }
}
