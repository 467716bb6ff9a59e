//! Station run wrapper
//!
//! One [`Station::run`] is one session: restore run state, drive the
//! workflow to completion, write run state back. State is only written
//! after a normal completion; a failed session leaves the previous log in
//! place for the operator to adjudicate.

use thiserror::Error;
use tracing::{error, info, warn};

use beadline_core::sequencer::{Consumables, PurificationSequencer, SequenceError};
use beadline_core::state::Step;
use beadline_core::traits::Deck;
use beadline_hal::KeyValueStore;

use crate::config::{ConfigError, StationConfig};
use crate::persistence::{self, PersistenceError};

/// Station errors
#[derive(Debug, Error)]
pub enum StationError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Workflow stopped
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// Run state could not be saved
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Step the workflow ended in
    pub step: Step,
    /// Tips consumed in the current epoch, per role
    pub tips: Vec<(String, u32)>,
    /// Tips in the waste bin
    pub waste_count: u32,
    /// Empty-waste alerts during the session
    pub waste_cycles: u32,
    /// Run state was restored and written back
    pub persisted: bool,
}

/// A configured station
#[derive(Debug, Clone)]
pub struct Station {
    config: StationConfig,
}

impl Station {
    /// Validate `config` and create the station
    pub fn new(config: StationConfig) -> Result<Self, StationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Check if this session restores and saves run state
    ///
    /// Never in a dry run.
    pub fn tracks_state(&self, simulating: bool) -> bool {
        self.config.station.track_tips && !simulating
    }

    /// Check if a session on this deck must run as a dry run
    ///
    /// Without real hardware attached the session is always simulated,
    /// whatever the configuration asks for, so the run state on disk is
    /// never overwritten by a rehearsal.
    pub fn runs_dry(&self, hardware_attached: bool) -> bool {
        if !hardware_attached && !self.config.station.simulate {
            warn!("No hardware backend attached, running as a dry run");
        }
        self.config.station.simulate || !hardware_attached
    }

    /// Run one full purification session on `deck`
    pub fn run(
        &self,
        deck: &mut Deck<'_>,
        store: &mut dyn KeyValueStore,
    ) -> Result<RunReport, StationError> {
        let persisted = self.tracks_state(deck.simulating);
        let mut stock = Consumables {
            tips: self.config.build_tips()?,
            waste: self.config.build_waste(),
            levels: self.config.build_levels()?,
        };

        if persisted {
            let tips = persistence::load_tip_state(store);
            stock.tips.load_state(tips.as_ref());
            stock.waste.load_state(persistence::load_waste_state(store));
        } else {
            stock.tips.load_state(None);
            stock.waste.load_state(None);
        }

        let mut sequencer = PurificationSequencer::new(self.config.purification.clone());
        if let Err(e) = sequencer.run(deck, &mut stock) {
            error!("Run stopped in step {}: {}", sequencer.step(), e);
            return Err(e.into());
        }

        if persisted {
            persistence::save_tip_state(store, &stock.tips.snapshot())?;
            persistence::save_waste_state(store, &stock.waste.snapshot())?;
            info!("Run state saved to `{}`", store.namespace());
        }

        let tips = stock
            .tips
            .snapshot()
            .counts
            .into_iter()
            .collect();
        Ok(RunReport {
            step: sequencer.step(),
            tips,
            waste_count: stock.waste.count(),
            waste_cycles: stock.waste.cycles(),
            persisted,
        })
    }
}
