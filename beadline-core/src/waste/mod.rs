//! Tip waste accounting
//!
//! Counts tips ejected into the trash and alternates the drop position so
//! tips pile evenly. When the bin is full the empty-waste alert runs before
//! the next command.

pub mod alert;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WasteConfig;
use crate::labware::Location;
use crate::traits::{Deck, HardwareFault, OperatorError};

pub use alert::{run_empty_waste_protocol, EMPTY_WASTE_MESSAGE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Waste errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WasteError {
    /// The drop or the homing move failed
    #[error(transparent)]
    Hardware(#[from] HardwareFault),
    /// The empty-waste pause was not acknowledged
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Persisted fill estimate of the tip waste
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WasteCounter {
    /// Tips in the bin since it was last emptied
    pub count: u32,
    /// Next drop goes right when set
    pub toggle: bool,
}

/// Result of one drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropOutcome {
    /// Where the tip was ejected
    pub location: Location,
    /// Tips in the bin after the drop (0 if it was emptied)
    pub count: u32,
    /// The empty-waste alert ran
    pub emptied: bool,
}

/// Tip waste state
#[derive(Debug, Clone)]
pub struct WasteManager {
    config: WasteConfig,
    counter: WasteCounter,
    cycles: u32,
}

impl WasteManager {
    /// Create a manager with an empty bin; the first drop goes right
    pub fn new(config: WasteConfig) -> Self {
        Self {
            config,
            counter: WasteCounter {
                count: 0,
                toggle: true,
            },
            cycles: 0,
        }
    }

    /// Tips currently in the bin
    pub fn count(&self) -> u32 {
        self.counter.count
    }

    /// Empty-waste alerts run so far in this session
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Configuration in use
    pub fn config(&self) -> &WasteConfig {
        &self.config
    }

    /// Point the next drop will use
    pub fn next_location(&self) -> Location {
        let dx = if self.counter.toggle {
            self.config.right_offset_mm
        } else {
            self.config.left_offset_mm
        };
        self.config.trash.top(0.0).shifted_x(dx)
    }

    /// Eject the attached tip into the trash
    ///
    /// Flips the drop side and adds the pipette's channel count to the
    /// fill estimate. When the estimate reaches the threshold the
    /// empty-waste alert runs before this returns and the count restarts
    /// at 0.
    pub fn drop_tip(&mut self, deck: &mut Deck<'_>) -> Result<DropOutcome, WasteError> {
        let location = self.next_location();
        deck.pipette.drop_tip(location)?;

        self.counter.toggle = !self.counter.toggle;
        self.counter.count = self
            .counter
            .count
            .saturating_add(u32::from(deck.pipette.channels()));
        debug!(
            "Dropped tip at {:+} mm, waste holds {}/{}",
            location.x_offset_mm, self.counter.count, self.config.threshold
        );

        let mut emptied = false;
        if self.counter.count >= self.config.threshold {
            info!("Tip waste full ({} tips), requesting empty", self.counter.count);
            run_empty_waste_protocol(deck, self.config.blink_interval())?;
            self.counter.count = 0;
            self.cycles += 1;
            emptied = true;
        }

        Ok(DropOutcome {
            location,
            count: self.counter.count,
            emptied,
        })
    }

    /// Restore the fill estimate from a previous session
    ///
    /// `None` starts from an empty bin with the first drop on the right.
    /// A stored count above the threshold is clamped to it, so the next
    /// drop asks for the bin to be emptied.
    pub fn load_state(&mut self, persisted: Option<WasteCounter>) {
        let mut counter = persisted.unwrap_or(WasteCounter {
            count: 0,
            toggle: true,
        });
        if counter.count > self.config.threshold {
            warn!(
                "Stored waste count {} exceeds threshold {}, clamping",
                counter.count, self.config.threshold
            );
            counter.count = self.config.threshold;
        }
        self.counter = counter;
    }

    /// Export the fill estimate for durable storage
    pub fn snapshot(&self) -> WasteCounter {
        self.counter
    }
}

impl WasteConfig {
    /// Blink half-period as a duration
    pub fn blink_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.blink_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labware::Well;
    use crate::testing::{MockGantry, MockLights, MockMagnet, MockOperator, MockPipette};
    use crate::traits::Pipette;

    struct Rig {
        pipette: MockPipette,
        magnet: MockMagnet,
        operator: MockOperator,
        gantry: MockGantry,
        lights: MockLights,
    }

    impl Rig {
        fn new(channels: u8) -> Self {
            Self {
                pipette: MockPipette::new(channels, 300.0),
                magnet: MockMagnet::default(),
                operator: MockOperator::default(),
                gantry: MockGantry::default(),
                lights: MockLights::default(),
            }
        }

        fn deck(&mut self) -> Deck<'_> {
            Deck {
                pipette: &mut self.pipette,
                magnet: &mut self.magnet,
                temperature: None,
                operator: &mut self.operator,
                gantry: &mut self.gantry,
                lights: &self.lights,
                simulating: true,
            }
        }
    }

    fn counter(count: u32, toggle: bool) -> WasteCounter {
        WasteCounter { count, toggle }
    }

    fn fast_config() -> WasteConfig {
        WasteConfig {
            blink_interval_ms: 1,
            ..WasteConfig::default()
        }
    }

    #[test]
    fn test_threshold_triggers_once() {
        let mut rig = Rig::new(8);
        let mut waste = WasteManager::new(fast_config());

        let mut emptied_at = Vec::new();
        for i in 1..=120 {
            rig.pipette.pick_up_tip(Well::new(8, 0)).unwrap();
            let outcome = waste.drop_tip(&mut rig.deck()).unwrap();
            if outcome.emptied {
                emptied_at.push(i);
            }
        }

        assert_eq!(emptied_at, vec![120]);
        assert_eq!(waste.count(), 0);
        assert_eq!(waste.cycles(), 1);
        assert_eq!(rig.operator.pauses, vec![EMPTY_WASTE_MESSAGE.to_string()]);
        assert_eq!(rig.gantry.homes, 1);
    }

    #[test]
    fn test_drop_sides_alternate() {
        let mut rig = Rig::new(1);
        let mut waste = WasteManager::new(fast_config());

        let offsets: Vec<f32> = (0..4)
            .map(|_| waste.drop_tip(&mut rig.deck()).unwrap().location.x_offset_mm)
            .collect();
        assert_eq!(offsets, vec![30.0, -18.0, 30.0, -18.0]);
        assert_eq!(waste.count(), 4);
    }

    #[test]
    fn test_uneven_threshold_still_triggers() {
        let mut rig = Rig::new(8);
        let mut waste = WasteManager::new(WasteConfig {
            threshold: 20,
            ..fast_config()
        });
        let emptied: Vec<bool> = (0..3)
            .map(|_| waste.drop_tip(&mut rig.deck()).unwrap().emptied)
            .collect();
        assert_eq!(emptied, vec![false, false, true]);
    }

    #[test]
    fn test_failed_drop_leaves_state() {
        struct Jammed(MockPipette);
        impl Pipette for Jammed {
            fn channels(&self) -> u8 {
                self.0.channels()
            }
            fn max_volume(&self) -> f32 {
                self.0.max_volume()
            }
            fn current_volume(&self) -> f32 {
                self.0.current_volume()
            }
            fn has_tip(&self) -> bool {
                true
            }
            fn flow_rates(&self) -> crate::traits::FlowRates {
                self.0.flow_rates()
            }
            fn set_flow_rates(&mut self, rates: crate::traits::FlowRates) {
                self.0.set_flow_rates(rates)
            }
            fn pick_up_tip(&mut self, slot: Well) -> Result<(), HardwareFault> {
                self.0.pick_up_tip(slot)
            }
            fn drop_tip(&mut self, _: Location) -> Result<(), HardwareFault> {
                Err(HardwareFault::Driver("ejector jammed".into()))
            }
            fn aspirate(&mut self, v: f32, l: Location) -> Result<f32, HardwareFault> {
                self.0.aspirate(v, l)
            }
            fn dispense(&mut self, v: f32, l: Location) -> Result<f32, HardwareFault> {
                self.0.dispense(v, l)
            }
            fn mix(&mut self, r: u8, v: f32, l: Location) -> Result<f32, HardwareFault> {
                self.0.mix(r, v, l)
            }
            fn blow_out(&mut self, l: Location) -> Result<f32, HardwareFault> {
                self.0.blow_out(l)
            }
            fn air_gap(&mut self, v: f32) -> Result<f32, HardwareFault> {
                self.0.air_gap(v)
            }
            fn move_to(&mut self, l: Location) -> Result<f32, HardwareFault> {
                self.0.move_to(l)
            }
        }

        let mut pipette = Jammed(MockPipette::new(8, 300.0));
        let mut magnet = MockMagnet::default();
        let mut operator = MockOperator::default();
        let mut gantry = MockGantry::default();
        let lights = MockLights::default();
        let mut deck = Deck {
            pipette: &mut pipette,
            magnet: &mut magnet,
            temperature: None,
            operator: &mut operator,
            gantry: &mut gantry,
            lights: &lights,
            simulating: true,
        };

        let mut waste = WasteManager::new(fast_config());
        assert!(matches!(waste.drop_tip(&mut deck), Err(WasteError::Hardware(_))));
        assert_eq!(waste.snapshot(), counter(0, true));
    }

    #[test]
    fn test_load_and_snapshot() {
        let mut rig = Rig::new(8);
        let mut waste = WasteManager::new(fast_config());
        waste.load_state(Some(counter(952, false)));
        assert_eq!(waste.next_location().x_offset_mm, -18.0);

        let outcome = waste.drop_tip(&mut rig.deck()).unwrap();
        assert!(outcome.emptied);
        assert_eq!(waste.snapshot(), counter(0, true));

        waste.load_state(None);
        assert_eq!(waste.snapshot(), counter(0, true));
    }

    #[test]
    fn test_oversized_stored_count_is_clamped() {
        let mut rig = Rig::new(8);
        let mut waste = WasteManager::new(fast_config());
        waste.load_state(Some(counter(u32::MAX, true)));
        assert_eq!(waste.count(), 960);

        // Next drop empties the bin instead of overflowing
        let outcome = waste.drop_tip(&mut rig.deck()).unwrap();
        assert!(outcome.emptied);
        assert_eq!(waste.count(), 0);
        assert_eq!(rig.operator.pauses, vec![EMPTY_WASTE_MESSAGE.to_string()]);
    }
}
