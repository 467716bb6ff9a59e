//! Step choreography
//!
//! One function per workflow step. Each walks every sample column and
//! leaves the magnet, tips and parking map in the state the next step
//! expects.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Consumables, PurificationState, SequenceError};
use crate::config::{source_for_column, PurificationConfig, WashConfig};
use crate::labware::{Location, Well};
use crate::traits::Deck;
use crate::transfer::{plan, MixSpec, TransferRequest, TransferSource};

/// Premix aspiration height at the reagent source (mm)
const PREMIX_ASPIRATE_MM: f32 = 0.5;

/// Premix dispense height at the reagent source (mm)
const PREMIX_DISPENSE_MM: f32 = 5.0;

/// Mix height in the sample well for the binding step (mm)
const BIND_MIX_MM: f32 = 1.0;

/// Blow-out below the well top after binding and eluate transfer (mm)
const BLOW_OUT_BELOW_TOP_MM: f32 = -2.0;

/// Blow-out height after elution buffer delivery (mm)
const ELUTION_BLOW_OUT_MM: f32 = 5.0;

pub(super) struct Runner<'r, 'd> {
    pub config: &'r PurificationConfig,
    pub deck: &'r mut Deck<'d>,
    pub stock: &'r mut Consumables,
    pub state: &'r mut PurificationState,
}

impl Runner<'_, '_> {
    /// Bring modules and flow rates to their starting state
    pub fn setup(&mut self) -> Result<(), SequenceError> {
        self.disengage()?;
        match (self.config.elution_temperature_c, self.deck.temperature.as_deref_mut()) {
            (Some(celsius), Some(module)) => {
                module.set_temperature(celsius)?;
                info!("Elution block set to {} °C", celsius);
            }
            (Some(_), None) => warn!("Elution temperature configured but no module fitted"),
            _ => {}
        }
        self.deck.pipette.set_flow_rates(self.config.flow_rates);
        Ok(())
    }

    pub fn bind(&mut self) -> Result<(), SequenceError> {
        let config = self.config;
        let binding = &config.binding;
        let park = config.park_tips;

        for column in 0..config.columns() {
            let well = config.sample_column(column);
            let source = source_for_column(&binding.sources, column)
                .ok_or_else(|| SequenceError::MissingSource("binding buffer".into()))?;

            self.pick_up(column, false)?;
            for _ in 0..binding.premix_reps {
                self.deck
                    .pipette
                    .aspirate(binding.premix_volume_ul, source.bottom(PREMIX_ASPIRATE_MM))?;
                self.deck
                    .pipette
                    .dispense(binding.premix_volume_ul, source.bottom(PREMIX_DISPENSE_MM))?;
            }

            let request = TransferRequest::new(
                binding.volume_ul,
                binding.max_leg_ul,
                TransferSource::Reservoir(source),
                well.top(0.0),
            )
            .with_air_gaps(config.air_gap_ul, config.air_gap_ul)
            .with_mix(MixSpec {
                reps: binding.mix_reps,
                volume_ul: binding.mix_volume_ul,
                location: Some(well.bottom(BIND_MIX_MM)),
            })
            .with_blow_out(well.top(BLOW_OUT_BELOW_TOP_MM));
            self.transfer(&request)?;
            self.release(column, park)?;
        }

        self.engage()?;
        self.incubate(binding.incubation_s, "on magnet")?;
        self.remove_supernatant(binding.volume_ul + config.sample_volume_ul, park)
    }

    pub fn wash(&mut self, round: u8) -> Result<(), SequenceError> {
        let config = self.config;
        let wash = wash_config(config, round)?;
        let park = config.park_tips;
        self.deck
            .operator
            .comment(&format!("Wash {}: {}", round, wash.label));

        self.disengage()?;
        for column in 0..config.columns() {
            let well = config.sample_column(column);
            let source = source_for_column(&wash.sources, column)
                .ok_or_else(|| SequenceError::MissingSource(wash.label.as_str().into()))?;

            self.pick_up(column, false)?;
            let request = TransferRequest::new(
                wash.volume_ul,
                config.max_leg_ul,
                TransferSource::Reservoir(source),
                well.top(0.0),
            )
            .with_air_gaps(config.air_gap_ul, config.air_gap_ul)
            .with_mix(MixSpec {
                reps: wash.mix_reps,
                volume_ul: wash.mix_volume_ul,
                location: Some(self.mix_point(well, column)),
            });
            self.transfer(&request)?;
            self.release(column, park)?;
        }

        self.engage()?;
        self.incubate(wash.incubation_s, "on magnet")?;
        self.remove_supernatant(wash.volume_ul, park)
    }

    pub fn dry(&mut self) -> Result<(), SequenceError> {
        self.disengage()?;
        let seconds = self.config.drying_s;
        self.deck.operator.delay(
            Duration::from_secs(u64::from(seconds)),
            &format!("Airdrying beads at room temperature for {} s.", seconds),
        )?;
        Ok(())
    }

    pub fn elute(&mut self) -> Result<(), SequenceError> {
        let config = self.config;
        let elution = &config.elution;
        let park = config.park_tips;

        for column in 0..config.columns() {
            let well = config.sample_column(column);
            let resuspend_at = self.mix_point(well, column);

            self.pick_up(column, false)?;
            let request = TransferRequest::new(
                elution.volume_ul,
                config.max_leg_ul,
                TransferSource::Reservoir(elution.source),
                resuspend_at,
            )
            .with_air_gaps(0.0, config.air_gap_ul)
            .with_mix(MixSpec {
                reps: elution.mix_reps,
                volume_ul: elution.mix_volume_ul,
                location: None,
            })
            .with_blow_out(well.bottom(ELUTION_BLOW_OUT_MM));
            self.transfer(&request)?;
            self.release(column, park)?;
        }

        self.incubate(elution.off_magnet_s, "off magnet")?;
        self.engage()?;
        self.incubate(elution.on_magnet_s, "on magnet")?;

        for column in 0..config.columns() {
            let well = config.sample_column(column);
            let target = config.elution_column(column);

            self.pick_up(column, park)?;
            let request = TransferRequest::new(
                elution.volume_ul,
                config.max_leg_ul,
                TransferSource::Fixed(self.pellet_clear_point(well, column)),
                target.bottom(elution.dispense_height_mm),
            )
            .with_air_gaps(config.air_gap_ul, config.air_gap_ul)
            .with_blow_out(target.top(BLOW_OUT_BELOW_TOP_MM));
            self.transfer(&request)?;
            self.stock.waste.drop_tip(self.deck)?;
        }
        Ok(())
    }

    fn remove_supernatant(&mut self, volume_ul: f32, parked: bool) -> Result<(), SequenceError> {
        let rates = self.deck.pipette.flow_rates();
        let mut slow = rates;
        slow.aspirate = self.config.supernatant.aspirate_rate;
        self.deck.pipette.set_flow_rates(slow);

        let result = self.supernatant_pass(volume_ul, parked);

        self.deck.pipette.set_flow_rates(rates);
        result
    }

    fn supernatant_pass(&mut self, volume_ul: f32, parked: bool) -> Result<(), SequenceError> {
        let waste = self.config.layout.liquid_waste;
        debug!("Removing {} µl supernatant per column", volume_ul);

        for column in 0..self.config.columns() {
            let well = self.config.sample_column(column);
            self.pick_up(column, parked)?;
            let request = TransferRequest::new(
                volume_ul,
                self.config.supernatant.max_leg_ul,
                TransferSource::Fixed(self.pellet_clear_point(well, column)),
                waste.top(0.0),
            )
            .with_air_gaps(self.config.air_gap_ul, self.config.air_gap_ul)
            .with_blow_out(waste.top(0.0))
            .with_blow_out_each_leg();
            self.transfer(&request)?;
            self.stock.waste.drop_tip(self.deck)?;
        }
        Ok(())
    }

    /// Aspiration point away from the pellet (even columns left, odd right)
    fn pellet_clear_point(&self, well: Well, column: u16) -> Location {
        let s = &self.config.supernatant;
        well.bottom(s.clearance_mm)
            .shifted_x(side(column, -1.0) * s.side_offset_mm)
    }

    /// Resuspension point on the pellet side (even columns right, odd left)
    fn mix_point(&self, well: Well, column: u16) -> Location {
        let s = &self.config.supernatant;
        well.bottom(s.clearance_mm)
            .shifted_x(side(column, 1.0) * s.side_offset_mm)
    }

    fn transfer(&mut self, request: &TransferRequest) -> Result<(), SequenceError> {
        let capacity = self.deck.pipette.max_volume();
        let request = request.with_channels(self.deck.pipette.channels());
        let plan = plan(&request, capacity, &mut self.stock.levels)?;
        plan.execute(self.deck.pipette)?;
        Ok(())
    }

    /// Pick up a fresh tip, or the tip `column` parked earlier
    fn pick_up(&mut self, column: u16, parked: bool) -> Result<(), SequenceError> {
        let role = self.config.tip_role.as_str();
        let slot = if parked {
            let spot = self.state.parking.retrieve(column)?;
            self.stock.tips.acquire_at(role, spot)?
        } else {
            self.stock.tips.acquire(role, self.deck.operator)?
        };
        self.deck.pipette.pick_up_tip(slot)?;
        Ok(())
    }

    /// Park the tip for `column`, or send it to the waste
    fn release(&mut self, column: u16, park: bool) -> Result<(), SequenceError> {
        if park {
            let spot = self.state.parking.park(column)?;
            self.deck.pipette.drop_tip(spot.top(0.0))?;
        } else {
            self.stock.waste.drop_tip(self.deck)?;
        }
        Ok(())
    }

    fn engage(&mut self) -> Result<(), SequenceError> {
        self.deck.magnet.engage(self.config.magnet_height_mm)?;
        self.state.magnet_engaged = true;
        Ok(())
    }

    fn disengage(&mut self) -> Result<(), SequenceError> {
        self.deck.magnet.disengage()?;
        self.state.magnet_engaged = false;
        Ok(())
    }

    fn incubate(&mut self, seconds: u32, place: &str) -> Result<(), SequenceError> {
        self.deck.operator.delay(
            Duration::from_secs(u64::from(seconds)),
            &format!("Incubating {} for {} s.", place, seconds),
        )?;
        Ok(())
    }
}

/// Recipe for 1-based wash `round`
fn wash_config(config: &PurificationConfig, round: u8) -> Result<&WashConfig, SequenceError> {
    usize::from(round)
        .checked_sub(1)
        .and_then(|i| config.washes.get(i))
        .ok_or_else(|| SequenceError::MissingSource(format!("wash round {}", round)))
}

/// `sign` for even columns, `-sign` for odd ones
fn side(column: u16, sign: f32) -> f32 {
    if column % 2 == 0 {
        sign
    } else {
        -sign
    }
}
