//! Transfer execution

use tracing::debug;

use super::plan::TransferPlan;
use crate::traits::{HardwareFault, Pipette};

impl TransferPlan {
    /// Run every leg on `pipette`
    ///
    /// A tip must already be attached. Returns the volume held when the
    /// plan finishes (the protective air gap, if any). Hardware faults stop
    /// the transfer immediately.
    pub fn execute(&self, pipette: &mut dyn Pipette) -> Result<f32, HardwareFault> {
        if !pipette.has_tip() {
            return Err(HardwareFault::NoTip);
        }

        let last = self.legs.len().saturating_sub(1);
        let mut held = pipette.current_volume();

        for (i, leg) in self.legs.iter().enumerate() {
            if held > 0.0 {
                // Residual air from the previous leg goes into headspace
                debug!("Voiding {} µl residual before leg {}", held, i + 1);
                pipette.dispense(held, self.destination.headspace())?;
            }

            pipette.aspirate(leg.volume_ul, leg.source)?;
            if self.air_gap_pre_ul > 0.0 {
                pipette.air_gap(self.air_gap_pre_ul)?;
            }
            let loaded = pipette.current_volume();
            held = pipette.dispense(loaded, self.destination)?;

            if i == last {
                if let Some(mix) = self.mix_after {
                    let at = mix.location.unwrap_or(self.destination);
                    held = pipette.mix(mix.reps, mix.volume_ul, at)?;
                }
                held = pipette.blow_out(self.blow_out_at)?;
            } else if self.blow_out_each_leg {
                held = pipette.blow_out(self.blow_out_at)?;
            }

            if self.air_gap_post_ul > 0.0 {
                held = pipette.air_gap(self.air_gap_post_ul)?;
            }

            debug!(
                "Leg {}/{}: {} µl, holding {} µl",
                i + 1,
                self.legs.len(),
                leg.volume_ul,
                held
            );
        }

        Ok(held)
    }
}
