//! Transfer planning
//!
//! Planning validates every parameter and resolves every aspiration point
//! before a single hardware command is issued. A plan that exists can be
//! executed without configuration errors.

use heapless::Vec;
use thiserror::Error;

use crate::labware::Location;
use crate::level::{LevelError, LiquidLevelTracker, ReservoirId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum legs in one transfer
pub const MAX_LEGS: usize = 32;

/// Planning errors
///
/// All of these are configuration errors: fatal, and caught before the
/// robot moves.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlanError {
    /// Total volume is zero or negative
    #[error("transfer volume must be positive, got {0} µl")]
    NonPositiveVolume(f32),
    /// Leg size is zero or negative
    #[error("maximum leg volume must be positive, got {0} µl")]
    NonPositiveLeg(f32),
    /// Negative air gap
    #[error("air gaps must not be negative, got {0} µl")]
    NegativeAirGap(f32),
    /// A leg plus its transit air gap does not fit in the tip
    #[error("leg of {leg_ul} µl plus {air_gap_ul} µl air exceeds the {capacity_ul} µl pipette")]
    ExceedsCapacity {
        /// Equal-split leg volume
        leg_ul: f32,
        /// Leading air gap
        air_gap_ul: f32,
        /// Pipette maximum
        capacity_ul: f32,
    },
    /// Mix stroke larger than the pipette
    #[error("mix volume {volume_ul} µl exceeds the {capacity_ul} µl pipette")]
    MixExceedsCapacity {
        /// Requested stroke
        volume_ul: f32,
        /// Pipette maximum
        capacity_ul: f32,
    },
    /// Split would need more legs than a plan holds
    #[error("transfer needs {0} legs, at most {MAX_LEGS} supported")]
    TooManyLegs(usize),
    /// Tracked source could not be resolved
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Where the liquid comes from
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransferSource {
    /// Same point for every leg
    Fixed(Location),
    /// Tracked reservoir; each leg draws at the level left by the previous
    Reservoir(ReservoirId),
}

/// Mixing after the final leg
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixSpec {
    /// Strokes
    pub reps: u8,
    /// Stroke volume (µl)
    pub volume_ul: f32,
    /// Mix point, the destination when `None`
    pub location: Option<Location>,
}

/// Everything needed to plan one transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferRequest {
    /// Volume to move (µl)
    pub total_ul: f32,
    /// Largest volume per leg (µl)
    pub max_leg_ul: f32,
    /// Aspiration source
    pub source: TransferSource,
    /// Dispense point
    pub destination: Location,
    /// Transit air gap taken after each aspirate (µl)
    pub air_gap_pre_ul: f32,
    /// Protective air gap taken at the end of each leg (µl)
    pub air_gap_post_ul: f32,
    /// Optional mix at the destination after the final leg
    pub mix_after: Option<MixSpec>,
    /// Blow-out point, the destination's top when `None`
    pub blow_out_at: Option<Location>,
    /// Blow out after every leg instead of only after the final one
    pub blow_out_each_leg: bool,
    /// Tips drawing from the source at once; a tracked reservoir loses
    /// `channels` times the leg volume per leg
    pub channels: u8,
}

impl TransferRequest {
    /// Plain transfer without air gaps, mixing or a custom blow-out point
    pub fn new(
        total_ul: f32,
        max_leg_ul: f32,
        source: TransferSource,
        destination: Location,
    ) -> Self {
        Self {
            total_ul,
            max_leg_ul,
            source,
            destination,
            air_gap_pre_ul: 0.0,
            air_gap_post_ul: 0.0,
            mix_after: None,
            blow_out_at: None,
            blow_out_each_leg: false,
            channels: 1,
        }
    }

    /// Set the transit and protective air gaps
    pub fn with_air_gaps(mut self, pre_ul: f32, post_ul: f32) -> Self {
        self.air_gap_pre_ul = pre_ul;
        self.air_gap_post_ul = post_ul;
        self
    }

    /// Mix at the destination after the final leg
    pub fn with_mix(mut self, mix: MixSpec) -> Self {
        self.mix_after = Some(mix);
        self
    }

    /// Blow out somewhere other than the destination's top
    pub fn with_blow_out(mut self, location: Location) -> Self {
        self.blow_out_at = Some(location);
        self
    }

    /// Blow out after every leg, not just the last
    pub fn with_blow_out_each_leg(mut self) -> Self {
        self.blow_out_each_leg = true;
        self
    }

    /// Number of tips on the head running the transfer
    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }
}

/// One metered aspirate/dispense cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    /// Liquid volume (µl)
    pub volume_ul: f32,
    /// Aspiration point
    pub source: Location,
}

/// A validated, fully resolved transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan {
    pub(crate) legs: Vec<Leg, MAX_LEGS>,
    pub(crate) destination: Location,
    pub(crate) air_gap_pre_ul: f32,
    pub(crate) air_gap_post_ul: f32,
    pub(crate) mix_after: Option<MixSpec>,
    pub(crate) blow_out_at: Location,
    pub(crate) blow_out_each_leg: bool,
}

impl TransferPlan {
    /// Legs in execution order
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Volume moved by the whole plan (µl)
    pub fn total_ul(&self) -> f32 {
        self.legs.iter().map(|l| l.volume_ul).sum()
    }

    /// Dispense point
    pub fn destination(&self) -> Location {
        self.destination
    }

    /// Blow-out point after the final leg
    pub fn blow_out_at(&self) -> Location {
        self.blow_out_at
    }

    /// Check if every leg ends with a blow-out
    pub fn blows_out_each_leg(&self) -> bool {
        self.blow_out_each_leg
    }
}

/// Split a transfer into equal legs
///
/// `capacity_ul` is the physical maximum of the pipette that will run the
/// plan. Tracked sources are drawn down in `levels` once per leg by the
/// volume every channel takes together; nothing is drawn if validation
/// fails.
pub fn plan(
    request: &TransferRequest,
    capacity_ul: f32,
    levels: &mut LiquidLevelTracker,
) -> Result<TransferPlan, PlanError> {
    if !(request.total_ul > 0.0) {
        return Err(PlanError::NonPositiveVolume(request.total_ul));
    }
    if !(request.max_leg_ul > 0.0) {
        return Err(PlanError::NonPositiveLeg(request.max_leg_ul));
    }
    for gap in [request.air_gap_pre_ul, request.air_gap_post_ul] {
        if gap < 0.0 {
            return Err(PlanError::NegativeAirGap(gap));
        }
    }

    let leg_count = (request.total_ul / request.max_leg_ul).ceil().max(1.0) as usize;
    if leg_count > MAX_LEGS {
        return Err(PlanError::TooManyLegs(leg_count));
    }
    let leg_ul = request.total_ul / leg_count as f32;

    if leg_ul + request.air_gap_pre_ul > capacity_ul {
        return Err(PlanError::ExceedsCapacity {
            leg_ul,
            air_gap_ul: request.air_gap_pre_ul,
            capacity_ul,
        });
    }
    if let Some(mix) = request.mix_after {
        if mix.volume_ul > capacity_ul {
            return Err(PlanError::MixExceedsCapacity {
                volume_ul: mix.volume_ul,
                capacity_ul,
            });
        }
    }
    if let TransferSource::Reservoir(id) = request.source {
        if !levels.is_registered(id) {
            return Err(LevelError::UnknownReservoir(id).into());
        }
    }

    let withdrawn_ul = leg_ul * f32::from(request.channels.max(1));
    let mut legs = Vec::new();
    for _ in 0..leg_count {
        let source = match request.source {
            TransferSource::Fixed(location) => location,
            TransferSource::Reservoir(id) => levels.draw_location(id, withdrawn_ul)?,
        };
        legs.push(Leg {
            volume_ul: leg_ul,
            source,
        })
        .map_err(|_| PlanError::TooManyLegs(leg_count))?;
    }

    Ok(TransferPlan {
        legs,
        destination: request.destination,
        air_gap_pre_ul: request.air_gap_pre_ul,
        air_gap_post_ul: request.air_gap_post_ul,
        mix_after: request.mix_after,
        blow_out_at: request
            .blow_out_at
            .unwrap_or_else(|| request.destination.headspace()),
        blow_out_each_leg: request.blow_out_each_leg,
    })
}
