//! Volume-split transfers
//!
//! Volumes larger than one pipette stroke are split into equal legs. Each
//! leg is protected by air gaps so droplets stay in the tip while the head
//! travels between source and destination.

pub mod execute;
pub mod plan;

pub use plan::{
    plan, Leg, MixSpec, PlanError, TransferPlan, TransferRequest, TransferSource, MAX_LEGS,
};
