//! Device and storage implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in beadline-core and beadline-hal:
//!
//! - Simulated pipette enforcing tip and volume rules, with fault injection
//! - Simulated magnetic and temperature modules with range checks
//! - Gantry, rail lights and a scripted operator for unattended runs
//! - In-memory and file-backed key-value stores

#![deny(unsafe_code)]

pub mod deck;
pub mod modules;
pub mod operator;
pub mod pipette;
pub mod store;

pub use deck::{SimGantry, SimLights};
pub use modules::{SimMagnet, SimTemperature};
pub use operator::{PauseReply, ScriptedOperator};
pub use pipette::{PipetteCommand, SimPipette};
pub use store::{FileStore, MemoryStore};
