//! Purification state machine
//!
//! The run moves along a single forward path. The machine is explicit,
//! finite, and deterministic; the sequencer feeds it one completion event
//! per finished step.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::Step;
