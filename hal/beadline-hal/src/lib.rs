//! Beadline Hardware Abstraction Layer
//!
//! This crate defines the lowest-level traits the station controller talks
//! through. Anything that touches real hardware or durable storage is
//! reached via one of these traits, so the same engine can drive the robot,
//! a simulator, or a test double.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (beadline-station)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  beadline-core (engine + device traits) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  beadline-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ robot backend │       │ beadline-     │
//! │               │       │   drivers     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`store::KeyValueStore`] - Namespaced persistent storage
//! - [`lights::DeckLights`] - Deck rail-light output

#![deny(unsafe_code)]

pub mod lights;
pub mod store;

// Re-export key traits at crate root for convenience
pub use lights::DeckLights;
pub use store::{KeyValueStore, StorageKey, StoreError};
