//! Beadline station controller
//!
//! Wires the orchestration engine to configuration, durable run state and
//! a set of devices:
//!
//! - TOML station configuration with cross-field validation
//! - Tip and waste state persisted as JSON between sessions
//! - Structured logging through `tracing`
//! - Terminal operator for interactive checkpoints

#![deny(unsafe_code)]

pub mod config;
pub mod logging;
pub mod operator;
pub mod persistence;
pub mod station;

pub use config::{load_config, ConfigError, StationConfig};
pub use station::{RunReport, Station, StationError};
