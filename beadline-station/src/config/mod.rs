//! Station configuration
//!
//! Loads the station description from a TOML file. Every section has
//! defaults reproducing the 400 µl bead extraction station, so an empty
//! file is a valid configuration.

pub mod loader;
pub mod types;

pub use loader::{load_config, parse_config, ConfigError};
pub use types::{PipetteSection, ReservoirEntry, StationConfig, StationSection};
