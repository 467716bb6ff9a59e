//! Configuration loading and validation
//!
//! Parses the TOML station description and checks the invariants serde
//! cannot express: cross references between sections and volumes against
//! the mounted pipette. An invalid configuration never reaches hardware.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use beadline_core::config::MAX_SAMPLES;
use beadline_core::labware::Well;
use beadline_core::level::LevelError;
use beadline_core::tips::TipError;

use super::types::StationConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// TOML syntax or type error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Namespace unusable as a directory name
    #[error("station namespace `{0}` must be a non-empty plain name")]
    InvalidNamespace(String),
    /// Unsupported pipette
    #[error("pipette must have 1 or 8 channels, got {0}")]
    Channels(u8),
    /// Sample count outside the plate
    #[error("sample count must be between 1 and {MAX_SAMPLES}, got {0}")]
    SampleCount(u16),
    /// Recipe uses a tip role no pool provides
    #[error("no tip pool provides role `{0}`")]
    UnknownTipRole(String),
    /// Tip pool definition rejected
    #[error(transparent)]
    Tips(#[from] TipError),
    /// Reservoir definition rejected
    #[error("reservoir {well:?}: {source}")]
    Reservoir {
        /// Offending well
        well: Well,
        /// Why it was rejected
        source: LevelError,
    },
    /// Recipe draws from a well that is not a tracked reservoir
    #[error("source well {0:?} is not a configured reservoir")]
    UnregisteredSource(Well),
    /// Reagent with no source wells
    #[error("no source wells configured for {0}")]
    NoSources(String),
    /// A stroke does not fit in the pipette
    #[error("{what}: {volume_ul} µl exceeds the {capacity_ul} µl pipette")]
    ExceedsCapacity {
        /// Which volume
        what: String,
        /// Volume including any transit air gap
        volume_ul: f32,
        /// Pipette maximum
        capacity_ul: f32,
    },
    /// Tip parking enabled without a rack to park in
    #[error("tip parking is enabled but no parking rack is configured")]
    MissingParkingRack,
    /// Waste threshold of zero would alert on every drop
    #[error("waste threshold must be positive")]
    ZeroWasteThreshold,
}

/// Load and validate the configuration file at `path`
pub fn load_config(path: impl AsRef<Path>) -> Result<StationConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Parse and validate a TOML document
pub fn parse_config(text: &str) -> Result<StationConfig, ConfigError> {
    let config: StationConfig = toml::from_str(text)?;
    config.validate()?;
    log_config_summary(&config);
    Ok(config)
}

impl std::str::FromStr for StationConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_config(text)
    }
}

impl StationConfig {
    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.station.namespace;
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || namespace == "."
            || namespace == ".."
        {
            return Err(ConfigError::InvalidNamespace(namespace.clone()));
        }
        if !matches!(self.pipette.channels, 1 | 8) {
            return Err(ConfigError::Channels(self.pipette.channels));
        }

        let recipe = &self.purification;
        if recipe.sample_count == 0 || recipe.sample_count > MAX_SAMPLES {
            return Err(ConfigError::SampleCount(recipe.sample_count));
        }

        let tips = self.build_tips()?;
        if tips.pool(recipe.tip_role.as_str()).is_none() {
            return Err(ConfigError::UnknownTipRole(recipe.tip_role.to_string()));
        }

        if recipe.binding.sources.is_empty() {
            return Err(ConfigError::NoSources("binding buffer".into()));
        }
        for wash in &recipe.washes {
            if wash.sources.is_empty() {
                return Err(ConfigError::NoSources(wash.label.to_string()));
            }
        }
        let levels = self.build_levels()?;
        if let Some(well) = recipe.reagent_sources().find(|w| !levels.is_registered(*w)) {
            return Err(ConfigError::UnregisteredSource(well));
        }

        self.validate_volumes()?;

        if recipe.park_tips && recipe.layout.parking_rack.is_none() {
            return Err(ConfigError::MissingParkingRack);
        }
        if self.waste.threshold == 0 {
            return Err(ConfigError::ZeroWasteThreshold);
        }
        Ok(())
    }

    fn validate_volumes(&self) -> Result<(), ConfigError> {
        let recipe = &self.purification;
        let capacity_ul = self.pipette.max_volume_ul;
        let gap = recipe.air_gap_ul;
        let check = |what: &str, volume_ul: f32| {
            if volume_ul > capacity_ul {
                Err(ConfigError::ExceedsCapacity {
                    what: what.to_owned(),
                    volume_ul,
                    capacity_ul,
                })
            } else {
                Ok(())
            }
        };

        let binding = &recipe.binding;
        check("binding leg", binding.max_leg_ul.min(binding.volume_ul) + gap)?;
        check("binding premix", binding.premix_volume_ul)?;
        check("binding mix", binding.mix_volume_ul)?;
        for wash in &recipe.washes {
            check(wash.label.as_str(), recipe.max_leg_ul.min(wash.volume_ul) + gap)?;
            check(wash.label.as_str(), wash.mix_volume_ul)?;
        }
        check("supernatant leg", recipe.supernatant.max_leg_ul + gap)?;
        check("elution", recipe.max_leg_ul.min(recipe.elution.volume_ul) + gap)?;
        check("elution mix", recipe.elution.mix_volume_ul)?;
        Ok(())
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &StationConfig) {
    info!(
        "Station `{}`: {} samples, tracking {}, simulate {}",
        config.station.namespace,
        config.purification.sample_count,
        config.station.track_tips,
        config.station.simulate
    );
    debug!("  {} tip pools", config.tip_pools.len());
    debug!("  {} reservoirs", config.reservoirs.len());
    debug!("  {} wash rounds", config.purification.washes.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, StationConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = parse_config(
            r#"
            [station]
            namespace = "station_b_s9"
            track_tips = true

            [purification]
            sample_count = 24
            park_tips = true

            [waste]
            threshold = 480
            "#,
        )
        .unwrap();
        assert_eq!(config.station.namespace, "station_b_s9");
        assert!(config.station.track_tips);
        assert!(config.station.simulate);
        assert_eq!(config.purification.columns(), 3);
        assert_eq!(config.waste.threshold, 480);
        assert_eq!(config.waste.right_offset_mm, 30.0);
    }

    #[test]
    fn test_unknown_tip_role() {
        let err = parse_config(
            r#"
            [purification]
            tip_role = "tips20"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTipRole(role) if role == "tips20"));
    }

    #[test]
    fn test_leg_over_capacity() {
        let err = parse_config(
            r#"
            [pipette]
            max_volume_ul = 200.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ExceedsCapacity { .. }));
    }

    #[test]
    fn test_parking_needs_rack() {
        let mut config = StationConfig::default();
        config.purification.park_tips = true;
        config.purification.layout.parking_rack = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingParkingRack)));
    }

    #[test]
    fn test_unregistered_source() {
        let mut config = StationConfig::default();
        config.reservoirs.retain(|r| r.well != Well::new(5, 11));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnregisteredSource(w)) if w == Well::new(5, 11)
        ));
    }

    #[test]
    fn test_bad_namespace() {
        let mut config = StationConfig::default();
        config.station.namespace = "../elsewhere".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidNamespace(_))));
    }

    #[test]
    fn test_too_many_washes_rejected_by_parser() {
        let wash = r#"
            [[purification.washes]]
            label = "w"
            volume_ul = 100.0
            sources = [{ labware = 5, index = 3 }]
            mix_reps = 1
            mix_volume_ul = 100.0
            incubation_s = 1
        "#;
        assert!(matches!(
            parse_config(&wash.repeat(5)),
            Err(ConfigError::Parse(_))
        ));
    }
}
