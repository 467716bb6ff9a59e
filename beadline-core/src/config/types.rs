//! Purification recipe configuration
//!
//! One [`PurificationConfig`] describes a complete bind / wash / dry /
//! elute recipe. The defaults reproduce the 400 µl-input magnetic bead
//! extraction run on the 2 ml deep-well plate.

use heapless::{String, Vec};

use crate::labware::{LabwareId, Well, COLUMNS_PER_PLATE, ROWS_PER_COLUMN};
use crate::traits::FlowRates;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum wash rounds per recipe
pub const MAX_WASHES: usize = 4;

/// Maximum source wells per reagent
pub const MAX_SOURCES: usize = 12;

/// Maximum samples on one plate
pub const MAX_SAMPLES: u16 = 96;

/// Bounded label
pub type Label = String<MAX_LABEL_LEN>;

/// Build a label, `None` if `s` is too long
pub fn label(s: &str) -> Option<Label> {
    let mut l = Label::new();
    l.push_str(s).ok()?;
    Some(l)
}

/// Source wells for a reagent split across several reservoir wells
pub type Sources = Vec<Well, MAX_SOURCES>;

/// Pick the source well serving `column`
///
/// Columns are spread evenly over the sources: with 4 wells, columns
/// 0-2 use the first, 3-5 the second and so on.
pub fn source_for_column(sources: &[Well], column: u16) -> Option<Well> {
    if sources.is_empty() {
        return None;
    }
    let n = sources.len() as u16;
    let per_source = (COLUMNS_PER_PLATE / n).max(1);
    let index = (column / per_source).min(n - 1);
    sources.get(index as usize).copied()
}

/// Deck positions used by the recipe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlateLayout {
    /// Deep-well plate sitting on the magnetic module
    pub sample_plate: LabwareId,
    /// Plate receiving the eluate (on the temperature block)
    pub elution_plate: LabwareId,
    /// Liquid waste reservoir
    pub liquid_waste: Well,
    /// Empty tip rack used for parking, when parking is enabled
    pub parking_rack: Option<LabwareId>,
}

impl Default for PlateLayout {
    fn default() -> Self {
        Self {
            sample_plate: 4,
            elution_plate: 1,
            liquid_waste: Well::new(11, 0),
            parking_rack: Some(7),
        }
    }
}

/// Bead binding step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BindingConfig {
    /// Binding buffer + beads delivered per column (µl)
    pub volume_ul: f32,
    /// Largest single leg for the delivery (µl)
    pub max_leg_ul: f32,
    /// Reservoir wells holding the buffer
    pub sources: Sources,
    /// Resuspension strokes at the source before drawing
    pub premix_reps: u8,
    /// Resuspension stroke volume (µl)
    pub premix_volume_ul: f32,
    /// Mix strokes in the sample well
    pub mix_reps: u8,
    /// Mix stroke volume (µl)
    pub mix_volume_ul: f32,
    /// On-magnet incubation (seconds)
    pub incubation_s: u32,
}

impl Default for BindingConfig {
    fn default() -> Self {
        let mut sources = Vec::new();
        let _ = sources.push(Well::new(5, 0));
        let _ = sources.push(Well::new(5, 1));
        Self {
            volume_ul: 210.0,
            max_leg_ul: 210.0,
            sources,
            premix_reps: 5,
            premix_volume_ul: 180.0,
            mix_reps: 5,
            mix_volume_ul: 200.0,
            incubation_s: 120,
        }
    }
}

/// One wash round
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WashConfig {
    /// Display label
    pub label: Label,
    /// Wash volume per column (µl)
    pub volume_ul: f32,
    /// Reservoir wells holding the buffer
    pub sources: Sources,
    /// Mix strokes after delivery
    pub mix_reps: u8,
    /// Mix stroke volume (µl)
    pub mix_volume_ul: f32,
    /// On-magnet incubation (seconds)
    pub incubation_s: u32,
}

impl WashConfig {
    fn reference(
        name: &str,
        labware: LabwareId,
        wells: core::ops::Range<u16>,
        mix_reps: u8,
        volume_ul: f32,
    ) -> Self {
        let mut sources = Vec::new();
        for index in wells {
            let _ = sources.push(Well::new(labware, index));
        }
        Self {
            label: label(name).unwrap_or_default(),
            volume_ul,
            sources,
            mix_reps,
            mix_volume_ul: 150.0,
            incubation_s: 300,
        }
    }
}

/// Elution step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ElutionConfig {
    /// Elution buffer per column (µl)
    pub volume_ul: f32,
    /// Reservoir well holding the buffer
    pub source: Well,
    /// Resuspension strokes
    pub mix_reps: u8,
    /// Resuspension stroke volume (µl)
    pub mix_volume_ul: f32,
    /// Off-magnet incubation (seconds)
    pub off_magnet_s: u32,
    /// On-magnet incubation (seconds)
    pub on_magnet_s: u32,
    /// Height above the elution well bottom for the final dispense (mm)
    pub dispense_height_mm: f32,
}

impl Default for ElutionConfig {
    fn default() -> Self {
        Self {
            volume_ul: 40.0,
            source: Well::new(5, 11),
            mix_reps: 10,
            mix_volume_ul: 30.0,
            off_magnet_s: 120,
            on_magnet_s: 120,
            dispense_height_mm: 5.0,
        }
    }
}

/// Supernatant removal parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SupernatantConfig {
    /// Slow aspirate rate used while pulling liquid off the pellet (µl/s)
    pub aspirate_rate: f32,
    /// Largest single leg (µl)
    pub max_leg_ul: f32,
    /// Aspiration height above the well bottom (mm)
    pub clearance_mm: f32,
    /// Lateral offset away from the pellet wall (mm)
    pub side_offset_mm: f32,
}

impl Default for SupernatantConfig {
    fn default() -> Self {
        Self {
            aspirate_rate: 30.0,
            max_leg_ul: 200.0,
            clearance_mm: 0.5,
            side_offset_mm: 2.0,
        }
    }
}

/// Complete purification recipe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PurificationConfig {
    /// Samples on the plate (1-96)
    pub sample_count: u16,
    /// Sample volume already in each well (µl)
    pub sample_volume_ul: f32,
    /// Tip pool used by the workflow pipette
    pub tip_role: Label,
    /// Largest leg for wash deliveries (µl)
    pub max_leg_ul: f32,
    /// Air gap taken for transit and protection (µl)
    pub air_gap_ul: f32,
    /// Flow rates applied at the start of the run
    pub flow_rates: FlowRates,
    /// Magnet engage height (mm)
    pub magnet_height_mm: f32,
    /// Elution block temperature, if a temperature module is fitted (°C)
    pub elution_temperature_c: Option<f32>,
    /// Air-dry time (seconds)
    pub drying_s: u32,
    /// Park tips between sub-operations instead of discarding them
    pub park_tips: bool,
    /// Deck positions
    pub layout: PlateLayout,
    /// Bind step
    pub binding: BindingConfig,
    /// Wash rounds, in order
    pub washes: Vec<WashConfig, MAX_WASHES>,
    /// Elution step
    pub elution: ElutionConfig,
    /// Supernatant removal
    pub supernatant: SupernatantConfig,
}

impl Default for PurificationConfig {
    fn default() -> Self {
        let mut washes = Vec::new();
        let _ = washes.push(WashConfig::reference("wash1", 5, 3..7, 20, 500.0));
        let _ = washes.push(WashConfig::reference("wash2", 5, 7..11, 20, 500.0));
        let _ = washes.push(WashConfig::reference("ethanol", 2, 0..1, 4, 800.0));

        Self {
            sample_count: 8,
            sample_volume_ul: 400.0,
            tip_role: label("tips300").unwrap_or_default(),
            max_leg_ul: 200.0,
            air_gap_ul: 20.0,
            flow_rates: FlowRates::default(),
            magnet_height_mm: 13.7,
            elution_temperature_c: Some(4.0),
            drying_s: 300,
            park_tips: false,
            layout: PlateLayout::default(),
            binding: BindingConfig::default(),
            washes,
            elution: ElutionConfig::default(),
            supernatant: SupernatantConfig::default(),
        }
    }
}

impl PurificationConfig {
    /// Number of 8-well columns holding samples
    pub fn columns(&self) -> u16 {
        self.sample_count.div_ceil(ROWS_PER_COLUMN)
    }

    /// Row-A well of sample column `column` on the magnetic plate
    pub fn sample_column(&self, column: u16) -> Well {
        Well::column_head(self.layout.sample_plate, column)
    }

    /// Row-A well of elution column `column`
    pub fn elution_column(&self, column: u16) -> Well {
        Well::column_head(self.layout.elution_plate, column)
    }

    /// Every reservoir well the recipe draws reagent from
    pub fn reagent_sources(&self) -> impl Iterator<Item = Well> + '_ {
        self.binding
            .sources
            .iter()
            .chain(self.washes.iter().flat_map(|w| w.sources.iter()))
            .copied()
            .chain(core::iter::once(self.elution.source))
    }
}
