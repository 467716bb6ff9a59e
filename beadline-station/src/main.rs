//! Beadline station binary
//!
//! Runs the purification workflow against the simulated deck. The
//! configuration file comes from the first argument or `BEADLINE_CONFIG`;
//! without either the built-in defaults are used. Only simulated devices
//! are available, so every session is a dry run and stored run state is
//! left untouched.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use beadline_core::traits::{Deck, Operator};
use beadline_drivers::{
    FileStore, ScriptedOperator, SimGantry, SimLights, SimMagnet, SimPipette, SimTemperature,
};
use beadline_station::logging::{init_logging, DEFAULT_DIRECTIVE};
use beadline_station::operator::TerminalOperator;
use beadline_station::{load_config, Station, StationConfig, StationError};

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "BEADLINE_CONFIG";

/// No driver in this binary talks to a physical robot
const HARDWARE_ATTACHED: bool = false;

fn main() -> ExitCode {
    init_logging(DEFAULT_DIRECTIVE);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), StationError> {
    let path = env::args_os()
        .nth(1)
        .or_else(|| env::var_os(CONFIG_ENV))
        .map(PathBuf::from);
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            info!("No configuration given, using defaults");
            StationConfig::default()
        }
    };

    let station = Station::new(config)?;
    let settings = station.config();
    let simulating = station.runs_dry(HARDWARE_ATTACHED);

    let mut pipette = SimPipette::new(settings.pipette.channels, settings.pipette.max_volume_ul);
    let mut magnet = SimMagnet::new();
    let mut temperature = SimTemperature::new();
    let mut gantry = SimGantry::new();
    let lights = SimLights::new();
    let mut store = FileStore::new(&settings.station.data_dir, &settings.station.namespace);

    // A live configuration still gets interactive checkpoints
    let mut operator: Box<dyn Operator> = if settings.station.simulate {
        Box::new(ScriptedOperator::new())
    } else {
        Box::new(TerminalOperator::new(io::stdin().lock(), io::stdout()))
    };

    let mut deck = Deck {
        pipette: &mut pipette,
        magnet: &mut magnet,
        temperature: Some(&mut temperature),
        operator: operator.as_mut(),
        gantry: &mut gantry,
        lights: &lights,
        simulating,
    };

    let report = station.run(&mut deck, &mut store)?;
    info!(
        "Finished in step {}: {} tips in waste, {} waste cycles",
        report.step, report.waste_count, report.waste_cycles
    );
    for (role, count) in &report.tips {
        info!("  {}: {} tips used since last rack change", role, count);
    }
    Ok(())
}
