//! End-to-end sessions on the simulated deck

use beadline_core::sequencer::SequenceError;
use beadline_core::state::Step;
use beadline_core::traits::{Deck, DeckLights, HardwareFault, Pipette, TemperatureModule};
use beadline_core::waste::EMPTY_WASTE_MESSAGE;
use beadline_drivers::{
    FileStore, MemoryStore, ScriptedOperator, SimGantry, SimLights, SimMagnet, SimPipette,
    SimTemperature,
};
use beadline_hal::{KeyValueStore, StorageKey};
use beadline_station::{Station, StationConfig, StationError};

struct Bench {
    pipette: SimPipette,
    magnet: SimMagnet,
    temperature: SimTemperature,
    operator: ScriptedOperator,
    gantry: SimGantry,
    lights: SimLights,
}

impl Bench {
    fn new() -> Self {
        Self {
            pipette: SimPipette::multi_300(),
            magnet: SimMagnet::new(),
            temperature: SimTemperature::new(),
            operator: ScriptedOperator::new(),
            gantry: SimGantry::new(),
            lights: SimLights::new(),
        }
    }

    fn deck(&mut self, simulating: bool) -> Deck<'_> {
        Deck {
            pipette: &mut self.pipette,
            magnet: &mut self.magnet,
            temperature: Some(&mut self.temperature),
            operator: &mut self.operator,
            gantry: &mut self.gantry,
            lights: &self.lights,
            simulating,
        }
    }
}

fn tracked_config() -> StationConfig {
    let mut config = StationConfig::default();
    config.station.track_tips = true;
    config.station.simulate = false;
    config.waste.blink_interval_ms = 1;
    config
}

#[test]
fn test_default_session_completes() {
    let station = Station::new(StationConfig::default()).unwrap();
    let mut bench = Bench::new();
    let mut store = MemoryStore::new("station_b");

    let report = station.run(&mut bench.deck(true), &mut store).unwrap();

    assert_eq!(report.step, Step::Done);
    assert_eq!(report.tips, vec![("tips300".to_string(), 10)]);
    assert_eq!(report.waste_count, 80);
    assert!(!report.persisted);
    assert!(!bench.pipette.has_tip());
    assert_eq!(bench.pipette.pickups(), 10);
    assert_eq!(bench.temperature.target(), Some(4.0));
    // Binding, three washes, drying, two elution incubations
    assert_eq!(bench.operator.delays().len(), 7);
}

#[test]
fn test_state_carries_across_sessions() {
    let data = tempfile::tempdir().unwrap();
    let station = Station::new(tracked_config()).unwrap();

    let mut first = Bench::new();
    let mut store = FileStore::new(data.path(), "station_b");
    let report = station.run(&mut first.deck(false), &mut store).unwrap();
    assert!(report.persisted);

    let tip_log = std::fs::read_to_string(data.path().join("station_b/tip_log.json")).unwrap();
    assert_eq!(tip_log, r#"{"tips300":10}"#);

    let mut second = Bench::new();
    let mut reopened = FileStore::new(data.path(), "station_b");
    let report = station.run(&mut second.deck(false), &mut reopened).unwrap();
    assert_eq!(report.tips, vec![("tips300".to_string(), 20)]);
    assert_eq!(report.waste_count, 160);
}

#[test]
fn test_dry_run_skips_persistence() {
    let data = tempfile::tempdir().unwrap();
    let station = Station::new(tracked_config()).unwrap();
    let mut store = FileStore::new(data.path(), "station_b");
    store.save(StorageKey::TipLog, br#"{"tips300":50}"#).unwrap();

    let mut bench = Bench::new();
    let report = station.run(&mut bench.deck(true), &mut store).unwrap();

    assert!(!report.persisted);
    // Started from zero despite the stored count, and left it untouched
    assert_eq!(report.tips, vec![("tips300".to_string(), 10)]);
    assert!(!store.exists(StorageKey::WasteLog));
    assert_eq!(
        store.load(StorageKey::TipLog).unwrap().as_deref(),
        Some(&br#"{"tips300":50}"#[..])
    );
}

#[test]
fn test_rack_replacement_mid_run() {
    let mut config = tracked_config();
    config.tip_pools[0].racks.clear();
    config.tip_pools[0].racks.push(3).unwrap();
    let station = Station::new(config).unwrap();

    let mut store = MemoryStore::new("station_b");
    store.insert(StorageKey::TipLog, r#"{"tips300":10}"#);

    let mut bench = Bench::new();
    let report = station.run(&mut bench.deck(false), &mut store).unwrap();

    assert_eq!(
        bench.operator.pauses(),
        ["Replace 300µl tipracks before resuming."]
    );
    // Two tips from the old rack, eight from the new one
    assert_eq!(report.tips, vec![("tips300".to_string(), 8)]);
}

#[test]
fn test_full_waste_alert() {
    let mut config = tracked_config();
    config.waste.threshold = 80;
    let station = Station::new(config).unwrap();
    let mut store = MemoryStore::new("station_b");

    let mut bench = Bench::new();
    let report = station.run(&mut bench.deck(false), &mut store).unwrap();

    assert_eq!(report.waste_cycles, 1);
    assert_eq!(report.waste_count, 0);
    assert_eq!(bench.operator.pauses(), [EMPTY_WASTE_MESSAGE]);
    assert_eq!(bench.gantry.homes(), 1);
    assert!(!bench.lights.rail_lights_on());
}

#[test]
fn test_fault_keeps_previous_log() {
    let station = Station::new(tracked_config()).unwrap();
    let mut store = MemoryStore::new("station_b");
    store.insert(StorageKey::TipLog, r#"{"tips300":4}"#);

    let mut bench = Bench::new();
    bench.pipette.inject_fault_after(5);
    let err = station.run(&mut bench.deck(false), &mut store).unwrap_err();

    assert!(matches!(
        err,
        StationError::Sequence(SequenceError::Hardware(HardwareFault::Driver(_)))
    ));
    assert!(!bench.pipette.has_tip());
    assert_eq!(store.get(StorageKey::TipLog), Some(&br#"{"tips300":4}"#[..]));
    assert!(store.get(StorageKey::WasteLog).is_none());
}

#[test]
fn test_oversized_waste_log_is_clamped() {
    let station = Station::new(tracked_config()).unwrap();
    let mut store = MemoryStore::new("station_b");
    store.insert(StorageKey::WasteLog, r#"{"count":4294967295,"toggle":true}"#);

    let mut bench = Bench::new();
    let report = station.run(&mut bench.deck(false), &mut store).unwrap();

    // First drop empties the bin, nine more follow
    assert_eq!(report.waste_cycles, 1);
    assert_eq!(report.waste_count, 72);
    assert_eq!(bench.operator.pauses(), [EMPTY_WASTE_MESSAGE]);
}

#[test]
fn test_simulated_deck_never_touches_stored_state() {
    let data = tempfile::tempdir().unwrap();
    let station = Station::new(tracked_config()).unwrap();
    let mut store = FileStore::new(data.path(), "station_b");

    let mut bench = Bench::new();
    let simulating = station.runs_dry(false);
    let report = station.run(&mut bench.deck(simulating), &mut store).unwrap();

    assert!(!report.persisted);
    assert!(!store.dir().exists());
}
