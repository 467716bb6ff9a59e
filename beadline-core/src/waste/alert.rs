//! Empty-waste alert
//!
//! While the operator empties the bin, a helper thread blinks the rail
//! lights. The main flow waits for acknowledgment, stops the blinker,
//! homes the gantry and joins the helper before any further motion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::WasteError;
use crate::traits::{Deck, DeckLights};

/// Pause message shown while the bin is full
pub const EMPTY_WASTE_MESSAGE: &str = "Please empty tips from waste before resuming.";

/// Run one empty-waste cycle
///
/// The blinker is skipped when simulating; the pause and homing still
/// happen. The helper is always joined and the lights always end off,
/// even when the pause or the homing move fails. Those failures are
/// returned after the join.
pub fn run_empty_waste_protocol(
    deck: &mut Deck<'_>,
    blink_interval: Duration,
) -> Result<(), WasteError> {
    let lights = deck.lights;
    let operator = &mut *deck.operator;
    let gantry = &mut *deck.gantry;
    let blinking = AtomicBool::new(!deck.simulating);
    let flag = &blinking;

    let result = thread::scope(|s| -> Result<(), WasteError> {
        if flag.load(Ordering::Acquire) {
            s.spawn(move || blink(lights, flag, blink_interval));
        }

        let acknowledged = operator.pause(EMPTY_WASTE_MESSAGE);
        flag.store(false, Ordering::Release);
        acknowledged?;

        info!("Waste emptied, homing");
        gantry.home()?;
        Ok(())
    });

    lights.set_rail_lights(false);
    result
}

fn blink(lights: &dyn DeckLights, blinking: &AtomicBool, interval: Duration) {
    debug!("Blinking rail lights every {:?}", interval);
    while blinking.load(Ordering::Acquire) {
        lights.set_rail_lights(true);
        thread::sleep(interval);
        lights.set_rail_lights(false);
        if !blinking.load(Ordering::Acquire) {
            break;
        }
        thread::sleep(interval);
    }
}
