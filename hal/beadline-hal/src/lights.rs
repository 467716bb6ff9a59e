//! Deck light output
//!
//! The rail lights are the station's only visual alert channel. Unlike the
//! other outputs they are driven from a secondary thread while the main
//! flow is blocked on the operator, so the trait requires `Sync` and takes
//! `&self`.

/// Rail-light output
///
/// Implementations must tolerate being called concurrently with other
/// robot commands.
pub trait DeckLights: Sync {
    /// Turn the rail lights on or off
    fn set_rail_lights(&self, on: bool);

    /// Check if the rail lights are currently on
    fn rail_lights_on(&self) -> bool;
}
