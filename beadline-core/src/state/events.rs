//! Events that trigger step transitions

/// Completion events emitted by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Run started from idle
    Start,
    /// Binding finished for every column
    BindComplete,
    /// Wash round `k` (1-based) finished for every column
    WashComplete(u8),
    /// Air-dry delay elapsed
    DryComplete,
    /// Eluate moved to the destination plate
    EluteComplete,
}
