//! Step definitions and transitions

use core::fmt;

use super::events::Event;

/// Workflow steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing started yet
    Idle,
    /// Bead binding and first supernatant removal
    Binding,
    /// Wash round `k` (1-based)
    Washing(u8),
    /// Bead air-dry
    Drying,
    /// Elution and eluate transfer
    Eluting,
    /// Run finished
    Done,
}

impl Step {
    /// Check if this is the terminal step
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Done)
    }

    /// Process an event and return the next step
    ///
    /// `wash_rounds` is the number of wash rounds in the recipe. Returns
    /// `None` for any event that would not move the run forward.
    pub fn transition(self, event: Event, wash_rounds: u8) -> Option<Self> {
        use Event::*;
        use Step::*;

        let after_binding = if wash_rounds == 0 { Drying } else { Washing(1) };

        match (self, event) {
            (Idle, Start) => Some(Binding),
            (Binding, BindComplete) => Some(after_binding),
            (Washing(k), WashComplete(done)) if done == k && k < wash_rounds => {
                Some(Washing(k + 1))
            }
            (Washing(k), WashComplete(done)) if done == k && k == wash_rounds => Some(Drying),
            (Drying, DryComplete) => Some(Eluting),
            (Eluting, EluteComplete) => Some(Done),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Idle => write!(f, "idle"),
            Step::Binding => write!(f, "binding"),
            Step::Washing(k) => write!(f, "washing({})", k),
            Step::Drying => write!(f, "drying"),
            Step::Eluting => write!(f, "eluting"),
            Step::Done => write!(f, "done"),
        }
    }
}
