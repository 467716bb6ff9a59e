//! Operator interaction and gantry traits

use std::time::Duration;

use thiserror::Error;

use super::pipette::HardwareFault;

/// Errors from the operator channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    /// Operator chose to stop the run instead of acknowledging
    #[error("run aborted by operator")]
    Aborted,
    /// The acknowledgment channel went away
    #[error("operator channel closed")]
    Disconnected,
}

/// Operator-facing checkpoints
///
/// `pause` and `delay` are hard synchronous checkpoints: they return only
/// once the operator acknowledged, or the delay elapsed. There is no
/// timeout-based continuation.
pub trait Operator {
    /// Show `message` and block until acknowledged
    fn pause(&mut self, message: &str) -> Result<(), OperatorError>;

    /// Show `message` and block for `duration`
    fn delay(&mut self, duration: Duration, message: &str) -> Result<(), OperatorError>;

    /// Advisory message; never blocks
    fn comment(&mut self, message: &str);
}

/// Robot motion outside the pipetting commands
pub trait Gantry {
    /// Home all axes
    fn home(&mut self) -> Result<(), HardwareFault>;
}
