//! Scripted operator
//!
//! Answers pauses from a script instead of a person, for dry runs and
//! tests. Delays are recorded and, optionally, actually waited out.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::info;

use beadline_core::traits::{Operator, OperatorError};

/// Scripted answer to one pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReply {
    /// Resume the run
    Acknowledge,
    /// Stop the run
    Abort,
}

/// Operator driven by a reply script
///
/// Pauses beyond the end of the script are acknowledged.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOperator {
    replies: VecDeque<PauseReply>,
    real_time: bool,
    pauses: Vec<String>,
    delays: Vec<Duration>,
    comments: Vec<String>,
}

impl ScriptedOperator {
    /// Operator that acknowledges everything and never sleeps
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next pauses with `replies`, in order
    pub fn with_replies(replies: impl IntoIterator<Item = PauseReply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Actually wait out delays
    pub fn real_time(mut self, enabled: bool) -> Self {
        self.real_time = enabled;
        self
    }

    /// Pause messages shown so far
    pub fn pauses(&self) -> &[String] {
        &self.pauses
    }

    /// Delays requested so far
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total delay requested
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }

    /// Advisory messages shown so far
    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

impl Operator for ScriptedOperator {
    fn pause(&mut self, message: &str) -> Result<(), OperatorError> {
        info!("PAUSE: {}", message);
        self.pauses.push(message.to_owned());
        match self.replies.pop_front().unwrap_or(PauseReply::Acknowledge) {
            PauseReply::Acknowledge => Ok(()),
            PauseReply::Abort => Err(OperatorError::Aborted),
        }
    }

    fn delay(&mut self, duration: Duration, message: &str) -> Result<(), OperatorError> {
        info!("DELAY {:?}: {}", duration, message);
        self.delays.push(duration);
        if self.real_time {
            std::thread::sleep(duration);
        }
        Ok(())
    }

    fn comment(&mut self, message: &str) {
        info!("{}", message);
        self.comments.push(message.to_owned());
    }
}
