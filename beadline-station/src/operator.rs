//! Terminal operator
//!
//! Shows checkpoints on a text stream and waits for the operator to answer
//! on another. Pressing enter resumes; typing `abort` stops the run.

use std::io::{BufRead, Write};
use std::time::Duration;

use tracing::{info, warn};

use beadline_core::traits::{Operator, OperatorError};

/// Reply that stops the run at a pause
pub const ABORT_REPLY: &str = "abort";

/// Operator on a line-oriented terminal
#[derive(Debug)]
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
    real_time: bool,
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    /// Create an operator reading replies from `input`
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            real_time: true,
        }
    }

    /// Skip sleeping through delays
    pub fn without_delays(mut self) -> Self {
        self.real_time = false;
        self
    }

    /// Recover the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, line: &str) -> Result<(), OperatorError> {
        writeln!(self.output, "{}", line)
            .and_then(|()| self.output.flush())
            .map_err(|_| OperatorError::Disconnected)
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn pause(&mut self, message: &str) -> Result<(), OperatorError> {
        info!("Paused: {}", message);
        self.show(&format!("{} [enter to resume, `{}` to stop]", message, ABORT_REPLY))?;

        let mut reply = String::new();
        let read = self
            .input
            .read_line(&mut reply)
            .map_err(|_| OperatorError::Disconnected)?;
        if read == 0 {
            warn!("Operator input closed during pause");
            return Err(OperatorError::Disconnected);
        }
        if reply.trim().eq_ignore_ascii_case(ABORT_REPLY) {
            return Err(OperatorError::Aborted);
        }
        info!("Resumed");
        Ok(())
    }

    fn delay(&mut self, duration: Duration, message: &str) -> Result<(), OperatorError> {
        info!("{} ({:?})", message, duration);
        self.show(message)?;
        if self.real_time {
            std::thread::sleep(duration);
        }
        Ok(())
    }

    fn comment(&mut self, message: &str) {
        info!("{}", message);
        let _ = self.show(message);
    }
}
