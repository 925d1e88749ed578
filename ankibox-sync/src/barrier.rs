//! External-action barriers.
//!
//! A barrier hands control to the operator, who runs the external card sync
//! and then confirms. Nothing here checks that the external step happened.
//! There is no timeout; closing the input stream is the only way out besides
//! confirming, and it leaves the mirror in whatever phase it was written in.

use std::io::{self, BufRead, Write};

use crate::error::SyncError;

/// Confirmations required by Add.
pub const ADD_CONFIRMATIONS: usize = 1;
/// Confirmations required by Remove and resume.
pub const REMOVE_CONFIRMATIONS: usize = 4;

const PROMPTS: [&str; REMOVE_CONFIRMATIONS] = [
    "press <ENTER> to continue...",
    "press <ENTER> again to confirm you really are ready...",
    "the card sync plugin has DEFINITELY run and you are ready to proceed? <ENTER>",
    "ok then, press <ENTER> to continue...",
];

/// What the operator is asked to do, and how many times to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierRequest {
    pub message: String,
    pub confirmations: usize,
}

impl BarrierRequest {
    pub fn new(message: impl Into<String>, confirmations: usize) -> Self {
        Self {
            message: message.into(),
            confirmations,
        }
    }
}

/// Blocks until the operator confirms an external step.
pub trait OperatorBarrier {
    fn confirm(&mut self, request: &BarrierRequest) -> Result<(), SyncError>;
}

/// Barrier for read-only runs: refuses every request without touching input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBarrier;

impl OperatorBarrier for NoBarrier {
    fn confirm(&mut self, request: &BarrierRequest) -> Result<(), SyncError> {
        tracing::warn!("barrier requested during a read-only run: {}", request.message);
        Err(SyncError::BarrierAborted)
    }
}

/// Text prompt over any reader/writer pair.
pub struct PromptBarrier<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptBarrier<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptBarrier<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on stdout, read confirmations from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> OperatorBarrier for PromptBarrier<R, W> {
    fn confirm(&mut self, request: &BarrierRequest) -> Result<(), SyncError> {
        let stdout_err = |e| SyncError::Io {
            path: "<stdout>".into(),
            source: e,
        };
        writeln!(self.output, "\n[ACTION REQUIRED] {}", request.message).map_err(stdout_err)?;

        for i in 0..request.confirmations {
            let prompt = PROMPTS[i.min(PROMPTS.len() - 1)];
            write!(self.output, "\n{prompt}").map_err(stdout_err)?;
            self.output.flush().map_err(stdout_err)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(|e| SyncError::Io {
                path: "<stdin>".into(),
                source: e,
            })?;
            if read == 0 {
                tracing::warn!("barrier aborted after {i} of {} confirmations", request.confirmations);
                return Err(SyncError::BarrierAborted);
            }
        }
        writeln!(self.output).map_err(stdout_err)?;
        Ok(())
    }
}
