//! # ankibox-sync
//!
//! Source/mirror reconciliation and the two-phase delete protocol.
//!
//! Build a [`BoxController`] per box (or call [`pipeline::run`] for all of
//! them) and drive `summarize`, `add`, `remove` or `resume_remove`. Every
//! operation re-reads the source and the mirror file; nothing is cached.

pub mod barrier;
pub mod controller;
pub mod diff;
pub mod error;
pub mod format;
pub mod identity;
pub mod mirror;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod state;

pub use barrier::{BarrierRequest, NoBarrier, OperatorBarrier, PromptBarrier};
pub use controller::{AddOutcome, BoxController, BoxSummary, RemoveOutcome};
pub use error::SyncError;
pub use pipeline::{run, Action, BoxReport, BoxRun};
pub use state::BoxState;
