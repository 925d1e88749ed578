//! Error types for ankibox-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use ankibox_core::ConfigError;

use crate::format::EntryForm;

/// One mirror entry that could not be turned into a usable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryParseError {
    /// 1-based position of the entry after the header block.
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for EntryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry #{}: {}", self.index, self.reason)
    }
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Identity resolution found no document for a title whose content is needed.
    #[error("cannot locate a document for '{title}'")]
    RecordUnlocatable { title: String },

    /// A queue-file data line lacks the expected delimiter structure.
    #[error("malformed queue line {line} in {path}: {content:?}")]
    QueueParse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// The mirror file holds entries that cannot be parsed into records.
    #[error(
        "{path} has {} unusable entries: {}",
        .entries.len(),
        join_entries(.entries)
    )]
    MalformedMirror {
        path: PathBuf,
        entries: Vec<EntryParseError>,
    },

    /// Remove attempted while mirror entries still wait for an external id.
    #[error(
        "found {} notes in '{box_name}' without an ID; finish the add operation first by running the card sync plugin",
        .pending.len()
    )]
    UnfinishedAdd {
        box_name: String,
        pending: Vec<String>,
    },

    /// The mirror still carries `DELETE` markers from an interrupted remove.
    #[error(
        "found {} DELETE markers in '{box_name}'; run `ankibox remove --resume` to finish the interrupted remove",
        .marked.len()
    )]
    DeleteInProgress {
        box_name: String,
        marked: Vec<String>,
    },

    /// An entry form that needs an external id was requested for a record without one.
    #[error("cannot render '{title}' as {form}: record has no external id")]
    MissingExternalId { title: String, form: EntryForm },

    /// The storage index could not be built, so queue rows cannot be resolved.
    #[error("storage index under {root} is unavailable: {reason}")]
    IndexUnavailable { root: PathBuf, reason: String },

    /// The operator barrier ended without confirmation (EOF on input).
    #[error("operator input closed before confirmation")]
    BarrierAborted,

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error from configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

fn join_entries(entries: &[EntryParseError]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
