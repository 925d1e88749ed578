//! Source snapshot providers.
//!
//! A provider turns an external item collection into an ordered list of
//! [`Record`]s with `SourceDocument` provenance and no external id. Snapshots
//! are taken fresh on every call and never cached.

use std::path::{Path, PathBuf};

use ankibox_core::{BoxConfig, Record, SourceKind};

use crate::error::{io_err, SyncError};
use crate::format::card_back_from_document;
use crate::identity::{DirectResolver, Resolve, StorageIndex, RECORD_SUFFIX};

/// Leading lines of a queue file that carry no data: three lines of front
/// matter followed by the table header and its separator row.
pub const QUEUE_HEADER_LINES: usize = 5;
/// Position of the title cell when a queue row is split on `|`. Index 0 is
/// the empty text before the leading pipe.
pub const QUEUE_TITLE_FIELD: usize = 2;
const QUEUE_DELIMITER: char = '|';

/// Produces the current state of a source collection.
pub trait SnapshotProvider {
    fn snapshot(&self) -> Result<Vec<Record>, SyncError>;
}

// ---------------------------------------------------------------------------
// Directory provider
// ---------------------------------------------------------------------------

/// One record per `*.md` file directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    resolver: DirectResolver,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            resolver: DirectResolver::new(dir.clone()),
            dir,
        }
    }
}

impl SnapshotProvider for DirectorySource {
    /// Records come out in directory listing order.
    fn snapshot(&self) -> Result<Vec<Record>, SyncError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(title) = name.strip_suffix(RECORD_SUFFIX) else {
                continue;
            };
            records.push(Record::source(title, self.resolver.resolve(title)));
        }
        tracing::debug!("{} items found in {}", records.len(), self.dir.display());
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Queue-file provider
// ---------------------------------------------------------------------------

/// One record per table row of a queue file; titles resolved via the index.
#[derive(Debug, Clone)]
pub struct QueueSource<'a> {
    path: PathBuf,
    index: &'a StorageIndex,
}

impl<'a> QueueSource<'a> {
    pub fn new(path: impl Into<PathBuf>, index: &'a StorageIndex) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }
}

impl SnapshotProvider for QueueSource<'_> {
    /// Fails on the first malformed row; a partial queue snapshot would make
    /// Remove retire cards that are still queued.
    fn snapshot(&self) -> Result<Vec<Record>, SyncError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        let mut records = Vec::new();
        for (i, line) in text.lines().enumerate().skip(QUEUE_HEADER_LINES) {
            if line.trim().is_empty() {
                continue;
            }
            let title = queue_row_title(line).ok_or_else(|| SyncError::QueueParse {
                path: self.path.clone(),
                line: i + 1,
                content: line.to_string(),
            })?;
            let location = self.index.resolve(&title);
            records.push(Record::source(title, location));
        }
        tracing::debug!("{} items found in {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// `| 3 | [[Title]] | 30 | … |` → `Title`.
fn queue_row_title(line: &str) -> Option<String> {
    let cell = line.split(QUEUE_DELIMITER).nth(QUEUE_TITLE_FIELD)?;
    let title = cell.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace());
    if title.is_empty() {
        return None;
    }
    Some(title.to_string())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the provider a box is configured for.
///
/// Queue boxes borrow the process-wide `index`; `None` there is a caller bug
/// surfaced as a config error.
pub fn provider_for<'a>(
    b: &BoxConfig,
    index: Option<&'a StorageIndex>,
) -> Result<Box<dyn SnapshotProvider + 'a>, SyncError> {
    match b.kind {
        SourceKind::Folder => Ok(Box::new(DirectorySource::new(b.path.clone()))),
        SourceKind::Queue => {
            let index = index.ok_or_else(|| {
                SyncError::Config(ankibox_core::ConfigError::Invalid {
                    reason: format!("queue box '{}' needs a storage index", b.name),
                })
            })?;
            Ok(Box::new(QueueSource::new(b.path.clone(), index)))
        }
    }
}

/// Card back for a source record, read from its document.
pub fn read_card_back(record: &Record) -> Result<String, SyncError> {
    let path = record
        .storage_location
        .as_deref()
        .ok_or_else(|| SyncError::RecordUnlocatable {
            title: record.title.clone(),
        })?;
    let text = read_document(path, &record.title)?;
    Ok(card_back_from_document(&text))
}

fn read_document(path: &Path, title: &str) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SyncError::RecordUnlocatable {
            title: title.to_string(),
        }),
        Err(e) => Err(io_err(path, e)),
    }
}
