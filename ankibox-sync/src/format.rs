//! Mirror file text format: reader and writer.
//!
//! ```text
//!
//! TARGET DECK: physics
//!
//! ---
//!
//! filepath: /vault/physics/Entropy.md
//!
//! Entropy #card
//! A measure of the number of microstates.
//! <!--ID: 1685461928651-->
//!
//!
//! ---
//! ```
//!
//! Entries are separated by divider lines (exactly `---`). The fragment before
//! the first divider is the header; whatever follows the last divider is
//! trailing whitespace and is ignored. Inside an entry every field is found by
//! an independent scan of its lines:
//!
//! | field        | rule                                                   |
//! |--------------|--------------------------------------------------------|
//! | location     | first line starting with `filepath:`                   |
//! | title        | first line ending with the card tag, tag removed       |
//! | back         | the line right after the title line                    |
//! | external id  | first line starting with `<!--ID:`, kept verbatim      |
//! | delete       | any line equal to `DELETE`                             |

use std::fmt;
use std::path::{Path, PathBuf};

use ankibox_core::{ExternalId, Record};

use crate::error::{EntryParseError, SyncError};

pub const DIVIDER: &str = "---";
pub const FILEPATH_MARKER: &str = "filepath:";
pub const EXTERNAL_ID_MARKER: &str = "<!--ID:";
pub const DELETE_MARKER: &str = "DELETE";

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Which text shape an entry is rendered in. Chosen by the caller, never
/// inferred from flag combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryForm {
    /// Location, card front, card back. Proposed for creation.
    Normal,
    /// As `Normal`, plus the confirmed external id.
    NormalWithId,
    /// As `NormalWithId`, with a `DELETE` line before the id. Retires a card.
    DeleteMarker,
}

impl EntryForm {
    /// The form that re-renders `record` exactly as it was confirmed.
    pub fn preserving(record: &Record) -> Self {
        if record.is_confirmed() {
            EntryForm::NormalWithId
        } else {
            EntryForm::Normal
        }
    }
}

impl fmt::Display for EntryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryForm::Normal => write!(f, "normal entry"),
            EntryForm::NormalWithId => write!(f, "entry with id"),
            EntryForm::DeleteMarker => write!(f, "delete marker"),
        }
    }
}

/// One entry ready to render. Construction enforces the per-form contract:
/// `NormalWithId` and `DeleteMarker` need an external id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    form: EntryForm,
    title: &'a str,
    location: Option<&'a Path>,
    back: &'a str,
    external_id: Option<&'a ExternalId>,
}

impl<'a> Entry<'a> {
    pub fn new(form: EntryForm, record: &'a Record, back: &'a str) -> Result<Self, SyncError> {
        let external_id = match form {
            EntryForm::Normal => None,
            EntryForm::NormalWithId | EntryForm::DeleteMarker => {
                Some(record.external_id.as_ref().ok_or_else(|| {
                    SyncError::MissingExternalId {
                        title: record.title.clone(),
                        form,
                    }
                })?)
            }
        };
        Ok(Self {
            form,
            title: &record.title,
            location: record.storage_location.as_deref(),
            back,
            external_id,
        })
    }

    pub fn form(&self) -> EntryForm {
        self.form
    }

    /// Entry text, terminated by the divider line.
    pub fn render(&self, card_tag: &str) -> String {
        let location = self
            .location
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let back = self.back.lines().next().unwrap_or("");

        let mut out = format!(
            "\n{FILEPATH_MARKER} {location}\n\n{} {card_tag}\n{back}\n",
            self.title
        );
        if self.form == EntryForm::DeleteMarker {
            out.push_str(DELETE_MARKER);
            out.push('\n');
        }
        if let Some(id) = self.external_id {
            out.push_str(id.as_str());
            out.push('\n');
        }
        out.push_str("\n\n");
        out.push_str(DIVIDER);
        out.push('\n');
        out
    }
}

/// Header block naming the target deck, terminated by the divider line.
pub fn render_header(deck: &str) -> String {
    format!("\nTARGET DECK: {deck}\n\n{DIVIDER}\n")
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Result of parsing one mirror file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMirror {
    pub records: Vec<Record>,
    /// Entries that could not become records. Never silently dropped.
    pub errors: Vec<EntryParseError>,
}

/// Parse mirror text into records, collecting per-entry failures.
pub fn parse_mirror(text: &str, card_tag: &str) -> ParsedMirror {
    let mut parsed = ParsedMirror::default();
    for (i, lines) in split_entries(text).into_iter().enumerate() {
        match parse_entry(&lines, card_tag) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.errors.push(EntryParseError {
                index: i + 1,
                reason,
            }),
        }
    }
    parsed
}

/// Split on divider lines, dropping the header fragment and the trailing one.
fn split_entries(text: &str) -> Vec<Vec<&str>> {
    let mut fragments = Vec::new();
    let mut current = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line == DIVIDER {
            fragments.push(std::mem::take(&mut current));
        } else {
            current.push(line);
        }
    }
    if current.iter().any(|l| !l.trim().is_empty()) {
        tracing::warn!(
            "ignoring {} line(s) of text after the final divider",
            current.len()
        );
    }
    if fragments.is_empty() {
        return fragments;
    }
    fragments.remove(0);
    fragments
}

fn parse_entry(lines: &[&str], card_tag: &str) -> Result<Record, String> {
    let location = lines
        .iter()
        .find_map(|l| l.strip_prefix(FILEPATH_MARKER))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let title_index = lines
        .iter()
        .position(|l| l.ends_with(card_tag))
        .ok_or_else(|| format!("no line ends with card tag '{card_tag}'"))?;
    let title = lines[title_index]
        .strip_suffix(card_tag)
        .unwrap_or(lines[title_index])
        .trim();
    if title.is_empty() {
        return Err("card front is empty".to_string());
    }

    let back = lines.get(title_index + 1).copied().unwrap_or("");

    let external_id = lines
        .iter()
        .find(|l| l.starts_with(EXTERNAL_ID_MARKER))
        .map(|l| ExternalId::new(l.trim()));

    // the back line is card content, so a marker only counts after it
    let delete_marker = lines
        .iter()
        .skip(title_index + 2)
        .any(|l| l.trim() == DELETE_MARKER);
    if delete_marker && external_id.is_none() {
        return Err(format!("'{title}' carries a DELETE marker but no external id"));
    }

    Ok(Record::mirror(
        title,
        location,
        back,
        external_id,
        delete_marker,
    ))
}

// ---------------------------------------------------------------------------
// Source documents
// ---------------------------------------------------------------------------

/// Card back for a source document: its first meaningful line.
///
/// Skips blank lines, code fences, and `related:` link lists.
pub fn card_back_from_document(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```") && !l.starts_with("related:"))
        .unwrap_or("")
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
