//! Domain types for ankibox.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Configuration types are serializable/deserializable via serde + serde_yaml.
//! [`Record`] is runtime-only and never persisted outside the mirror format.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a box (one source ↔ mirror pairing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxName(pub String);

impl fmt::Display for BoxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BoxName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BoxName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identity token written into the mirror by the external card system.
///
/// Stored as the full trimmed marker line, e.g. `<!--ID: 1685461928651-->`.
/// ankibox only ever reads these; it never invents one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    /// Wrap a token exactly as it appeared in the mirror file.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What backs a box's source snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A directory of markdown documents, one record per file.
    #[default]
    Folder,
    /// A single queue file, one record per table row.
    Queue,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Folder => write!(f, "folder"),
            SourceKind::Queue => write!(f, "queue"),
        }
    }
}

/// Which snapshot produced a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    SourceDocument,
    MirrorEntry,
}

/// Delete-workflow marking. Only meaningful inside a Remove; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionMark {
    #[default]
    Unknown,
    Retained,
    Removed,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The unit of reconciliation.
///
/// `title` is the identity key; within one snapshot titles are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    /// Resolved document path, `None` when identity resolution failed.
    pub storage_location: Option<PathBuf>,
    pub provenance: Provenance,
    /// Only ever `Some` for mirror entries the external system has confirmed.
    pub external_id: Option<ExternalId>,
    /// Card back as stored in the mirror. Source records derive theirs from
    /// the document at render time, so this is `None` for them.
    pub back: Option<String>,
    /// The mirror entry carries a literal `DELETE` line.
    pub delete_marker: bool,
    pub pending_deletion: DeletionMark,
}

impl Record {
    /// A record read from a source document collection.
    pub fn source(title: impl Into<String>, storage_location: Option<PathBuf>) -> Self {
        Self {
            title: title.into(),
            storage_location,
            provenance: Provenance::SourceDocument,
            external_id: None,
            back: None,
            delete_marker: false,
            pending_deletion: DeletionMark::Unknown,
        }
    }

    /// A record parsed from one mirror entry.
    pub fn mirror(
        title: impl Into<String>,
        storage_location: Option<PathBuf>,
        back: impl Into<String>,
        external_id: Option<ExternalId>,
        delete_marker: bool,
    ) -> Self {
        Self {
            title: title.into(),
            storage_location,
            provenance: Provenance::MirrorEntry,
            external_id,
            back: Some(back.into()),
            delete_marker,
            pending_deletion: DeletionMark::Unknown,
        }
    }

    /// Copy of this record carrying `mark`.
    pub fn marked(&self, mark: DeletionMark) -> Self {
        Self {
            pending_deletion: mark,
            ..self.clone()
        }
    }

    /// `true` once the external card system has written an id back.
    pub fn is_confirmed(&self) -> bool {
        self.external_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One configured box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxConfig {
    pub name: BoxName,
    #[serde(default)]
    pub kind: SourceKind,
    /// Folder boxes: the document directory. Queue boxes: the queue file.
    pub path: PathBuf,
    /// Overrides [`Config::card_tag`] for this box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_tag: Option<String>,
}

/// Root of the ankibox YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Marker that ends every card-front line in a mirror file.
    pub card_tag: String,
    /// Root of the document tree indexed for queue-title resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
    /// Directory holding the mirror files of queue boxes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_root: Option<PathBuf>,
    #[serde(default)]
    pub boxes: Vec<BoxConfig>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
