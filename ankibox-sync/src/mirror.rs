//! Mirror store: owns the on-disk mirror file of one box.
//!
//! A missing file is an empty mirror, not an error. The file is created on
//! the first write, together with its parent directory.
//!
//! ## `write_all` protocol
//!
//! 1. Render header + entries (entries already end with the divider).
//! 2. Write to `<path>.ankibox.tmp`.
//! 3. Rename over the final path.
//!
//! Concurrent runs against the same box are not supported; nothing here
//! locks the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::format::{parse_mirror, render_header, ParsedMirror};

const TMP_SUFFIX: &str = ".ankibox.tmp";

/// Read/write access to one mirror file.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    path: PathBuf,
    deck: String,
    card_tag: String,
    existed: bool,
}

impl MirrorStore {
    /// Bind to `path`. Notes whether the file is there but creates nothing.
    pub fn open(
        path: impl Into<PathBuf>,
        deck: impl Into<String>,
        card_tag: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let existed = path.is_file();
        if !existed {
            tracing::debug!("mirror {} not found, box starts empty", path.display());
        }
        Self {
            path,
            deck: deck.into(),
            card_tag: card_tag.into(),
            existed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn card_tag(&self) -> &str {
        &self.card_tag
    }

    /// Whether the mirror file was present when opened or has since been written.
    pub fn existed(&self) -> bool {
        self.existed
    }

    /// Current file text, empty when the file does not exist.
    pub fn read_content(&self) -> Result<String, SyncError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(io_err(&self.path, e)),
        }
    }

    /// Parse the current file. Fresh on every call.
    pub fn snapshot(&self) -> Result<ParsedMirror, SyncError> {
        let text = self.read_content()?;
        let parsed = parse_mirror(&text, &self.card_tag);
        tracing::debug!(
            "{}: {} entries parsed, {} unusable",
            self.path.display(),
            parsed.records.len(),
            parsed.errors.len()
        );
        Ok(parsed)
    }

    /// Full file text for `entries`, header included.
    pub fn render_content(&self, entries: &[String]) -> String {
        let mut out = render_header(&self.deck);
        for entry in entries {
            out.push_str(entry);
        }
        out
    }

    /// Replace the whole file with header + `entries`, in order.
    pub fn write_all(&mut self, entries: &[String]) -> Result<(), SyncError> {
        let content = self.render_content(entries);
        atomic_write(&self.path, &content)?;
        self.existed = true;
        tracing::info!("wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}
