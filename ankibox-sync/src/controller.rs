//! Per-box sync controller.
//!
//! One controller drives one (source, mirror) pair. It keeps no state between
//! runs: every operation re-reads both sides and infers the phase from the
//! mirror content (ids present or missing, `DELETE` markers present or not).
//!
//! ## Remove protocol
//!
//! 1. Mark mirror records still present in the source as retained, the rest
//!    as removed.
//! 2. Write the intermediary file: retained entries unchanged, removed ones
//!    as delete markers.
//! 3. Barrier: the operator runs the card sync plugin, which deletes the
//!    marked cards, then confirms four times.
//! 4. Write the final file with the retained entries only.
//!
//! An interruption between 2 and 4 leaves the markers in place. The box then
//! reads as [`BoxState::DeleteInProgress`] and only
//! [`BoxController::resume_remove`] will touch it.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use ankibox_core::{BoxConfig, BoxName, Config, DeletionMark, Record};

use crate::barrier::{BarrierRequest, OperatorBarrier, ADD_CONFIRMATIONS, REMOVE_CONFIRMATIONS};
use crate::diff::{mirror_diff, MirrorDiff};
use crate::error::SyncError;
use crate::format::{Entry, EntryForm, ParsedMirror};
use crate::identity::StorageIndex;
use crate::mirror::MirrorStore;
use crate::reconcile::{reconcile, ReconciliationResult};
use crate::source::{provider_for, read_card_back, SnapshotProvider};
use crate::state::{classify, delete_marked_titles, pending_titles, BoxState};

/// Back line written into every delete marker.
pub const REMOVAL_PLACEHOLDER: &str = "note is being removed from ankinote";

const ADD_INSTRUCTION: &str = "add operation written, go run the Obsidian_to_Anki plugin!";
const DELETE_INSTRUCTION: &str =
    "run the Obsidian_to_Anki plugin to perform DELETEs before continuing!";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Read-only report on one box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxSummary {
    pub name: String,
    pub mirror: String,
    pub new_in_source: Vec<String>,
    pub stale_in_mirror: Vec<String>,
    pub source_total: usize,
    pub mirror_total: usize,
    pub mirror_with_id: usize,
    pub malformed_entries: Vec<String>,
    pub state: BoxState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Nothing new in the source; no write, no barrier.
    NothingToAdd,
    /// Mirror rewritten with these titles proposed for creation.
    Added { titles: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Nothing stale (or, on resume, no markers); no write, no barrier.
    NothingToRemove,
    /// These titles were retired and dropped from the mirror.
    Removed { titles: Vec<String> },
}

/// Both snapshots and their classification, taken together.
struct Observation {
    source: Vec<Record>,
    mirror: ParsedMirror,
    result: ReconciliationResult,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct BoxController<'a> {
    name: BoxName,
    source: Box<dyn SnapshotProvider + 'a>,
    mirror: MirrorStore,
}

impl<'a> BoxController<'a> {
    pub fn new(name: BoxName, source: Box<dyn SnapshotProvider + 'a>, mirror: MirrorStore) -> Self {
        Self {
            name,
            source,
            mirror,
        }
    }

    /// Wire up the provider and mirror store `b` is configured for.
    pub fn for_box(
        config: &Config,
        b: &BoxConfig,
        index: Option<&'a StorageIndex>,
    ) -> Result<Self, SyncError> {
        let mirror_path = config.mirror_path_for(b)?;
        let mirror = MirrorStore::open(mirror_path, b.name.0.clone(), config.card_tag_for(b));
        Ok(Self::new(b.name.clone(), provider_for(b, index)?, mirror))
    }

    pub fn name(&self) -> &BoxName {
        &self.name
    }

    pub fn mirror_path(&self) -> &Path {
        self.mirror.path()
    }

    fn observe(&self) -> Result<Observation, SyncError> {
        let source = self.source.snapshot()?;
        let mirror = self.mirror.snapshot()?;
        let result = reconcile(&source, &mirror.records);
        Ok(Observation {
            source,
            mirror,
            result,
        })
    }

    // -----------------------------------------------------------------------
    // Summarize
    // -----------------------------------------------------------------------

    /// Counts and titles. Never writes.
    pub fn summarize(&self) -> Result<BoxSummary, SyncError> {
        let obs = self.observe()?;
        let state = classify(&obs.mirror, &obs.result);
        Ok(BoxSummary {
            name: self.name.0.clone(),
            mirror: self.mirror.path().display().to_string(),
            new_in_source: obs.result.new_titles(),
            stale_in_mirror: obs.result.stale_titles(),
            source_total: obs.result.source_total,
            mirror_total: obs.result.mirror_total,
            mirror_with_id: obs.result.mirror_with_id(),
            malformed_entries: obs.mirror.errors.iter().map(ToString::to_string).collect(),
            state,
        })
    }

    pub fn state(&self) -> Result<BoxState, SyncError> {
        let obs = self.observe()?;
        Ok(classify(&obs.mirror, &obs.result))
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    /// Propose every new source record for creation, then wait for the
    /// operator to run the card sync.
    pub fn add(&mut self, barrier: &mut dyn OperatorBarrier) -> Result<AddOutcome, SyncError> {
        let obs = self.observe()?;
        let Some(entries) = self.add_entries(&obs)? else {
            tracing::info!("{}: no new notes to add", self.name);
            return Ok(AddOutcome::NothingToAdd);
        };

        self.mirror.write_all(&entries)?;
        let titles = obs.result.new_titles();
        tracing::info!("{}: proposed {} new notes", self.name, titles.len());

        barrier.confirm(&BarrierRequest::new(
            format!("{}: {ADD_INSTRUCTION}", self.name),
            ADD_CONFIRMATIONS,
        ))?;
        Ok(AddOutcome::Added { titles })
    }

    /// Diff of what [`add`](Self::add) would write. Writes nothing.
    pub fn preview_add(&self) -> Result<MirrorDiff, SyncError> {
        let obs = self.observe()?;
        let entries = self.add_entries(&obs)?;
        self.preview(entries)
    }

    /// New entries first, then every existing entry as it was. `None` when
    /// there is nothing to add.
    fn add_entries(&self, obs: &Observation) -> Result<Option<Vec<String>>, SyncError> {
        self.guard_rewritable(&obs.mirror)?;
        if obs.result.new_in_source.is_empty() {
            return Ok(None);
        }

        let tag = self.mirror.card_tag();
        let mut entries = Vec::with_capacity(obs.result.new_in_source.len() + obs.mirror.records.len());
        for record in &obs.result.new_in_source {
            let back = read_card_back(record)?;
            entries.push(Entry::new(EntryForm::Normal, record, &back)?.render(tag));
        }
        for record in &obs.mirror.records {
            entries.push(render_unchanged(record, tag)?);
        }
        Ok(Some(entries))
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    /// Retire every stale mirror entry through the two-phase protocol.
    pub fn remove(&mut self, barrier: &mut dyn OperatorBarrier) -> Result<RemoveOutcome, SyncError> {
        let obs = self.observe()?;
        let Some(marked) = self.mark_for_removal(&obs)? else {
            tracing::info!("{}: no old notes to delete", self.name);
            return Ok(RemoveOutcome::NothingToRemove);
        };

        let tag = self.mirror.card_tag();
        let intermediary = marked
            .iter()
            .map(|r| match r.pending_deletion {
                DeletionMark::Removed => render_delete_marker(r, tag),
                _ => render_unchanged(r, tag),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let retained = retained_entries(&marked, tag)?;
        let titles = removed_titles(&marked);

        self.mirror.write_all(&intermediary)?;
        tracing::info!("{}: marked {} notes for deletion", self.name, titles.len());

        barrier.confirm(&BarrierRequest::new(
            format!("{}: {DELETE_INSTRUCTION}", self.name),
            REMOVE_CONFIRMATIONS,
        ))?;

        self.mirror.write_all(&retained)?;
        tracing::info!("{}: removed {} old notes", self.name, titles.len());
        Ok(RemoveOutcome::Removed { titles })
    }

    /// Diff between the current mirror and what it holds once
    /// [`remove`](Self::remove) has finished. Writes nothing.
    pub fn preview_remove(&self) -> Result<MirrorDiff, SyncError> {
        let obs = self.observe()?;
        let entries = match self.mark_for_removal(&obs)? {
            Some(marked) => Some(retained_entries(&marked, self.mirror.card_tag())?),
            None => None,
        };
        self.preview(entries)
    }

    /// Mirror records with their deletion mark set. `None` when nothing is stale.
    fn mark_for_removal(&self, obs: &Observation) -> Result<Option<Vec<Record>>, SyncError> {
        self.guard_rewritable(&obs.mirror)?;
        if obs.result.stale_in_mirror.is_empty() {
            return Ok(None);
        }

        let pending = pending_titles(&obs.mirror.records);
        if !pending.is_empty() {
            return Err(SyncError::UnfinishedAdd {
                box_name: self.name.0.clone(),
                pending,
            });
        }

        let source_titles: HashSet<&str> = obs.source.iter().map(|r| r.title.as_str()).collect();
        let marked = obs
            .mirror
            .records
            .iter()
            .map(|r| {
                let mark = if source_titles.contains(r.title.as_str()) {
                    DeletionMark::Retained
                } else {
                    DeletionMark::Removed
                };
                r.marked(mark)
            })
            .collect();
        Ok(Some(marked))
    }

    // -----------------------------------------------------------------------
    // Resume
    // -----------------------------------------------------------------------

    /// Finish a remove that stopped after the intermediary write.
    pub fn resume_remove(
        &mut self,
        barrier: &mut dyn OperatorBarrier,
    ) -> Result<RemoveOutcome, SyncError> {
        let mirror = self.mirror.snapshot()?;
        let Some(entries) = self.resume_entries(&mirror)? else {
            tracing::info!("{}: no DELETE markers to resume", self.name);
            return Ok(RemoveOutcome::NothingToRemove);
        };
        let titles = delete_marked_titles(&mirror.records);

        barrier.confirm(&BarrierRequest::new(
            format!("{}: {DELETE_INSTRUCTION}", self.name),
            REMOVE_CONFIRMATIONS,
        ))?;

        self.mirror.write_all(&entries)?;
        tracing::info!("{}: removed {} old notes", self.name, titles.len());
        Ok(RemoveOutcome::Removed { titles })
    }

    pub fn preview_resume(&self) -> Result<MirrorDiff, SyncError> {
        let mirror = self.mirror.snapshot()?;
        let entries = self.resume_entries(&mirror)?;
        self.preview(entries)
    }

    fn resume_entries(&self, mirror: &ParsedMirror) -> Result<Option<Vec<String>>, SyncError> {
        self.guard_parsable(mirror)?;
        if !mirror.records.iter().any(|r| r.delete_marker) {
            return Ok(None);
        }
        let tag = self.mirror.card_tag();
        let entries = mirror
            .records
            .iter()
            .filter(|r| !r.delete_marker)
            .map(|r| render_unchanged(r, tag))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(entries))
    }

    // -----------------------------------------------------------------------
    // Guards and helpers
    // -----------------------------------------------------------------------

    /// Rewriting would silently drop unusable entries.
    fn guard_parsable(&self, mirror: &ParsedMirror) -> Result<(), SyncError> {
        if mirror.errors.is_empty() {
            return Ok(());
        }
        Err(SyncError::MalformedMirror {
            path: self.mirror.path().to_path_buf(),
            entries: mirror.errors.clone(),
        })
    }

    fn guard_rewritable(&self, mirror: &ParsedMirror) -> Result<(), SyncError> {
        self.guard_parsable(mirror)?;
        let marked = delete_marked_titles(&mirror.records);
        if !marked.is_empty() {
            return Err(SyncError::DeleteInProgress {
                box_name: self.name.0.clone(),
                marked,
            });
        }
        Ok(())
    }

    fn preview(&self, entries: Option<Vec<String>>) -> Result<MirrorDiff, SyncError> {
        let current = self.mirror.read_content()?;
        let proposed = match entries {
            Some(entries) => self.mirror.render_content(&entries),
            None => current.clone(),
        };
        Ok(mirror_diff(self.mirror.path(), &current, &proposed))
    }
}

fn render_unchanged(record: &Record, tag: &str) -> Result<String, SyncError> {
    let back = record.back.as_deref().unwrap_or("");
    Ok(Entry::new(EntryForm::preserving(record), record, back)?.render(tag))
}

/// The card back is replaced by [`REMOVAL_PLACEHOLDER`] so the plugin shows
/// what is happening to the card while the deletion is pending.
fn render_delete_marker(record: &Record, tag: &str) -> Result<String, SyncError> {
    Ok(Entry::new(EntryForm::DeleteMarker, record, REMOVAL_PLACEHOLDER)?.render(tag))
}

fn retained_entries(marked: &[Record], tag: &str) -> Result<Vec<String>, SyncError> {
    marked
        .iter()
        .filter(|r| r.pending_deletion == DeletionMark::Retained)
        .map(|r| render_unchanged(r, tag))
        .collect()
}

fn removed_titles(marked: &[Record]) -> Vec<String> {
    marked
        .iter()
        .filter(|r| r.pending_deletion == DeletionMark::Removed)
        .map(|r| r.title.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
