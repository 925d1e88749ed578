//! Box state classification.
//!
//! The controller keeps no journal; which phase a box is in is read off the
//! mirror file itself. Precedence (first match wins):
//! 1. `Malformed` (mirror has unusable entries)
//! 2. `DeleteInProgress` (`DELETE` markers left by an interrupted remove)
//! 3. `AddPending` (entries still waiting for an external id)
//! 4. `OutOfSync` (new or stale titles)
//! 5. `InSync`

use serde::Serialize;

use ankibox_core::Record;

use crate::format::ParsedMirror;
use crate::reconcile::ReconciliationResult;

/// Where a box stands, derived from its mirror content and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BoxState {
    Malformed { entries: usize },
    DeleteInProgress { marked: Vec<String> },
    AddPending { pending: Vec<String> },
    OutOfSync { new: usize, stale: usize },
    InSync,
}

impl BoxState {
    /// Short label for tables.
    pub fn label(&self) -> &'static str {
        match self {
            BoxState::Malformed { .. } => "malformed",
            BoxState::DeleteInProgress { .. } => "delete in progress",
            BoxState::AddPending { .. } => "add pending",
            BoxState::OutOfSync { .. } => "out of sync",
            BoxState::InSync => "in sync",
        }
    }
}

pub fn classify(mirror: &ParsedMirror, result: &ReconciliationResult) -> BoxState {
    if !mirror.errors.is_empty() {
        return BoxState::Malformed {
            entries: mirror.errors.len(),
        };
    }

    let marked = delete_marked_titles(&mirror.records);
    if !marked.is_empty() {
        return BoxState::DeleteInProgress { marked };
    }

    let pending = pending_titles(&mirror.records);
    if !pending.is_empty() {
        return BoxState::AddPending { pending };
    }

    if !result.is_in_sync() {
        return BoxState::OutOfSync {
            new: result.new_in_source.len(),
            stale: result.stale_in_mirror.len(),
        };
    }

    BoxState::InSync
}

/// Titles of mirror records without an external id.
pub fn pending_titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.is_confirmed())
        .map(|r| r.title.clone())
        .collect()
}

/// Titles of mirror records carrying a `DELETE` line.
pub fn delete_marked_titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.delete_marker)
        .map(|r| r.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntryParseError;
    use crate::reconcile::reconcile;
    use ankibox_core::ExternalId;

    fn confirmed(title: &str, delete: bool) -> Record {
        Record::mirror(title, None, "", Some(ExternalId::new("<!--ID: 1-->")), delete)
    }

    fn parsed(records: Vec<Record>) -> ParsedMirror {
        ParsedMirror {
            records,
            errors: vec![],
        }
    }

    #[test]
    fn malformed_wins_over_everything() {
        let mut mirror = parsed(vec![confirmed("A", true), Record::mirror("B", None, "", None, false)]);
        mirror.errors.push(EntryParseError {
            index: 3,
            reason: "no title".to_string(),
        });
        let r = reconcile(&[], &mirror.records);
        assert_eq!(classify(&mirror, &r), BoxState::Malformed { entries: 1 });
    }

    #[test]
    fn delete_markers_win_over_pending_ids() {
        let mirror = parsed(vec![confirmed("A", true), Record::mirror("B", None, "", None, false)]);
        let r = reconcile(&[], &mirror.records);
        assert_eq!(
            classify(&mirror, &r),
            BoxState::DeleteInProgress {
                marked: vec!["A".to_string()]
            }
        );
    }

    #[test]
    fn pending_ids_are_add_pending() {
        let mirror = parsed(vec![Record::mirror("B", None, "", None, false)]);
        let r = reconcile(&[Record::source("B", None)], &mirror.records);
        assert_eq!(
            classify(&mirror, &r),
            BoxState::AddPending {
                pending: vec!["B".to_string()]
            }
        );
    }

    #[test]
    fn out_of_sync_then_in_sync() {
        let mirror = parsed(vec![confirmed("B", false)]);
        let r = reconcile(&[Record::source("A", None)], &mirror.records);
        assert_eq!(classify(&mirror, &r), BoxState::OutOfSync { new: 1, stale: 1 });

        let r = reconcile(&[Record::source("B", None)], &mirror.records);
        assert_eq!(classify(&mirror, &r), BoxState::InSync);
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_string(&BoxState::OutOfSync { new: 2, stale: 0 }).unwrap();
        assert_eq!(json, r#"{"state":"out_of_sync","new":2,"stale":0}"#);
    }
}
