//! Pure source/mirror classification.
//!
//! Matching is exact title equality. No case folding or whitespace
//! normalisation: `Entropy` and `entropy` are two different records.

use std::collections::HashSet;

use ankibox_core::Record;

/// Classification of one source snapshot against one mirror snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Source records whose title is absent from the mirror, in source order.
    pub new_in_source: Vec<Record>,
    /// Mirror records whose title is absent from the source, in mirror order.
    pub stale_in_mirror: Vec<Record>,
    /// Mirror records the external system has not confirmed yet.
    pub unreferenced_external_id_count: usize,
    pub source_total: usize,
    pub mirror_total: usize,
}

impl ReconciliationResult {
    /// Mirror records already carrying an external id.
    pub fn mirror_with_id(&self) -> usize {
        self.mirror_total - self.unreferenced_external_id_count
    }

    pub fn is_in_sync(&self) -> bool {
        self.new_in_source.is_empty() && self.stale_in_mirror.is_empty()
    }

    pub fn new_titles(&self) -> Vec<String> {
        self.new_in_source.iter().map(|r| r.title.clone()).collect()
    }

    pub fn stale_titles(&self) -> Vec<String> {
        self.stale_in_mirror.iter().map(|r| r.title.clone()).collect()
    }
}

/// Classify `source` against `mirror` by title.
pub fn reconcile(source: &[Record], mirror: &[Record]) -> ReconciliationResult {
    let source_titles: HashSet<&str> = source.iter().map(|r| r.title.as_str()).collect();
    let mirror_titles: HashSet<&str> = mirror.iter().map(|r| r.title.as_str()).collect();

    let new_in_source = source
        .iter()
        .filter(|r| !mirror_titles.contains(r.title.as_str()))
        .cloned()
        .collect();
    let stale_in_mirror = mirror
        .iter()
        .filter(|r| !source_titles.contains(r.title.as_str()))
        .cloned()
        .collect();

    ReconciliationResult {
        new_in_source,
        stale_in_mirror,
        unreferenced_external_id_count: mirror.iter().filter(|r| !r.is_confirmed()).count(),
        source_total: source.len(),
        mirror_total: mirror.len(),
    }
}
