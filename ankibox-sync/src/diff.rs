//! Unified diffs for `--dry-run` previews.

use std::path::{Path, PathBuf};

use similar::TextDiff;

/// What an operation would change in one mirror file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorDiff {
    pub path: PathBuf,
    /// Empty when the content would not change.
    pub unified_diff: String,
}

impl MirrorDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Diff `current` against `proposed` for the mirror at `path`.
pub fn mirror_diff(path: &Path, current: &str, proposed: &str) -> MirrorDiff {
    let current = normalize_line_endings(current);
    let proposed = normalize_line_endings(proposed);
    if current == proposed {
        return MirrorDiff {
            path: path.to_path_buf(),
            unified_diff: String::new(),
        };
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let old_header = format!("a/{name}");
    let new_header = format!("b/{name}");
    let unified = TextDiff::from_lines(&current, &proposed)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    MirrorDiff {
        path: path.to_path_buf(),
        unified_diff: unified,
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
