//! Title → document path resolution.
//!
//! Two strategies:
//! - [`DirectResolver`]: `{root}/{title}.md`, for callers that already know
//!   the containing directory.
//! - [`StorageIndex`]: a flat list of every file under a storage root, built
//!   once per process and searched by substring.
//!
//! When several indexed files share a name the first one in walk order wins.
//! Walk order is whatever the filesystem returns, so this tie-break is not
//! deterministic across machines.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// File suffix of source documents.
pub const RECORD_SUFFIX: &str = ".md";

/// Maps a record title to a document path.
pub trait Resolve {
    fn resolve(&self, title: &str) -> Option<PathBuf>;
}

/// `{root}/{title}.md`, unconditionally.
#[derive(Debug, Clone)]
pub struct DirectResolver {
    root: PathBuf,
}

impl DirectResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Resolve for DirectResolver {
    fn resolve(&self, title: &str) -> Option<PathBuf> {
        Some(self.root.join(format!("{title}{RECORD_SUFFIX}")))
    }
}

/// Every file path under a storage root, in walk order.
#[derive(Debug, Clone, Default)]
pub struct StorageIndex {
    paths: Vec<PathBuf>,
}

impl StorageIndex {
    /// Recursively walk `root` and record every regular file.
    ///
    /// Only an unreadable `root` is an error; unreadable subdirectories are
    /// logged and skipped.
    pub fn build(root: &Path) -> Result<Self, SyncError> {
        let mut paths = Vec::new();
        collect_files(root, &mut paths)?;
        tracing::debug!("indexed {} files under {}", paths.len(), root.display());
        Ok(Self { paths })
    }

    /// An index over an explicit path list, kept in the given order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Resolve for StorageIndex {
    /// Titles containing a separator (`dir/Note`) match any indexed path that
    /// contains `dir/Note.md`; bare titles match on the final path segment.
    fn resolve(&self, title: &str) -> Option<PathBuf> {
        let file_name = format!("{title}{RECORD_SUFFIX}");
        let found = if title.contains('/') {
            self.paths
                .iter()
                .find(|p| p.to_string_lossy().replace('\\', "/").contains(&file_name))
        } else {
            self.paths
                .iter()
                .find(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == file_name))
        };
        if found.is_none() {
            tracing::debug!("no indexed document for '{title}'");
        }
        found.cloned()
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            if let Err(e) = collect_files(&path, out) {
                tracing::warn!("skipping unreadable directory: {e}");
            }
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn direct_appends_suffix() {
        let r = DirectResolver::new("/vault/physics");
        assert_eq!(
            r.resolve("Entropy"),
            Some(PathBuf::from("/vault/physics/Entropy.md"))
        );
    }

    #[test]
    fn build_walks_nested_directories() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("a/b")).unwrap();
        fs::write(root.path().join("top.md"), "x").unwrap();
        fs::write(root.path().join("a/b/deep.md"), "x").unwrap();

        let index = StorageIndex::build(root.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("deep"), Some(root.path().join("a/b/deep.md")));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let locked = root.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.md"), "x").unwrap();
        fs::write(root.path().join("top.md"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let still_readable = fs::read_dir(&locked).is_ok();

        let built = StorageIndex::build(root.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if still_readable {
            // permissions are not enforced for this user (root)
            return;
        }
        let index = built.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("top"), Some(root.path().join("top.md")));
    }

    #[test]
    fn bare_title_matches_whole_file_name_only() {
        let index = StorageIndex::from_paths(vec![
            PathBuf::from("/v/notes/Big Entropy.md"),
            PathBuf::from("/v/notes/Entropy.md"),
        ]);
        assert_eq!(
            index.resolve("Entropy"),
            Some(PathBuf::from("/v/notes/Entropy.md"))
        );
    }

    #[test]
    fn title_with_separator_matches_path_substring() {
        let index = StorageIndex::from_paths(vec![
            PathBuf::from("/v/physics/Entropy.md"),
            PathBuf::from("/v/chemistry/Entropy.md"),
        ]);
        assert_eq!(
            index.resolve("chemistry/Entropy"),
            Some(PathBuf::from("/v/chemistry/Entropy.md"))
        );
    }

    #[test]
    fn duplicate_names_resolve_to_first_in_index_order() {
        let index = StorageIndex::from_paths(vec![
            PathBuf::from("/v/b/Dup.md"),
            PathBuf::from("/v/a/Dup.md"),
        ]);
        assert_eq!(index.resolve("Dup"), Some(PathBuf::from("/v/b/Dup.md")));
    }

    #[test]
    fn unknown_title_is_unresolved() {
        let index = StorageIndex::from_paths(vec![PathBuf::from("/v/a.md")]);
        assert_eq!(index.resolve("missing"), None);
    }

    #[test]
    fn build_on_missing_root_is_io_error() {
        let root = TempDir::new().unwrap();
        let err = StorageIndex::build(&root.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
