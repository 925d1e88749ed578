//! YAML configuration: location, loading, validation, derived paths.
//!
//! # Storage layout
//!
//! ```text
//! ~/.ankibox/
//!   config.yaml                 (boxes, card tag, storage/mirror roots)
//!
//! <folder box path>/
//!   ankibox/ANKIBOX.md          (mirror file of a folder box)
//!
//! <mirror_root>/
//!   <box name>.md               (mirror file of a queue box)
//! ```
//!
//! # API pattern
//!
//! Every lookup that depends on the home directory has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at` or
//! [`load_from`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{invalid, ConfigError};
use crate::types::{BoxConfig, BoxName, Config, SourceKind};

/// Directory (relative to a folder box) that holds its mirror file.
pub const FOLDER_MIRROR_DIR: &str = "ankibox";
/// File name of a folder box's mirror file.
pub const FOLDER_MIRROR_FILE: &str = "ANKIBOX.md";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.ankibox/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".ankibox").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate the config at an explicit path.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML,
/// `ConfigError::Invalid` if it fails [`Config::validate`].
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.ankibox/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Validation and derived values
// ---------------------------------------------------------------------------

impl Config {
    /// Check that folders are folders, files are files, and every box has what
    /// its source kind needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.card_tag.trim().is_empty() {
            return Err(invalid("card_tag must not be empty"));
        }

        let mut seen = HashSet::new();
        for b in &self.boxes {
            if b.name.0.trim().is_empty() {
                return Err(invalid(format!(
                    "box at {} has an empty name",
                    b.path.display()
                )));
            }
            if !seen.insert(b.name.0.as_str()) {
                return Err(invalid(format!("duplicate box name '{}'", b.name)));
            }
            if let Some(tag) = &b.card_tag {
                if tag.trim().is_empty() {
                    return Err(invalid(format!("box '{}' has an empty card_tag", b.name)));
                }
            }

            match b.kind {
                SourceKind::Folder => {
                    if !b.path.is_dir() {
                        return Err(invalid(format!(
                            "path for '{}' is not a folder: {}",
                            b.name,
                            b.path.display()
                        )));
                    }
                }
                SourceKind::Queue => {
                    if !b.path.is_file() {
                        return Err(invalid(format!(
                            "path for '{}' is not a file: {}",
                            b.name,
                            b.path.display()
                        )));
                    }
                    if self.storage_root.is_none() {
                        return Err(invalid(format!(
                            "queue box '{}' needs storage_root to resolve titles",
                            b.name
                        )));
                    }
                    if self.mirror_root.is_none() {
                        return Err(invalid(format!(
                            "queue box '{}' needs mirror_root to store its mirror",
                            b.name
                        )));
                    }
                }
            }
        }

        if let Some(root) = &self.storage_root {
            if self.has_queue_boxes() && !root.is_dir() {
                return Err(invalid(format!(
                    "storage_root is not a folder: {}",
                    root.display()
                )));
            }
        }
        Ok(())
    }

    /// The card tag in effect for `b`.
    pub fn card_tag_for<'a>(&'a self, b: &'a BoxConfig) -> &'a str {
        b.card_tag.as_deref().unwrap_or(&self.card_tag)
    }

    pub fn find_box(&self, name: &BoxName) -> Option<&BoxConfig> {
        self.boxes.iter().find(|b| &b.name == name)
    }

    pub fn has_queue_boxes(&self) -> bool {
        self.boxes.iter().any(|b| b.kind == SourceKind::Queue)
    }

    /// Where the mirror file of `b` lives: pure, no I/O.
    ///
    /// Returns `ConfigError::Invalid` for a queue box when `mirror_root` is unset.
    pub fn mirror_path_for(&self, b: &BoxConfig) -> Result<PathBuf, ConfigError> {
        match b.kind {
            SourceKind::Folder => Ok(b.path.join(FOLDER_MIRROR_DIR).join(FOLDER_MIRROR_FILE)),
            SourceKind::Queue => {
                let root = self.mirror_root.as_ref().ok_or_else(|| {
                    invalid(format!("queue box '{}' needs mirror_root", b.name))
                })?;
                Ok(root.join(format!("{}.md", b.name.0)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
