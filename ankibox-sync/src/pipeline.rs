//! Multi-box pipeline entrypoint used by the CLI.
//!
//! Boxes run one after another in config order. The storage index is built
//! once, before the first box, and only when a queue box is configured. A box
//! that fails is reported in its [`BoxRun`] and never stops its siblings.

use ankibox_core::{BoxConfig, BoxName, Config, ConfigError, SourceKind};

use crate::barrier::OperatorBarrier;
use crate::controller::{AddOutcome, BoxController, BoxSummary, RemoveOutcome};
use crate::diff::MirrorDiff;
use crate::identity::StorageIndex;
use crate::SyncError;

/// What to do with each box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Summarize,
    Add,
    Remove,
    ResumeRemove,
    PreviewAdd,
    PreviewRemove,
    PreviewResume,
}

/// Per-action result for one box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxReport {
    Summary(BoxSummary),
    Added(AddOutcome),
    Removed(RemoveOutcome),
    Preview(MirrorDiff),
}

/// Outcome of one box within a pipeline run.
#[derive(Debug)]
pub struct BoxRun {
    pub name: BoxName,
    pub result: Result<BoxReport, SyncError>,
}

impl BoxRun {
    pub fn failed(&self) -> bool {
        self.result.is_err()
    }
}

/// Run `action` over every box in `config`, or only the box named `only`.
///
/// Errors returned here concern the run as a whole (unknown box name, missing
/// `storage_root`); per-box failures live in the returned [`BoxRun`]s. An
/// index that fails to build fails only the queue boxes.
pub fn run(
    config: &Config,
    action: Action,
    only: Option<&BoxName>,
    barrier: &mut dyn OperatorBarrier,
) -> Result<Vec<BoxRun>, SyncError> {
    let boxes = select_boxes(config, only)?;

    let index = if boxes.iter().any(|b| b.kind == SourceKind::Queue) {
        let root = config.storage_root.as_deref().ok_or_else(|| {
            SyncError::Config(ConfigError::Invalid {
                reason: "queue boxes need storage_root".to_string(),
            })
        })?;
        match StorageIndex::build(root) {
            Ok(index) => Some(Ok(index)),
            Err(e) => {
                tracing::warn!("storage index under {} failed: {e}", root.display());
                Some(Err((root.to_path_buf(), e.to_string())))
            }
        }
    } else {
        None
    };

    let mut runs = Vec::with_capacity(boxes.len());
    for b in boxes {
        let result = match (&index, b.kind) {
            (Some(Err((root, reason))), SourceKind::Queue) => Err(SyncError::IndexUnavailable {
                root: root.clone(),
                reason: reason.clone(),
            }),
            (Some(Ok(index)), _) => run_box(config, b, Some(index), action, barrier),
            _ => run_box(config, b, None, action, barrier),
        };
        if let Err(e) = &result {
            tracing::warn!("box '{}' failed: {e}", b.name);
        }
        runs.push(BoxRun {
            name: b.name.clone(),
            result,
        });
    }
    Ok(runs)
}

fn select_boxes<'c>(
    config: &'c Config,
    only: Option<&BoxName>,
) -> Result<Vec<&'c BoxConfig>, SyncError> {
    match only {
        None => Ok(config.boxes.iter().collect()),
        Some(name) => {
            let b = config.find_box(name).ok_or_else(|| {
                SyncError::Config(ConfigError::Invalid {
                    reason: format!("no box named '{name}' in config"),
                })
            })?;
            Ok(vec![b])
        }
    }
}

fn run_box(
    config: &Config,
    b: &BoxConfig,
    index: Option<&StorageIndex>,
    action: Action,
    barrier: &mut dyn OperatorBarrier,
) -> Result<BoxReport, SyncError> {
    let mut controller = BoxController::for_box(config, b, index)?;
    tracing::debug!("box '{}': {action:?}", b.name);
    let report = match action {
        Action::Summarize => BoxReport::Summary(controller.summarize()?),
        Action::Add => BoxReport::Added(controller.add(barrier)?),
        Action::Remove => BoxReport::Removed(controller.remove(barrier)?),
        Action::ResumeRemove => BoxReport::Removed(controller.resume_remove(barrier)?),
        Action::PreviewAdd => BoxReport::Preview(controller.preview_add()?),
        Action::PreviewRemove => BoxReport::Preview(controller.preview_remove()?),
        Action::PreviewResume => BoxReport::Preview(controller.preview_resume()?),
    };
    Ok(report)
}
