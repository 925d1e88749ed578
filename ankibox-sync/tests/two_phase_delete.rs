//! Full add → external sync → remove cycles through the public API, with a
//! barrier that plays the part of the card sync plugin.

use std::fs;
use std::path::{Path, PathBuf};

use ankibox_core::{BoxConfig, BoxName, Config, SourceKind};
use ankibox_sync::{
    controller::{AddOutcome, RemoveOutcome},
    format::parse_mirror,
    BarrierRequest, BoxController, BoxState, OperatorBarrier, SyncError,
};
use tempfile::TempDir;

const TAG: &str = "#card";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assigns ids to unconfirmed entries when confirming, like the plugin does.
struct FakePlugin {
    mirror: PathBuf,
    next_id: u64,
    confirmations: Vec<usize>,
}

impl FakePlugin {
    fn new(mirror: &Path) -> Self {
        Self {
            mirror: mirror.to_path_buf(),
            next_id: 1000,
            confirmations: vec![],
        }
    }
}

impl OperatorBarrier for FakePlugin {
    fn confirm(&mut self, request: &BarrierRequest) -> Result<(), SyncError> {
        self.confirmations.push(request.confirmations);
        let text = fs::read_to_string(&self.mirror).expect("read mirror");
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;
        while i < lines.len() {
            out.push(lines[i].to_string());
            if lines[i].ends_with(TAG) && i + 1 < lines.len() {
                out.push(lines[i + 1].to_string());
                let has_id = lines
                    .get(i + 2)
                    .is_some_and(|l| l.starts_with("<!--ID:") || *l == "DELETE");
                if !has_id {
                    out.push(format!("<!--ID: {}-->", self.next_id));
                    self.next_id += 1;
                }
                i += 2;
                continue;
            }
            i += 1;
        }
        fs::write(&self.mirror, out.join("\n")).expect("write mirror");
        Ok(())
    }
}

struct Vault {
    _dir: TempDir,
    config: Config,
    docs: PathBuf,
    mirror: PathBuf,
}

impl Vault {
    fn new(titles: &[&str]) -> Self {
        let dir = TempDir::new().expect("tmp");
        let docs = dir.path().join("physics");
        fs::create_dir_all(&docs).expect("mkdir");
        for t in titles {
            fs::write(docs.join(format!("{t}.md")), format!("# {t}\n")).expect("write doc");
        }
        let config = Config {
            card_tag: TAG.to_string(),
            storage_root: None,
            mirror_root: None,
            boxes: vec![BoxConfig {
                name: BoxName::from("physics"),
                kind: SourceKind::Folder,
                path: docs.clone(),
                card_tag: None,
            }],
        };
        let mirror = config
            .mirror_path_for(&config.boxes[0])
            .expect("mirror path");
        Self {
            _dir: dir,
            config,
            docs,
            mirror,
        }
    }

    fn controller(&self) -> BoxController<'static> {
        BoxController::for_box(&self.config, &self.config.boxes[0], None).expect("controller")
    }

    fn mirror_titles(&self) -> Vec<String> {
        let text = fs::read_to_string(&self.mirror).expect("read mirror");
        let parsed = parse_mirror(&text, TAG);
        assert!(parsed.errors.is_empty());
        parsed.records.into_iter().map(|r| r.title).collect()
    }
}

#[test]
fn add_then_remove_round_trip() {
    init_logging();
    let vault = Vault::new(&["Entropy", "Enthalpy"]);
    let mut plugin = FakePlugin::new(&vault.mirror);

    let added = vault.controller().add(&mut plugin).expect("add");
    assert!(matches!(added, AddOutcome::Added { ref titles } if titles.len() == 2));
    assert_eq!(vault.controller().state().expect("state"), BoxState::InSync);

    fs::remove_file(vault.docs.join("Enthalpy.md")).expect("delete doc");
    assert_eq!(
        vault.controller().state().expect("state"),
        BoxState::OutOfSync { new: 0, stale: 1 }
    );

    let removed = vault.controller().remove(&mut plugin).expect("remove");
    assert_eq!(
        removed,
        RemoveOutcome::Removed {
            titles: vec!["Enthalpy".to_string()]
        }
    );
    assert_eq!(plugin.confirmations, vec![1, 4]);
    assert_eq!(vault.mirror_titles(), vec!["Entropy"]);
    assert_eq!(vault.controller().state().expect("state"), BoxState::InSync);
}

#[test]
fn remove_refused_until_plugin_has_run() {
    init_logging();
    let vault = Vault::new(&["Entropy"]);

    struct Impatient;
    impl OperatorBarrier for Impatient {
        fn confirm(&mut self, _: &BarrierRequest) -> Result<(), SyncError> {
            Ok(())
        }
    }

    vault.controller().add(&mut Impatient).expect("add");
    fs::remove_file(vault.docs.join("Entropy.md")).expect("delete doc");

    let err = vault.controller().remove(&mut Impatient).unwrap_err();
    assert!(matches!(err, SyncError::UnfinishedAdd { .. }), "got: {err}");
    assert_eq!(vault.mirror_titles(), vec!["Entropy"]);
}

#[test]
fn interrupted_remove_is_resumable() {
    init_logging();
    let vault = Vault::new(&["A", "B"]);
    let mut plugin = FakePlugin::new(&vault.mirror);
    vault.controller().add(&mut plugin).expect("add");
    fs::remove_file(vault.docs.join("B.md")).expect("delete doc");

    struct Walkaway;
    impl OperatorBarrier for Walkaway {
        fn confirm(&mut self, _: &BarrierRequest) -> Result<(), SyncError> {
            Err(SyncError::BarrierAborted)
        }
    }
    let err = vault.controller().remove(&mut Walkaway).unwrap_err();
    assert!(matches!(err, SyncError::BarrierAborted));
    assert!(matches!(
        vault.controller().state().expect("state"),
        BoxState::DeleteInProgress { .. }
    ));

    let resumed = vault.controller().resume_remove(&mut plugin).expect("resume");
    assert_eq!(
        resumed,
        RemoveOutcome::Removed {
            titles: vec!["B".to_string()]
        }
    );
    assert_eq!(vault.mirror_titles(), vec!["A"]);
}
