use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

const TAG: &str = "#card";

/// A home dir, a vault with one folder box, and a config pointing at it.
struct Setup {
    home: TempDir,
    docs: PathBuf,
    config: PathBuf,
}

impl Setup {
    fn new(titles: &[&str]) -> Self {
        let home = TempDir::new().expect("home");
        let docs = home.path().join("vault/physics");
        fs::create_dir_all(&docs).expect("mkdir");
        for t in titles {
            fs::write(docs.join(format!("{t}.md")), format!("\nback of {t}\n")).expect("doc");
        }
        let config = home.path().join("ankibox.yaml");
        fs::write(
            &config,
            format!(
                "card_tag: \"{TAG}\"\nboxes:\n  - name: physics\n    path: {}\n",
                docs.display()
            ),
        )
        .expect("config");
        Self { home, docs, config }
    }

    fn mirror(&self) -> PathBuf {
        self.docs.join("ankibox/ANKIBOX.md")
    }

    fn mirror_text(&self) -> String {
        fs::read_to_string(self.mirror()).expect("read mirror")
    }

    /// `(title, id)` pairs, all confirmed or not as given.
    fn write_mirror(&self, entries: &[(&str, Option<&str>)]) {
        let mut text = "\nTARGET DECK: physics\n\n---\n".to_string();
        for (title, id) in entries {
            text.push_str(&format!(
                "\nfilepath: {}\n\n{title} {TAG}\nback of {title}\n",
                self.docs.join(format!("{title}.md")).display()
            ));
            if let Some(id) = id {
                text.push_str(&format!("<!--ID: {id}-->\n"));
            }
            text.push_str("\n\n---\n");
        }
        fs::create_dir_all(self.mirror().parent().expect("parent")).expect("mkdir");
        fs::write(self.mirror(), text).expect("write mirror");
    }

    fn cmd(&self) -> Command {
        ankibox_cmd(self.home.path(), &self.config)
    }
}

fn ankibox_cmd(home: &Path, config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ankibox"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

// ---------------------------------------------------------------------------
// summary / status
// ---------------------------------------------------------------------------

#[test]
fn summary_lists_new_and_old_titles() {
    let s = Setup::new(&["A", "B"]);
    s.write_mirror(&[("B", Some("1")), ("C", Some("2"))]);

    s.cmd()
        .arg("summary")
        .assert()
        .success()
        .stdout(contains("1 new notes found in \"physics\" source"))
        .stdout(contains("1 old notes found in \"physics\" ankinote"))
        .stdout(contains("2 notes found in \"physics\" ankinote w/ID"))
        .stdout(contains("new notes in source:\n- A"))
        .stdout(contains("old notes in ankinote:\n- C"));
}

#[test]
fn summary_of_synced_box_says_in_sync() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1"))]);
    s.cmd()
        .arg("summary")
        .assert()
        .success()
        .stdout(contains("\"physics\" is in-sync."));
}

#[test]
fn summary_json_is_parseable() {
    let s = Setup::new(&["A"]);
    let out = s
        .cmd()
        .args(["summary", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(json["boxes"][0]["name"], "physics");
    assert_eq!(json["boxes"][0]["new_in_source"][0], "A");
    assert_eq!(json["boxes"][0]["state"]["state"], "out_of_sync");
    assert!(json["errors"].as_array().expect("errors").is_empty());
}

#[test]
fn summary_for_unknown_box_fails() {
    let s = Setup::new(&[]);
    s.cmd()
        .args(["summary", "--box", "chemistry"])
        .assert()
        .failure()
        .stderr(contains("no box named 'chemistry'"));
}

#[test]
fn status_json_reports_state_per_box() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", None)]);
    let out = s
        .cmd()
        .args(["status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(json[0]["box"], "physics");
    assert_eq!(json[0]["state"], "add_pending");
    assert_eq!(json[0]["pending"][0], "B");
}

#[test]
fn status_table_names_the_box() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1"))]);
    s.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("1 boxes | 0 need attention"))
        .stdout(contains("physics"))
        .stdout(contains("IN SYNC"));
}

#[test]
fn missing_config_fails_with_context() {
    let home = TempDir::new().expect("home");
    ankibox_cmd(home.path(), &home.path().join("nope.yaml"))
        .arg("summary")
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[test]
fn add_writes_mirror_and_waits_for_enter() {
    let s = Setup::new(&["A", "B"]);
    s.cmd()
        .arg("add")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(contains("[ACTION REQUIRED] physics:"))
        .stdout(contains("added 2 new notes."));

    let text = s.mirror_text();
    assert!(text.starts_with("\nTARGET DECK: physics\n\n---\n"));
    assert!(text.contains("A #card\nback of A\n"));
    assert!(text.contains("B #card\nback of B\n"));
}

#[test]
fn add_with_nothing_new_takes_no_action() {
    let s = Setup::new(&[]);
    s.cmd()
        .arg("add")
        .assert()
        .success()
        .stdout(contains("no new notes to add."))
        .stdout(contains("no action taken."));
    assert!(!s.mirror().exists());
}

#[test]
fn add_dry_run_prints_diff_and_writes_nothing() {
    let s = Setup::new(&["A"]);
    s.cmd()
        .args(["add", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("+A #card"));
    assert!(!s.mirror().exists(), "dry-run must not create the mirror");
}

// ---------------------------------------------------------------------------
// remove
// ---------------------------------------------------------------------------

#[test]
fn remove_refuses_while_add_is_unfinished() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1")), ("C", None)]);
    let before = s.mirror_text();

    s.cmd()
        .arg("remove")
        .assert()
        .failure()
        .stderr(contains("without an ID"));
    assert_eq!(s.mirror_text(), before);
}

#[test]
fn remove_after_four_confirmations_drops_entry() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1")), ("C", Some("2"))]);

    s.cmd()
        .arg("remove")
        .write_stdin("\n\n\n\n")
        .assert()
        .success()
        .stdout(contains("perform DELETEs"))
        .stdout(contains("removed 1 old notes."));

    let text = s.mirror_text();
    assert!(text.contains("B #card"));
    assert!(!text.contains("C #card"));
    assert!(!text.contains("DELETE"));
}

#[test]
fn closed_stdin_leaves_markers_and_resume_finishes() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1")), ("C", Some("2"))]);

    s.cmd()
        .arg("remove")
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(contains("operator input closed"));
    assert!(s.mirror_text().contains("DELETE\n<!--ID: 2-->"));

    s.cmd()
        .arg("add")
        .assert()
        .failure()
        .stderr(contains("remove --resume"));

    s.cmd()
        .args(["remove", "--resume"])
        .write_stdin("\n\n\n\n")
        .assert()
        .success()
        .stdout(contains("removed 1 old notes."));
    assert!(!s.mirror_text().contains("C #card"));
}

#[test]
fn remove_dry_run_shows_removed_entry() {
    let s = Setup::new(&["B"]);
    s.write_mirror(&[("B", Some("1")), ("C", Some("2"))]);
    let before = s.mirror_text();
    s.cmd()
        .args(["remove", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("-C #card"));
    assert_eq!(s.mirror_text(), before);
}
