pub mod add;
pub mod remove;
pub mod status;
pub mod summary;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use ankibox_core::{config, BoxName, Config};
use ankibox_sync::BoxRun;

use crate::Globals;

const DIVIDER_WIDTH: usize = 80;

/// Load the config named by `--config`, or the default one.
pub fn load_config(globals: &Globals) -> Result<Config> {
    let cfg = match &globals.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::load().context("failed to load ~/.ankibox/config.yaml")?,
    };
    tracing::debug!("{} boxes configured", cfg.boxes.len());
    Ok(cfg)
}

/// `--box` value as a [`BoxName`].
pub fn box_filter(name: Option<&str>) -> Option<BoxName> {
    name.map(BoxName::from)
}

/// `---> physics ------…`, padded to a fixed width.
pub fn print_divider(name: &BoxName) {
    let dashes = "-".repeat(DIVIDER_WIDTH.saturating_sub(6 + name.0.len()));
    println!("\n---> {} {}", name.0.bold(), dashes.bright_black());
}

pub fn print_box_error(name: &BoxName, err: &ankibox_sync::SyncError) {
    eprintln!("{} {}: {err}", "error:".red().bold(), name);
}

/// Turn per-box failures into a non-zero exit.
pub fn finish(runs: &[BoxRun]) -> Result<()> {
    let failed = runs.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        bail!("{failed} of {} boxes failed", runs.len());
    }
    Ok(())
}

/// Print a dry-run diff, or a note that nothing would change.
pub fn print_preview(name: &BoxName, diff: &ankibox_sync::diff::MirrorDiff) {
    if diff.is_empty() {
        println!("[dry-run] no changes for \"{name}\".");
        return;
    }
    print!("{}", diff.unified_diff);
    if !diff.unified_diff.ends_with('\n') {
        println!();
    }
}
