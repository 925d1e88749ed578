//! `ankibox summary`: new/old note counts per box.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use ankibox_sync::{pipeline, Action, BoxReport, BoxSummary, NoBarrier};

use super::{box_filter, finish, load_config, print_box_error, print_divider};
use crate::Globals;

/// Arguments for `ankibox summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Counts only, without note titles.
    #[arg(long)]
    pub short: bool,

    /// Emit machine-readable JSON.
    #[arg(long, conflicts_with = "short")]
    pub json: bool,

    /// Only this box.
    #[arg(long = "box", value_name = "NAME")]
    pub box_name: Option<String>,
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    boxes: Vec<&'a BoxSummary>,
    errors: Vec<BoxErrorJson>,
}

#[derive(Serialize)]
struct BoxErrorJson {
    #[serde(rename = "box")]
    name: String,
    error: String,
}

impl SummaryArgs {
    pub fn run(self, globals: &Globals) -> Result<()> {
        let config = load_config(globals)?;
        let only = box_filter(self.box_name.as_deref());
        let mut barrier = NoBarrier;
        let runs = pipeline::run(&config, Action::Summarize, only.as_ref(), &mut barrier)
            .context("summary failed")?;

        if self.json {
            let mut payload = SummaryJson {
                boxes: Vec::new(),
                errors: Vec::new(),
            };
            for run in &runs {
                match &run.result {
                    Ok(BoxReport::Summary(s)) => payload.boxes.push(s),
                    Ok(_) => {}
                    Err(e) => payload.errors.push(BoxErrorJson {
                        name: run.name.0.clone(),
                        error: e.to_string(),
                    }),
                }
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize summary JSON")?
            );
            return finish(&runs);
        }

        for run in &runs {
            print_divider(&run.name);
            match &run.result {
                Ok(BoxReport::Summary(s)) => print_summary(s, self.short),
                Ok(_) => {}
                Err(e) => print_box_error(&run.name, e),
            }
        }
        if runs.is_empty() {
            println!("No boxes configured.");
        }
        finish(&runs)
    }
}

fn print_summary(s: &BoxSummary, short: bool) {
    let name = &s.name;
    println!();
    println!("{} new notes found in \"{name}\" source", s.new_in_source.len());
    println!("{} old notes found in \"{name}\" ankinote", s.stale_in_mirror.len());
    println!();
    println!("{} notes found in \"{name}\" source", s.source_total);
    println!("{} notes found in \"{name}\" ankinote", s.mirror_total);
    if short {
        if !s.malformed_entries.is_empty() {
            println!(
                "{} unusable entries in \"{name}\" ankinote",
                s.malformed_entries.len()
            );
        }
        return;
    }
    println!("{} notes found in \"{name}\" ankinote w/ID", s.mirror_with_id);
    println!();

    if !s.malformed_entries.is_empty() {
        println!(
            "{} unusable entries in \"{name}\" ankinote:",
            s.malformed_entries.len()
        );
        for entry in &s.malformed_entries {
            println!("- {entry}");
        }
        println!();
    }

    if s.new_in_source.is_empty() && s.stale_in_mirror.is_empty() {
        println!("\"{name}\" is in-sync.");
        return;
    }
    if !s.new_in_source.is_empty() {
        println!("new notes in source:");
        for title in &s.new_in_source {
            println!("- {title}");
        }
    }
    if !s.stale_in_mirror.is_empty() {
        println!("old notes in ankinote:");
        for title in &s.stale_in_mirror {
            println!("- {title}");
        }
    }
    println!();
}
