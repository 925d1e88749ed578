//! `ankibox status`: one table row per box.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ankibox_sync::{pipeline, Action, BoxReport, BoxState, NoBarrier};

use super::{finish, load_config};
use crate::Globals;

/// Arguments for `ankibox status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct BoxStatusJson {
    #[serde(rename = "box")]
    name: String,
    #[serde(flatten)]
    state: Option<BoxState>,
    detail: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "box")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl StatusArgs {
    pub fn run(self, globals: &Globals) -> Result<()> {
        let config = load_config(globals)?;
        let mut barrier = NoBarrier;
        let runs = pipeline::run(&config, Action::Summarize, None, &mut barrier)
            .context("status check failed")?;

        let rows: Vec<(String, Result<BoxState, String>, String)> = runs
            .iter()
            .map(|run| match &run.result {
                Ok(BoxReport::Summary(s)) => {
                    (run.name.0.clone(), Ok(s.state.clone()), state_detail(&s.state))
                }
                Ok(_) => (run.name.0.clone(), Err(String::new()), String::new()),
                Err(e) => (run.name.0.clone(), Err(e.to_string()), e.to_string()),
            })
            .collect();

        if self.json {
            let payload: Vec<BoxStatusJson> = rows
                .into_iter()
                .map(|(name, state, detail)| BoxStatusJson {
                    name,
                    state: state.ok(),
                    detail,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return finish(&runs);
        }

        print_table(rows);
        finish(&runs)
    }
}

fn print_table(rows: Vec<(String, Result<BoxState, String>, String)>) {
    let attention = rows
        .iter()
        .filter(|(_, state, _)| !matches!(state, Ok(BoxState::InSync)))
        .count();
    println!(
        "ankibox v{} | {} boxes | {} need attention",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        attention,
    );

    if rows.is_empty() {
        println!("No boxes configured.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|(name, state, detail)| match state {
            Ok(state) => StatusTableRow {
                indicator: state_indicator(&state),
                name,
                status: state.label().to_uppercase(),
                detail,
            },
            Err(_) => StatusTableRow {
                indicator: "■".red().bold().to_string(),
                name,
                status: "ERROR".to_string(),
                detail,
            },
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if attention > 0 {
        println!("Run 'ankibox summary' for titles.");
    }
}

fn state_indicator(state: &BoxState) -> String {
    match state {
        BoxState::InSync => "■".green().bold().to_string(),
        BoxState::OutOfSync { .. } => "■".yellow().bold().to_string(),
        BoxState::AddPending { .. } => "■".cyan().bold().to_string(),
        BoxState::DeleteInProgress { .. } => "■".magenta().bold().to_string(),
        BoxState::Malformed { .. } => "■".red().bold().to_string(),
    }
}

fn state_detail(state: &BoxState) -> String {
    match state {
        BoxState::InSync => "up to date".to_string(),
        BoxState::OutOfSync { new, stale } => format!("{new} new, {stale} old"),
        BoxState::AddPending { pending } => {
            format!("{} without ID, run the Obsidian_to_Anki plugin", pending.len())
        }
        BoxState::DeleteInProgress { marked } => {
            format!("{} DELETE markers, run `ankibox remove --resume`", marked.len())
        }
        BoxState::Malformed { entries } => format!("{entries} unusable entries"),
    }
}
