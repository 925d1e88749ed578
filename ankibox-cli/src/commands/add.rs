//! `ankibox add`: propose new source notes for card creation.

use anyhow::{Context, Result};
use clap::Args;

use ankibox_sync::{pipeline, Action, AddOutcome, BoxReport, PromptBarrier};

use super::{box_filter, finish, load_config, print_box_error, print_divider, print_preview};
use crate::Globals;

/// Arguments for `ankibox add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Show the mirror diff without writing or prompting.
    #[arg(long)]
    pub dry_run: bool,

    /// Only this box.
    #[arg(long = "box", value_name = "NAME")]
    pub box_name: Option<String>,
}

impl AddArgs {
    pub fn run(self, globals: &Globals) -> Result<()> {
        let config = load_config(globals)?;
        let only = box_filter(self.box_name.as_deref());
        let action = if self.dry_run {
            Action::PreviewAdd
        } else {
            Action::Add
        };

        let mut barrier = PromptBarrier::stdio();
        let runs =
            pipeline::run(&config, action, only.as_ref(), &mut barrier).context("add failed")?;

        for run in &runs {
            print_divider(&run.name);
            match &run.result {
                Ok(BoxReport::Preview(diff)) => print_preview(&run.name, diff),
                Ok(BoxReport::Added(AddOutcome::NothingToAdd)) => {
                    println!("no new notes to add.");
                    println!("no action taken.");
                }
                Ok(BoxReport::Added(AddOutcome::Added { titles })) => {
                    println!("added {} new notes.", titles.len());
                    println!("add operation completed.");
                }
                Ok(_) => {}
                Err(e) => print_box_error(&run.name, e),
            }
        }
        finish(&runs)
    }
}
