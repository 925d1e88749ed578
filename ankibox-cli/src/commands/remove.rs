//! `ankibox remove`: retire mirror entries whose source note is gone.

use anyhow::{Context, Result};
use clap::Args;

use ankibox_sync::{pipeline, Action, BoxReport, PromptBarrier, RemoveOutcome};

use super::{box_filter, finish, load_config, print_box_error, print_divider, print_preview};
use crate::Globals;

/// Arguments for `ankibox remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Show the mirror diff without writing or prompting.
    #[arg(long)]
    pub dry_run: bool,

    /// Finish a remove interrupted after the DELETE markers were written.
    #[arg(long)]
    pub resume: bool,

    /// Only this box.
    #[arg(long = "box", value_name = "NAME")]
    pub box_name: Option<String>,
}

impl RemoveArgs {
    pub fn run(self, globals: &Globals) -> Result<()> {
        let config = load_config(globals)?;
        let only = box_filter(self.box_name.as_deref());
        let action = match (self.resume, self.dry_run) {
            (false, false) => Action::Remove,
            (false, true) => Action::PreviewRemove,
            (true, false) => Action::ResumeRemove,
            (true, true) => Action::PreviewResume,
        };

        let mut barrier = PromptBarrier::stdio();
        let runs =
            pipeline::run(&config, action, only.as_ref(), &mut barrier).context("remove failed")?;

        for run in &runs {
            print_divider(&run.name);
            match &run.result {
                Ok(BoxReport::Preview(diff)) => print_preview(&run.name, diff),
                Ok(BoxReport::Removed(RemoveOutcome::NothingToRemove)) => {
                    if self.resume {
                        println!("no DELETE markers found.");
                    } else {
                        println!("no old notes to delete.");
                    }
                    println!("no action taken.");
                }
                Ok(BoxReport::Removed(RemoveOutcome::Removed { titles })) => {
                    println!("removed {} old notes.", titles.len());
                    println!("delete operation completed.");
                }
                Ok(_) => {}
                Err(e) => print_box_error(&run.name, e),
            }
        }
        finish(&runs)
    }
}
