//! `aptlier update [NAME...]`

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::Settings;
use aptlier_snapshot::{Coordinator, UpdateScope};

use super::{prepare, print_saved, print_source_update};

/// Fetch mirrors and snapshot the ones that changed.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Mirrors to update (default: every mirror with a recorded snapshot).
    pub names: Vec<String>,
}

impl UpdateArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let mut coordinator = Coordinator::from_settings(ctx.aptly(), ctx.settings());

        // Diffs are shown as each mirror finishes, not after the whole run.
        let report = coordinator
            .update_selected_with(UpdateScope::from_names(self.names), print_source_update)
            .context("mirror update failed")?;

        if report.updates.is_empty() {
            println!("No managed mirrors. Add one with 'aptlier add-mirror'.");
            return Ok(());
        }
        print_saved(report.saved, &ctx);
        Ok(())
    }
}
