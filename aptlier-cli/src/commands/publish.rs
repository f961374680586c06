//! `aptlier publish`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use aptlier_core::Settings;
use aptlier_snapshot::{publish, Coordinator, PublishAction};

use super::prepare;

/// Merge the latest snapshot of every source and publish it.
#[derive(Args, Debug)]
pub struct PublishArgs {}

impl PublishArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let mut coordinator = Coordinator::from_settings(ctx.aptly(), ctx.settings());

        let outcome = publish(&mut coordinator).context("publish failed")?;

        let target = &outcome.target;
        match outcome.action {
            PublishAction::Published => println!(
                "{} Published {} as '{}' ({})",
                "✓".green().bold(),
                outcome.snapshot,
                target.publish_name,
                target.release
            ),
            PublishAction::Switched => println!(
                "{} Switched '{}' ({}) to {}",
                "✓".green().bold(),
                target.publish_name,
                target.release,
                outcome.snapshot
            ),
        }
        Ok(())
    }
}
