//! `aptlier list [--json]`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use aptlier_core::Settings;
use aptlier_snapshot::{Coordinator, SourceEntry, SourceListing};

use super::prepare;

/// List mirrors and repos with their recorded snapshots.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "snapshot")]
    snapshot: String,
}

impl From<&SourceEntry> for SourceRow {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            kind: entry.kind.to_string(),
            name: entry.name.to_string(),
            snapshot: entry
                .snapshot
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl ListArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let mut coordinator = Coordinator::from_settings(ctx.aptly(), ctx.settings());
        let listing = coordinator
            .listing()
            .context("failed to list mirrors and repos")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&listing).context("failed to serialize listing")?
            );
            return Ok(());
        }

        print_table(&listing);
        Ok(())
    }
}

fn print_table(listing: &SourceListing) {
    if listing.iter().next().is_none() {
        println!("No mirrors or repos.");
        return;
    }

    let rows: Vec<SourceRow> = listing.iter().map(SourceRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let unmanaged = listing.mirrors.iter().filter(|m| !m.is_managed()).count();
    if unmanaged > 0 {
        println!(
            "{} {unmanaged} mirror(s) without a snapshot are skipped by 'aptlier update'.",
            "!".yellow().bold()
        );
    }
}
