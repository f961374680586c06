pub mod add;
pub mod init;
pub mod key;
pub mod list;
pub mod mirror;
pub mod passthrough;
pub mod publish;
pub mod update;

use anyhow::{Context, Result};
use colored::Colorize;

use aptlier_core::Settings;
use aptlier_snapshot::{SnapshotUpdate, SourceUpdate, UpdateReport};
use aptlier_tools::RunContext;

/// Prepare the work directory and child environment for a command.
pub(crate) fn prepare(settings: Settings) -> Result<RunContext> {
    let work_dir = settings.work_dir.clone();
    RunContext::prepare(settings)
        .with_context(|| format!("failed to prepare work dir '{}'", work_dir.display()))
}

/// Print one source's outcome, its diff first.
pub(crate) fn print_source_update(entry: &SourceUpdate) {
    let name = &entry.name;
    match &entry.update {
        SnapshotUpdate::First { snapshot } => {
            println!("{} {name}: first snapshot {snapshot}", "✓".green().bold());
        }
        SnapshotUpdate::Changed { snapshot, diff } => {
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
            println!("{} {name}: new snapshot {snapshot}", "✓".green().bold());
        }
        SnapshotUpdate::Unchanged { .. } => {
            println!("{} {name}: unchanged", "·".bright_black());
        }
        SnapshotUpdate::Current { snapshot } => {
            println!("{} {name}: already at {snapshot}", "·".bright_black());
        }
    }
}

/// Print whether the snapshot file was written.
pub(crate) fn print_saved(saved: bool, ctx: &RunContext) {
    if saved {
        println!("  Saved to: {}", ctx.settings().snapshots_path().display());
    } else {
        println!("  Snapshots not modified.");
    }
}

/// Print per-source outcomes and whether the snapshot file was written.
pub(crate) fn print_update_report(report: &UpdateReport, ctx: &RunContext) {
    report.updates.iter().for_each(print_source_update);
    print_saved(report.saved, ctx);
}
