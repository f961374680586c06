//! `aptlier add REPO FILE...`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::{Settings, SourceName};
use aptlier_snapshot::Coordinator;

use super::{prepare, print_update_report};

/// Add package files to a local repo and snapshot it.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Local aptly repo.
    pub repo: String,

    /// Package files or directories.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl AddArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let repo = SourceName::from(self.repo);
        let mut coordinator = Coordinator::from_settings(ctx.aptly(), ctx.settings());

        let report = coordinator
            .add_packages(&repo, &self.files)
            .with_context(|| format!("failed to add packages to '{repo}'"))?;

        print_update_report(&report, &ctx);
        Ok(())
    }
}
