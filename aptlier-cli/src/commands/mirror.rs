//! `aptlier add-mirror NAME [ARGS...]`

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::Settings;
use aptlier_snapshot::Coordinator;
use aptlier_tools::{HttpFetcher, ImportPlan, MirrorPlan};

use super::{prepare, print_update_report};

/// Create a mirror, fetch it and take its first snapshot.
#[derive(Args, Debug)]
pub struct AddMirrorArgs {
    /// Mirror name, or a `ppa:OWNER/ARCHIVE` / `packagecloud:OWNER/REPO`
    /// shorthand.
    pub name: String,

    /// `aptly mirror create` arguments; for shorthands just an optional
    /// release (`-` for the default).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl AddMirrorArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let plan = MirrorPlan::expand(&self.name, &self.args, ctx.settings())
            .with_context(|| format!("invalid mirror '{}'", self.name))?;

        if let Some(key) = &plan.key {
            let gpg = ctx.gpg().context("cannot import the mirror's signing key")?;
            ImportPlan::for_source(key, &[], &HttpFetcher::default())
                .and_then(|import| import.run(&gpg))
                .with_context(|| format!("failed to import signing key for '{}'", plan.name))?;
        }

        let mut coordinator = Coordinator::from_settings(ctx.aptly(), ctx.settings());
        let report = coordinator
            .add_mirror(&plan.name, &plan.create_args)
            .with_context(|| format!("failed to add mirror '{}'", plan.name))?;

        print_update_report(&report, &ctx);
        Ok(())
    }
}
