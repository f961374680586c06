//! `aptlier init`

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::Settings;

use super::prepare;

/// Prepare the work directory, show the trusted keyring and clean up the
/// aptly database.
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;

        let gpg = ctx.gpg().context("cannot list trusted keys")?;
        gpg.run(["--no-default-keyring", "--fingerprint"])
            .context("failed to list trusted keys")?;
        ctx.aptly()
            .run(["db", "cleanup"])
            .context("aptly database cleanup failed")?;

        println!("✓ Initialized '{}'", ctx.settings().work_dir.display());
        Ok(())
    }
}
