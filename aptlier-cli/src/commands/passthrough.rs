//! `aptlier aptly ARGS...` and `aptlier gpg ARGS...`

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::Settings;

use super::prepare;

/// Arguments handed to the tool unchanged.
#[derive(Args, Debug)]
pub struct PassthroughArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl PassthroughArgs {
    /// `aptly -config=<work dir>/aptly.json ARGS...`
    pub fn run_aptly(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        ctx.aptly().run(&self.args).context("aptly failed")?;
        Ok(())
    }

    /// `gpg ARGS...` with the work dir's `GNUPGHOME`.
    pub fn run_gpg(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let gpg = ctx.gpg().context("cannot run gpg")?;
        gpg.run(&self.args).context("gpg failed")?;
        Ok(())
    }
}
