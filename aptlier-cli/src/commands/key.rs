//! `aptlier add-key KEY [GPG ARGS...]`

use anyhow::{Context, Result};
use clap::Args;

use aptlier_core::Settings;
use aptlier_tools::{add_key, HttpFetcher};

use super::prepare;

/// Import a signing key into the trusted keyring.
#[derive(Args, Debug)]
pub struct AddKeyArgs {
    /// `ppa:OWNER/ARCHIVE`, `packagecloud:OWNER/REPO`, an https URL, an email
    /// address, a key id, a key file (`-` for stdin) or raw gpg options.
    #[arg(allow_hyphen_values = true)]
    pub key: String,

    /// Extra gpg arguments, passed before the import action.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub gpg_args: Vec<String>,
}

impl AddKeyArgs {
    pub fn run(self, settings: Settings) -> Result<()> {
        let ctx = prepare(settings)?;
        let gpg = ctx.gpg().context("cannot import keys")?;

        add_key(&gpg, &HttpFetcher::default(), &self.key, &self.gpg_args)
            .with_context(|| format!("failed to add key '{}'", self.key))?;

        println!("✓ Imported key '{}'", self.key);
        Ok(())
    }
}
