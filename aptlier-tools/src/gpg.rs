//! gpg adapter. Keys are kept in `trustedkeys.gpg` under the work dir's
//! private `GNUPGHOME`, which is where aptly looks for them.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use aptlier_core::ToolError;

use crate::error::ToolsError;
use crate::paths::TRUSTED_KEYRING;
use crate::process::Runner;

/// Default `gpg.conf` written into a fresh `GNUPGHOME`.
pub const DEFAULT_GPG_CONF: &str = "\
keyring trustedkeys.gpg
keyid-format long
list-options show-keyring
with-fingerprint
always-trust
";

/// Leading arguments of every key operation.
pub fn keyring_args() -> [&'static str; 3] {
    ["--no-default-keyring", "--keyring", TRUSTED_KEYRING]
}

#[derive(Debug, Clone)]
pub struct Gpg {
    command: PathBuf,
    runner: Runner,
}

impl Gpg {
    pub fn new(command: impl Into<PathBuf>, runner: Runner) -> Self {
        Self {
            command: command.into(),
            runner,
        }
    }

    /// Use `explicit` when given, otherwise the first of `gpg1`, `gpg` on `PATH`.
    pub fn resolve(explicit: Option<&str>, runner: Runner) -> Result<Self, ToolsError> {
        if let Some(command) = explicit {
            return Ok(Self::new(command, runner));
        }
        let command = which::which("gpg1")
            .or_else(|_| which::which("gpg"))
            .map_err(|_| ToolsError::GpgNotFound)?;
        Ok(Self::new(command, runner))
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn run<I, S>(&self, args: I) -> Result<(), ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.run(&self.command, args)
    }
}
