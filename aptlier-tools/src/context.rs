//! Run-scoped context: resolved paths, child environment and tool handles,
//! built once at the start of a command and passed to whatever needs them.

use aptlier_core::Settings;

use crate::aptly::{default_config, Aptly};
use crate::error::ToolsError;
use crate::gpg::{Gpg, DEFAULT_GPG_CONF};
use crate::paths::{
    aptly_config_path, aptly_root, ensure_config, ensure_dir, gnupg_home, gpg_conf_path,
    GNUPGHOME_VAR,
};
use crate::process::Runner;

#[derive(Debug, Clone)]
pub struct RunContext {
    settings: Settings,
    runner: Runner,
    aptly: Aptly,
}

impl RunContext {
    /// Prepare the work directory (aptly root and config, private gpg home)
    /// and build the child environment.
    pub fn prepare(settings: Settings) -> Result<Self, ToolsError> {
        let work_dir = settings.work_dir.clone();
        ensure_dir(&work_dir, false)?;

        let gnupg = ensure_dir(&gnupg_home(&work_dir), true)?;
        ensure_config(&gpg_conf_path(&work_dir), DEFAULT_GPG_CONF)?;
        let runner = Runner::new(settings.verbose).with_env(GNUPGHOME_VAR, gnupg.as_os_str());

        let root = ensure_dir(&aptly_root(&work_dir), false)?;
        let config = serde_json::to_string_pretty(&default_config(&root, &settings.distributor))?;
        let config_path = ensure_config(&aptly_config_path(&work_dir), &(config + "\n"))?;
        let aptly = Aptly::new(&settings.aptly_command, config_path, runner.clone());

        Ok(Self {
            settings,
            runner,
            aptly,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn aptly(&self) -> &Aptly {
        &self.aptly
    }

    /// Resolve the gpg binary. Only commands that touch keys need one.
    pub fn gpg(&self) -> Result<Gpg, ToolsError> {
        Gpg::resolve(self.settings.gpg_command.as_deref(), self.runner.clone())
    }
}
