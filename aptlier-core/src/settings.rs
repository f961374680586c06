//! Run settings: defaults, optional `aptlier.yaml`, then caller overrides.
//!
//! Every path is resolved against [`Settings::work_dir`], which
//! [`Settings::load_at`] makes absolute once.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::types::PublishTarget;

/// Settings file looked up in the work directory.
pub const SETTINGS_FILE: &str = "aptlier.yaml";

/// How to treat unparseable lines in the durable snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the load, naming the file and line.
    #[default]
    Reject,
    /// Log a warning and ignore the line.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub aptly_command: String,
    /// Explicit gpg binary; when unset `gpg1`, then `gpg`, is looked up on `PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_command: Option<String>,
    pub distributor: String,
    pub release: String,
    pub publish_name: String,
    pub snapshots_file: PathBuf,
    pub verbose: bool,
    pub malformed_records: MalformedPolicy,
    #[serde(skip)]
    pub work_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aptly_command: "aptly".to_string(),
            gpg_command: None,
            distributor: "ubuntu".to_string(),
            release: "xenial".to_string(),
            publish_name: "main".to_string(),
            snapshots_file: PathBuf::from("snapshots"),
            verbose: true,
            malformed_records: MalformedPolicy::Reject,
            work_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings for `work_dir`.
    ///
    /// Reads `<work_dir>/aptlier.yaml` when present; a missing file yields the
    /// defaults. `work_dir` is made absolute.
    pub fn load_at(work_dir: &Path) -> Result<Self, SettingsError> {
        let work_dir = absolute(work_dir).map_err(|source| SettingsError::Io {
            path: work_dir.to_path_buf(),
            source,
        })?;

        let path = work_dir.join(SETTINGS_FILE);
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                Settings::default()
            } else {
                serde_yaml::from_str(&contents)
                    .map_err(|source| SettingsError::Parse { path, source })?
            }
        } else {
            Settings::default()
        };
        settings.work_dir = work_dir;
        Ok(settings)
    }

    /// Resolve `path` relative to the work directory.
    pub fn expand_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(path)
    }

    /// Absolute path of the durable snapshot file.
    pub fn snapshots_path(&self) -> PathBuf {
        self.expand_path(&self.snapshots_file)
    }

    pub fn publish_target(&self) -> PublishTarget {
        PublishTarget {
            release: self.release.clone(),
            publish_name: self.publish_name.clone(),
        }
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
