//! `add-mirror` shorthands.
//!
//! `ppa:OWNER/ARCHIVE` and `packagecloud:OWNER/REPO` expand to a full
//! `aptly mirror create` argument list plus the key that signs the archive.
//! Any other name passes its arguments through untouched.

use aptlier_core::{Settings, SourceName};

use crate::error::ToolsError;
use crate::keys::KeySource;

/// What `add-mirror` will do for a given name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPlan {
    pub name: SourceName,
    /// Key to import before creating the mirror.
    pub key: Option<KeySource>,
    /// Arguments following `mirror create <name>`.
    pub create_args: Vec<String>,
}

impl MirrorPlan {
    pub fn expand(name: &str, args: &[String], settings: &Settings) -> Result<Self, ToolsError> {
        let shorthand = if let Some(rest) = name.strip_prefix("ppa:") {
            Some(format!(
                "http://ppa.launchpad.net/{rest}/{}",
                settings.distributor
            ))
        } else {
            name.strip_prefix("packagecloud:")
                .map(|rest| format!("https://packagecloud.io/{rest}/{}", settings.distributor))
        };

        let Some(url) = shorthand else {
            return Ok(Self {
                name: SourceName::from(name),
                key: None,
                create_args: args.to_vec(),
            });
        };

        let release = match args.first().map(String::as_str) {
            None | Some("") | Some("-") => settings.release.clone(),
            Some(release) => release.to_string(),
        };

        let key = match KeySource::classify(name)? {
            key @ (KeySource::Ppa { .. } | KeySource::Registry { .. }) => key,
            _ => {
                return Err(ToolsError::InvalidKeySource {
                    key: name.to_string(),
                })
            }
        };

        Ok(Self {
            name: SourceName::from(name),
            key: Some(key),
            create_args: vec![url, release, "main".to_string()],
        })
    }
}
