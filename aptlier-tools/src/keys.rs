//! Signing-key sources and how each is imported into the trusted keyring.
//!
//! [`KeySource::classify`] decides once what a user-supplied key string is;
//! [`ImportPlan::for_source`] turns it into a gpg invocation, fetching key
//! material over HTTPS where needed.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{io_err, ToolsError};
use crate::gpg::{keyring_args, Gpg};

const KEYSERVER: &str = "hkp://keyserver.ubuntu.com";

/// A classified key argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `ppa:OWNER/ARCHIVE`: fingerprint looked up on Launchpad.
    Ppa { owner: String, archive: String },
    /// `packagecloud:OWNER/REPO`: armored key served by packagecloud.
    Registry { path: String },
    /// `https://...` key URL.
    Url(String),
    /// Address to search on the keyserver.
    Email(String),
    /// Raw gpg option; the whole argument list is passed through.
    GpgArgs(String),
    /// `[0x]HEX` key id.
    KeyId(String),
    /// Key file path, or `-` for stdin.
    File(PathBuf),
}

impl KeySource {
    /// Classify `key`. Plain `http://` URLs are refused.
    pub fn classify(key: &str) -> Result<Self, ToolsError> {
        if key.trim().is_empty() {
            return Err(ToolsError::InvalidKeySource {
                key: key.to_string(),
            });
        }
        if let Some((owner, archive)) = key.strip_prefix("ppa:").and_then(split_owner_repo) {
            return Ok(KeySource::Ppa {
                owner: owner.to_string(),
                archive: archive.to_string(),
            });
        }
        if let Some(path) = key.strip_prefix("packagecloud:") {
            if split_owner_repo(path).is_some() {
                return Ok(KeySource::Registry {
                    path: path.to_string(),
                });
            }
        }
        if key.starts_with("https://") {
            return Ok(KeySource::Url(key.to_string()));
        }
        if key.starts_with("http://") {
            return Err(ToolsError::InsecureKeyUrl {
                url: key.to_string(),
            });
        }
        if looks_like_email(key) {
            return Ok(KeySource::Email(key.to_string()));
        }
        if key.len() > 1 && key.starts_with('-') {
            return Ok(KeySource::GpgArgs(key.to_string()));
        }
        if is_key_id(key) {
            return Ok(KeySource::KeyId(key.to_string()));
        }
        Ok(KeySource::File(PathBuf::from(key)))
    }

    /// URL the key material (or PPA fingerprint) is fetched from, if any.
    pub fn fetch_url(&self) -> Option<String> {
        match self {
            KeySource::Ppa { owner, archive } => Some(launchpad_fingerprint_url(owner, archive)),
            KeySource::Registry { path } => Some(packagecloud_key_url(path)),
            KeySource::Url(url) => Some(url.clone()),
            _ => None,
        }
    }
}

fn launchpad_fingerprint_url(owner: &str, archive: &str) -> String {
    format!("https://api.launchpad.net/1.0/~{owner}/+archive/{archive}/signing_key_fingerprint")
}

fn packagecloud_key_url(path: &str) -> String {
    format!("https://packagecloud.io/{path}/gpgkey")
}

/// `OWNER/REPO` where both segments are non-empty `[-A-Za-z0-9_]+`.
fn split_owner_repo(s: &str) -> Option<(&str, &str)> {
    let (owner, repo) = s.split_once('/')?;
    let word = |seg: &str| {
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    (word(owner) && word(repo)).then_some((owner, repo))
}

/// Something, `@`, something, `.`, something.
fn looks_like_email(key: &str) -> bool {
    key.char_indices()
        .filter(|&(idx, c)| c == '@' && idx > 0)
        .any(|(idx, _)| {
            let domain = &key[idx + 1..];
            domain
                .char_indices()
                .any(|(j, c)| c == '.' && j > 0 && j + 1 < domain.len())
        })
}

fn is_key_id(key: &str) -> bool {
    let hex = key.strip_prefix("0x").unwrap_or(key);
    !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Source of remote key material.
pub trait KeyFetcher {
    fn fetch(&self, url: &str) -> Result<String, ToolsError>;
}

/// HTTPS fetcher backed by `ureq`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(30))
                .build(),
        }
    }
}

impl KeyFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ToolsError> {
        if !url.starts_with("https://") {
            return Err(ToolsError::InsecureKeyUrl {
                url: url.to_string(),
            });
        }
        tracing::info!("fetching {url}");
        let fetch_err = |message: String| ToolsError::Fetch {
            url: url.to_string(),
            message,
        };
        self.agent
            .get(url)
            .call()
            .map_err(|e| fetch_err(e.to_string()))?
            .into_string()
            .map_err(|e| fetch_err(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// A ready-to-run gpg invocation. Holds any downloaded key file alive until
/// the plan is dropped.
#[derive(Debug)]
pub struct ImportPlan {
    pub args: Vec<OsString>,
    keyfile: Option<NamedTempFile>,
}

impl ImportPlan {
    /// Build the gpg arguments importing `source`; `extra` user arguments go
    /// after the keyring options and before the action.
    pub fn for_source(
        source: &KeySource,
        extra: &[String],
        fetcher: &dyn KeyFetcher,
    ) -> Result<Self, ToolsError> {
        let mut args: Vec<OsString> = keyring_args().into_iter().map(OsString::from).collect();
        let mut keyfile = None;

        match source {
            KeySource::Ppa { owner, archive } => {
                let url = launchpad_fingerprint_url(owner, archive);
                let fingerprint: String = serde_json::from_str(&fetcher.fetch(&url)?)?;
                args.extend(["--keyserver", KEYSERVER].map(OsString::from));
                args.extend(extra.iter().map(OsString::from));
                args.push("--recv-keys".into());
                args.push(fingerprint.into());
            }
            KeySource::Registry { path } => {
                let file = write_keyfile(&fetcher.fetch(&packagecloud_key_url(path))?)?;
                args.extend(extra.iter().map(OsString::from));
                push_import(&mut args, file.path());
                keyfile = Some(file);
            }
            KeySource::Url(url) => {
                let file = write_keyfile(&fetcher.fetch(url)?)?;
                args.extend(extra.iter().map(OsString::from));
                push_import(&mut args, file.path());
                keyfile = Some(file);
            }
            KeySource::Email(addr) => {
                args.extend(extra.iter().map(OsString::from));
                args.extend(["--search-keys", addr.as_str()].map(OsString::from));
            }
            KeySource::GpgArgs(first) => {
                args.push(first.into());
                args.extend(extra.iter().map(OsString::from));
            }
            KeySource::KeyId(id) => {
                args.extend(extra.iter().map(OsString::from));
                args.extend(["--recv-keys", id.as_str()].map(OsString::from));
            }
            KeySource::File(path) => {
                args.extend(extra.iter().map(OsString::from));
                push_import(&mut args, path);
            }
        }

        Ok(Self { args, keyfile })
    }

    /// Path of the downloaded key file, for sources that needed one.
    pub fn keyfile(&self) -> Option<&std::path::Path> {
        self.keyfile.as_ref().map(NamedTempFile::path)
    }

    pub fn run(self, gpg: &Gpg) -> Result<(), ToolsError> {
        gpg.run(&self.args)?;
        Ok(())
    }
}

fn push_import(args: &mut Vec<OsString>, path: &std::path::Path) {
    args.push("--import".into());
    args.push(path.as_os_str().to_owned());
}

fn write_keyfile(armored: &str) -> Result<NamedTempFile, ToolsError> {
    let mut file = tempfile::Builder::new()
        .prefix("aptly-pubkey")
        .suffix(".asc")
        .tempfile()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;
    if let Err(e) = file.write_all(armored.as_bytes()).and_then(|()| file.flush()) {
        return Err(io_err(file.path(), e));
    }
    Ok(file)
}

/// Classify `key` and import it with `gpg`.
pub fn add_key(
    gpg: &Gpg,
    fetcher: &dyn KeyFetcher,
    key: &str,
    extra: &[String],
) -> Result<(), ToolsError> {
    let source = KeySource::classify(key)?;
    tracing::debug!("key {key:?} classified as {source:?}");
    ImportPlan::for_source(&source, extra, fetcher)?.run(gpg)
}
