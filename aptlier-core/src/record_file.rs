//! Atomic text-record file.
//!
//! A flat UTF-8 file of `key@value` lines, one record per line, written sorted
//! so the output is deterministic and diff-friendly.
//!
//! # Commit protocol
//!
//! 1. Write the full new content to `<file>.tmp` (same directory).
//! 2. Remove `<file>~` if it exists.
//! 3. Hard-link the live `<file>` to `<file>~` if the live file exists.
//! 4. Rename `<file>.tmp` onto `<file>`.
//!
//! The live file is only ever replaced by rename, so readers see either the
//! previous or the new content. A crash before step 4 leaves the previous
//! content live; after step 4 the immediately prior version stays reachable
//! at `<file>~`.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{store_io_err, StoreError};
use crate::settings::MalformedPolicy;
use crate::types::SNAPSHOT_SEPARATOR;

/// A durable `key@value` record file with crash-safe replace-on-write.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Live file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file>.tmp`
    pub fn tmp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".tmp")
    }

    /// `<file>~`
    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "~")
    }

    /// Read every record into a map keyed by the text before the first `@`.
    ///
    /// A missing file yields an empty map. Blank lines are ignored; other
    /// unparseable lines are handled per `policy`. A later duplicate key
    /// replaces an earlier one.
    pub fn load(&self, policy: MalformedPolicy) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(store_io_err(&self.path, e)),
        };

        let mut records = BTreeMap::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match parse_record(line) {
                Some((key, value)) => {
                    records.insert(key.to_string(), value.to_string());
                }
                None => match policy {
                    MalformedPolicy::Reject => {
                        return Err(StoreError::Malformed {
                            path: self.path.clone(),
                            line: idx + 1,
                            content: raw.to_string(),
                        });
                    }
                    MalformedPolicy::Skip => {
                        tracing::warn!(
                            "skipping malformed record at {}:{}: {raw:?}",
                            self.path.display(),
                            idx + 1
                        );
                    }
                },
            }
        }
        Ok(records)
    }

    /// Replace the file with `records`, using the commit protocol above.
    pub fn replace(&self, records: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = render_records(records);
        self.stage(&contents)?;
        self.rotate_backup()?;
        self.promote()
    }

    /// Step 1: write the new content to the temp file.
    pub(crate) fn stage(&self, contents: &str) -> Result<(), StoreError> {
        let tmp = self.tmp_path();
        std::fs::write(&tmp, contents).map_err(|e| store_io_err(&tmp, e))
    }

    /// Steps 2 and 3: drop the stale backup, link the live file as the new one.
    pub(crate) fn rotate_backup(&self) -> Result<(), StoreError> {
        let backup = self.backup_path();
        match std::fs::remove_file(&backup) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(store_io_err(&backup, e)),
        }
        if self.path.exists() {
            std::fs::hard_link(&self.path, &backup).map_err(|e| store_io_err(&backup, e))?;
        }
        Ok(())
    }

    /// Step 4: atomically move the temp file onto the live path.
    pub(crate) fn promote(&self) -> Result<(), StoreError> {
        let tmp = self.tmp_path();
        std::fs::rename(&tmp, &self.path).map_err(|e| store_io_err(&self.path, e))
    }
}

/// Split a record at the first separator; both halves must be non-empty.
fn parse_record(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(SNAPSHOT_SEPARATOR)?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// One `key@value\n` line per record, sorted by the full line.
fn render_records(records: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = records
        .iter()
        .map(|(key, value)| format!("{key}{SNAPSHOT_SEPARATOR}{value}\n"))
        .collect();
    lines.sort();
    lines.concat()
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
