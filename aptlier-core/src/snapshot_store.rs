//! Snapshot Store: durable `source name -> timestamp` pointers.
//!
//! The loaded set is read at most once per run and cached; [`SnapshotStore::save`]
//! writes at most once, and only when there is something pending.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::StoreError;
use crate::record_file::RecordFile;
use crate::settings::{MalformedPolicy, Settings};
use crate::types::{SnapshotPointer, SnapshotSet};

#[derive(Debug)]
pub struct SnapshotStore {
    file: RecordFile,
    policy: MalformedPolicy,
    loaded: Option<SnapshotSet>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<std::path::PathBuf>, policy: MalformedPolicy) -> Self {
        Self {
            file: RecordFile::new(path),
            policy,
            loaded: None,
        }
    }

    /// Store at the snapshot file configured in `settings`.
    pub fn open(settings: &Settings) -> Self {
        Self::new(settings.snapshots_path(), settings.malformed_records)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The durable set, read from disk on first call and cached afterwards.
    pub fn load(&mut self) -> Result<&SnapshotSet, StoreError> {
        if self.loaded.is_none() {
            let records = self.file.load(self.policy)?;
            let set: SnapshotSet = records
                .into_iter()
                .map(|(name, ts)| SnapshotPointer::new(name, ts))
                .collect();
            self.loaded = Some(set);
        }
        Ok(self.loaded.get_or_insert_with(SnapshotSet::new))
    }

    /// Persist `loaded` overlaid with `pending`.
    ///
    /// Returns `false` without touching the filesystem when `pending` is
    /// empty. After a successful write the cache is dropped so the next
    /// [`load`](Self::load) re-reads the file.
    pub fn save(&mut self, pending: &SnapshotSet) -> Result<bool, StoreError> {
        if pending.is_empty() {
            tracing::info!("snapshots not modified, not saving");
            return Ok(false);
        }

        let merged = self.load()?.overlay(pending);
        let changed: Vec<String> = pending.sorted_ids().into_iter().map(|id| id.0).collect();
        tracing::info!(
            "saving snapshots {}, changed: {}",
            self.file.path().display(),
            changed.join(", ")
        );

        let records: BTreeMap<String, String> = merged
            .iter()
            .map(|(name, ts)| (name.0.clone(), ts.0.clone()))
            .collect();
        self.file.replace(&records)?;
        self.reset();
        Ok(true)
    }

    /// Forget the cached durable set.
    pub fn reset(&mut self) {
        tracing::debug!("snapshot cache reset");
        self.loaded = None;
    }
}
