//! Domain types for snapshot tracking.
//!
//! Snapshot identifiers handed to aptly are always built from these types;
//! never format `name@timestamp` strings by hand elsewhere.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between a source name and its timestamp in snapshot ids and
/// durable records.
pub const SNAPSHOT_SEPARATOR: char = '@';

/// `strftime` layout of [`Timestamp`] tokens (UTC, minute resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a mirror or local repo as known to aptly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceName(pub String);

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Sortable per-run timestamp token, e.g. `20240131.0942`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub String);

impl Timestamp {
    /// Format `at` as a snapshot timestamp token.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Timestamp {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of an aptly snapshot (`name@timestamp`, or
/// `publish:name@timestamp` for merged snapshots).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Snapshot id for `name` taken at `timestamp`.
    pub fn new(name: &SourceName, timestamp: &Timestamp) -> Self {
        Self(format!("{name}{SNAPSHOT_SEPARATOR}{timestamp}"))
    }

    /// Id of the merged snapshot published under `publish_name`.
    pub fn merged(publish_name: &str, timestamp: &Timestamp) -> Self {
        Self(format!("publish:{publish_name}{SNAPSHOT_SEPARATOR}{timestamp}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What an aptly snapshot is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Mirror,
    Repo,
}

impl SourceKind {
    /// Keyword aptly expects in `snapshot create ... from <kind>` and
    /// `<kind> list`.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Mirror => "mirror",
            SourceKind::Repo => "repo",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Latest known snapshot of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPointer {
    pub name: SourceName,
    pub timestamp: Timestamp,
}

impl SnapshotPointer {
    pub fn new(name: impl Into<SourceName>, timestamp: impl Into<Timestamp>) -> Self {
        Self {
            name: name.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn id(&self) -> SnapshotId {
        SnapshotId::new(&self.name, &self.timestamp)
    }
}

/// Mapping of source name to its latest snapshot timestamp.
///
/// Used both for the durable (loaded) layer and the in-run (pending) layer;
/// [`SnapshotSet::overlay`] composes the two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSet(BTreeMap<SourceName, Timestamp>);

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &SourceName) -> Option<&Timestamp> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &SourceName) -> bool {
        self.0.contains_key(name)
    }

    /// Snapshot id of the pointer recorded for `name`, if any.
    pub fn snapshot_id(&self, name: &SourceName) -> Option<SnapshotId> {
        self.0.get(name).map(|ts| SnapshotId::new(name, ts))
    }

    /// Record `timestamp` for `name`, replacing any previous entry.
    pub fn insert(&mut self, name: SourceName, timestamp: Timestamp) {
        self.0.insert(name, timestamp);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceName, &Timestamp)> {
        self.0.iter()
    }

    pub fn pointers(&self) -> impl Iterator<Item = SnapshotPointer> + '_ {
        self.0
            .iter()
            .map(|(name, ts)| SnapshotPointer::new(name.clone(), ts.clone()))
    }

    /// `self` with every entry of `pending` laid over it; `pending` wins.
    pub fn overlay(&self, pending: &SnapshotSet) -> SnapshotSet {
        let mut merged = self.0.clone();
        merged.extend(pending.0.iter().map(|(n, t)| (n.clone(), t.clone())));
        SnapshotSet(merged)
    }

    /// Snapshot ids of every entry, sorted by the full `name@timestamp` string.
    pub fn sorted_ids(&self) -> Vec<SnapshotId> {
        let mut ids: Vec<SnapshotId> = self.pointers().map(|p| p.id()).collect();
        ids.sort();
        ids
    }
}

impl FromIterator<SnapshotPointer> for SnapshotSet {
    fn from_iter<I: IntoIterator<Item = SnapshotPointer>>(iter: I) -> Self {
        Self(iter.into_iter().map(|p| (p.name, p.timestamp)).collect())
    }
}

/// Publish endpoint: at most one merged snapshot is live per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishTarget {
    /// Distribution / release the snapshot is published as.
    pub release: String,
    /// Publish prefix name.
    pub publish_name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
