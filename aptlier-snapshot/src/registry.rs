//! Source listing: what aptly knows about, joined with what the snapshot
//! file records.

use serde::Serialize;

use aptlier_core::{RepoTool, SnapshotSet, SourceKind, SourceName, Timestamp, ToolError};

/// One mirror or repo and its recorded snapshot, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub name: SourceName,
    pub kind: SourceKind,
    pub snapshot: Option<Timestamp>,
}

impl SourceEntry {
    /// Whether bulk updates pick this source up by default.
    pub fn is_managed(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceListing {
    pub mirrors: Vec<SourceEntry>,
    pub repos: Vec<SourceEntry>,
}

impl SourceListing {
    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.mirrors.iter().chain(self.repos.iter())
    }
}

/// Every mirror and repo aptly reports, sorted by name, with the snapshot
/// timestamps recorded in `loaded`.
pub fn list_sources<T: RepoTool + ?Sized>(
    tool: &T,
    loaded: &SnapshotSet,
) -> Result<SourceListing, ToolError> {
    Ok(SourceListing {
        mirrors: entries(tool, SourceKind::Mirror, loaded)?,
        repos: entries(tool, SourceKind::Repo, loaded)?,
    })
}

/// Mirrors that already have a recorded snapshot, sorted by name.
///
/// Mirrors created outside aptlier stay out of bulk updates until they are
/// snapshotted once explicitly.
pub fn managed_mirrors<T: RepoTool + ?Sized>(
    tool: &T,
    loaded: &SnapshotSet,
) -> Result<Vec<SourceName>, ToolError> {
    Ok(entries(tool, SourceKind::Mirror, loaded)?
        .into_iter()
        .filter(SourceEntry::is_managed)
        .map(|entry| entry.name)
        .collect())
}

fn entries<T: RepoTool + ?Sized>(
    tool: &T,
    kind: SourceKind,
    loaded: &SnapshotSet,
) -> Result<Vec<SourceEntry>, ToolError> {
    let mut names = tool.list_sources(kind)?;
    names.sort();
    names.dedup();
    Ok(names
        .into_iter()
        .map(|name| SourceEntry {
            snapshot: loaded.get(&name).cloned(),
            name,
            kind,
        })
        .collect())
}
