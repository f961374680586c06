//! The repository tool seam.
//!
//! Snapshot workflows only ever talk to aptly through [`RepoTool`]; the
//! subprocess implementation lives in `aptlier-tools`.

use std::path::PathBuf;

use crate::error::ToolError;
use crate::types::{PublishTarget, SnapshotId, SourceKind, SourceName};

/// Exact `snapshot diff` output meaning "no differences".
pub const IDENTICAL_SNAPSHOTS: &str = "Snapshots are identical.\n";

pub trait RepoTool {
    /// `mirror create <name> <args...>`
    fn create_mirror(&self, name: &SourceName, args: &[String]) -> Result<(), ToolError>;

    /// `mirror update <name>`
    fn update_mirror(&self, name: &SourceName) -> Result<(), ToolError>;

    /// `repo add <repo> <files...>`
    fn add_packages(&self, repo: &SourceName, files: &[PathBuf]) -> Result<(), ToolError>;

    /// `<kind> list -raw`, one name per line.
    fn list_sources(&self, kind: SourceKind) -> Result<Vec<SourceName>, ToolError>;

    /// `snapshot create <id> from <kind> <name>`
    fn create_snapshot(
        &self,
        id: &SnapshotId,
        kind: SourceKind,
        name: &SourceName,
    ) -> Result<(), ToolError>;

    /// `snapshot diff <old> <new>`, returning the textual report.
    fn diff_snapshots(&self, old: &SnapshotId, new: &SnapshotId) -> Result<String, ToolError>;

    /// `snapshot drop <id>`
    fn drop_snapshot(&self, id: &SnapshotId) -> Result<(), ToolError>;

    /// `snapshot merge <id> <sources...>`
    fn merge_snapshots(&self, id: &SnapshotId, sources: &[SnapshotId]) -> Result<(), ToolError>;

    /// `publish list -raw`, one trimmed line per published endpoint.
    fn published(&self) -> Result<Vec<String>, ToolError>;

    /// `publish snapshot -distribution=<release> <id> <publish name>`
    fn publish_snapshot(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError>;

    /// `publish switch <release> <publish name> <id>`
    fn switch_published(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError>;
}
