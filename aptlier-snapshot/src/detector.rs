//! Change detection for a freshly taken snapshot.
//!
//! Protocol for one source:
//!
//! 1. Take the new snapshot from the current mirror / repo state.
//! 2. No previous snapshot → keep it (first time is always a change).
//! 3. Otherwise diff old against new; the identical-snapshots report means
//!    the new one is redundant and is dropped again.

use serde::Serialize;

use aptlier_core::{RepoTool, SnapshotId, SourceKind, SourceName, ToolError, IDENTICAL_SNAPSHOTS};

/// Outcome of updating one source's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SnapshotUpdate {
    /// No earlier snapshot was known; the new one is kept.
    First { snapshot: SnapshotId },
    /// Content differs from the previous snapshot; the new one is kept.
    Changed { snapshot: SnapshotId, diff: String },
    /// Content is identical; the new snapshot was dropped.
    Unchanged { dropped: SnapshotId },
    /// The recorded snapshot already carries this run's timestamp.
    Current { snapshot: SnapshotId },
}

impl SnapshotUpdate {
    /// Whether the source gets a pending pointer.
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::First { .. } | Self::Changed { .. })
    }

    /// The kept snapshot, if this update produced one.
    pub fn snapshot(&self) -> Option<&SnapshotId> {
        match self {
            Self::First { snapshot } | Self::Changed { snapshot, .. } => Some(snapshot),
            Self::Unchanged { .. } | Self::Current { .. } => None,
        }
    }

    pub fn diff(&self) -> Option<&str> {
        match self {
            Self::Changed { diff, .. } => Some(diff),
            _ => None,
        }
    }
}

/// Take snapshot `new` of `name` and decide whether to keep it.
///
/// When `previous` is already `new` (a second update within the same
/// minute), aptly would reject the duplicate name, so nothing is created
/// and [`SnapshotUpdate::Current`] is returned without touching aptly.
///
/// Any failing aptly call aborts the update for this source.
pub fn detect_change<T: RepoTool + ?Sized>(
    tool: &T,
    name: &SourceName,
    kind: SourceKind,
    new: &SnapshotId,
    previous: Option<&SnapshotId>,
) -> Result<SnapshotUpdate, ToolError> {
    // aptly refuses duplicate snapshot names, and dropping here would delete
    // the recorded snapshot itself.
    if previous == Some(new) {
        tracing::info!("{name} already snapshotted as {new}");
        return Ok(SnapshotUpdate::Current {
            snapshot: new.clone(),
        });
    }

    tool.create_snapshot(new, kind, name)?;

    let Some(previous) = previous else {
        return Ok(SnapshotUpdate::First {
            snapshot: new.clone(),
        });
    };

    let diff = tool.diff_snapshots(previous, new)?;
    if diff == IDENTICAL_SNAPSHOTS {
        tracing::info!("no changes in {name}, undoing snapshot {new}");
        tool.drop_snapshot(new)?;
        return Ok(SnapshotUpdate::Unchanged {
            dropped: new.clone(),
        });
    }

    Ok(SnapshotUpdate::Changed {
        snapshot: new.clone(),
        diff,
    })
}
