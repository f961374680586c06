//! Publishing the merged snapshot.
//!
//! A publish target is either unpublished (first publish) or published
//! (atomic switch to the new merged snapshot). aptly's publish listing is
//! the only source of truth for which state applies.

use serde::Serialize;

use aptlier_core::{PublishTarget, RepoTool, SnapshotId, ToolError};

use crate::coordinator::Coordinator;
use crate::error::SnapshotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Unpublished,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAction {
    /// `publish snapshot` to an unpublished target.
    Published,
    /// `publish switch` of an already published target.
    Switched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub snapshot: SnapshotId,
    pub target: PublishTarget,
    pub action: PublishAction,
}

/// Whether a `publish list -raw` line set contains `publish_name`, either
/// as a whole line or as its first field.
pub fn is_published(lines: &[String], publish_name: &str) -> bool {
    lines.iter().any(|line| {
        let line = line.trim();
        line == publish_name || line.split_whitespace().next() == Some(publish_name)
    })
}

pub fn publish_state<T: RepoTool + ?Sized>(
    tool: &T,
    target: &PublishTarget,
) -> Result<PublishState, ToolError> {
    let lines = tool.published()?;
    Ok(if is_published(&lines, &target.publish_name) {
        PublishState::Published
    } else {
        PublishState::Unpublished
    })
}

/// Merge every effective snapshot and publish the result, switching the
/// target over if it is already published.
pub fn publish<T: RepoTool + ?Sized>(
    coordinator: &mut Coordinator<'_, T>,
) -> Result<PublishOutcome, SnapshotError> {
    let snapshot = coordinator.merge_all()?;
    let tool = coordinator.tool();
    let target = coordinator.target().clone();

    let action = match publish_state(tool, &target)? {
        PublishState::Unpublished => {
            tracing::info!("publishing {snapshot} as {}", target.publish_name);
            tool.publish_snapshot(&target, &snapshot)?;
            PublishAction::Published
        }
        PublishState::Published => {
            tracing::info!("switching {} to {snapshot}", target.publish_name);
            tool.switch_published(&target, &snapshot)?;
            PublishAction::Switched
        }
    };

    Ok(PublishOutcome {
        snapshot,
        target,
        action,
    })
}
