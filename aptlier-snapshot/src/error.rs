//! Error types for aptlier-snapshot.

use thiserror::Error;

use aptlier_core::{StoreError, ToolError};

/// All errors that can arise from snapshot workflows.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The durable snapshot file could not be read or written.
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// A delegated aptly invocation failed.
    #[error("{0}")]
    Tool(#[from] ToolError),
}
