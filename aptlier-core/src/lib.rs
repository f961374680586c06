//! aptlier core library: domain types, settings, durable snapshot state.
//!
//! - [`types`]: newtypes and the [`SnapshotSet`] two-layer model
//! - [`settings`]: [`Settings`] with `aptlier.yaml` overrides
//! - [`record_file`]: crash-safe `key@value` record file
//! - [`snapshot_store`]: [`SnapshotStore`], cached load / atomic save
//! - [`tool`]: the [`RepoTool`] seam to aptly
//! - [`error`]: error enums

pub mod error;
pub mod record_file;
pub mod settings;
pub mod snapshot_store;
pub mod tool;
pub mod types;

pub use error::{SettingsError, StoreError, ToolError};
pub use settings::{MalformedPolicy, Settings};
pub use snapshot_store::SnapshotStore;
pub use tool::{RepoTool, IDENTICAL_SNAPSHOTS};
pub use types::{
    PublishTarget, SnapshotId, SnapshotPointer, SnapshotSet, SourceKind, SourceName, Timestamp,
};
