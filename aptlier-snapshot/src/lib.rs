//! # aptlier-snapshot
//!
//! Snapshot workflows on top of a [`aptlier_core::RepoTool`]: change
//! detection for a fresh snapshot, the per-run coordinator that owns pending
//! pointers and timestamps, and merge-and-publish.

pub mod clock;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod publisher;
pub mod registry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{Coordinator, SourceUpdate, UpdateReport, UpdateScope};
pub use detector::{detect_change, SnapshotUpdate};
pub use error::SnapshotError;
pub use publisher::{is_published, publish, PublishAction, PublishOutcome, PublishState};
pub use registry::{SourceEntry, SourceListing};
