//! # aptlier-tools
//!
//! Subprocess plumbing for aptly and gpg: the child-environment runner, the
//! [`Aptly`] implementation of [`aptlier_core::RepoTool`], key import and
//! mirror shorthands, and the per-run [`RunContext`].

pub mod aptly;
pub mod context;
pub mod error;
pub mod gpg;
pub mod keys;
pub mod mirrors;
pub mod paths;
pub mod process;

pub use aptly::Aptly;
pub use context::RunContext;
pub use error::ToolsError;
pub use gpg::Gpg;
pub use keys::{add_key, HttpFetcher, ImportPlan, KeyFetcher, KeySource};
pub use mirrors::MirrorPlan;
pub use process::Runner;
