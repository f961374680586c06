//! aptly adapter: the subprocess implementation of [`RepoTool`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde_json::json;

use aptlier_core::{PublishTarget, RepoTool, SnapshotId, SourceKind, SourceName, ToolError};

use crate::process::Runner;

/// Default `aptly.json` for a work directory rooted at `root_dir`.
pub fn default_config(root_dir: &Path, distributor: &str) -> serde_json::Value {
    json!({
        "rootDir": root_dir.display().to_string(),
        "downloadConcurrency": 4,
        "downloadSpeedLimit": 0,
        "architectures": [],
        "dependencyFollowSuggests": false,
        "dependencyFollowRecommends": false,
        "dependencyFollowAllVariants": false,
        "dependencyFollowSource": false,
        "dependencyVerboseResolve": false,
        "gpgDisableSign": false,
        "gpgDisableVerify": false,
        "gpgProvider": "internal",
        "downloadSourcePackages": false,
        "skipLegacyPool": true,
        "ppaDistributorID": distributor,
        "ppaCodename": "",
        "skipContentsPublishing": false,
        "FileSystemPublishEndpoints": {},
        "S3PublishEndpoints": {},
        "SwiftPublishEndpoints": {}
    })
}

/// `aptly` invoked with `-config=<work_dir>/aptly.json`.
#[derive(Debug, Clone)]
pub struct Aptly {
    command: OsString,
    config: PathBuf,
    runner: Runner,
}

impl Aptly {
    pub fn new(command: impl Into<OsString>, config: impl Into<PathBuf>, runner: Runner) -> Self {
        Self {
            command: command.into(),
            config: config.into(),
            runner,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config
    }

    /// Full argument vector (after the program) for `args`.
    pub fn cmdline<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut config_flag = OsString::from("-config=");
        config_flag.push(&self.config);
        std::iter::once(config_flag)
            .chain(args.into_iter().map(|a| a.as_ref().to_owned()))
            .collect()
    }

    /// Run `aptly <args>` with output streamed to the terminal.
    pub fn run<I, S>(&self, args: I) -> Result<(), ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.run(&self.command, self.cmdline(args))
    }

    /// Run `aptly <args>` and return its stdout.
    pub fn capture<I, S>(&self, args: I) -> Result<String, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.capture(&self.command, self.cmdline(args))
    }

    /// Captured stdout split into trimmed, non-empty lines.
    pub fn lines<I, S>(&self, args: I) -> Result<Vec<String>, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Ok(self
            .capture(args)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl RepoTool for Aptly {
    fn create_mirror(&self, name: &SourceName, args: &[String]) -> Result<(), ToolError> {
        let mut argv = vec!["mirror".to_string(), "create".to_string(), name.0.clone()];
        argv.extend(args.iter().cloned());
        self.run(argv)
    }

    fn update_mirror(&self, name: &SourceName) -> Result<(), ToolError> {
        self.run(["mirror", "update", name.0.as_str()])
    }

    fn add_packages(&self, repo: &SourceName, files: &[PathBuf]) -> Result<(), ToolError> {
        let mut argv: Vec<OsString> = vec!["repo".into(), "add".into(), repo.0.clone().into()];
        argv.extend(files.iter().map(|f| f.as_os_str().to_owned()));
        self.run(argv)
    }

    fn list_sources(&self, kind: SourceKind) -> Result<Vec<SourceName>, ToolError> {
        Ok(self
            .lines([kind.as_str(), "list", "-raw"])?
            .into_iter()
            .map(SourceName::from)
            .collect())
    }

    fn create_snapshot(
        &self,
        id: &SnapshotId,
        kind: SourceKind,
        name: &SourceName,
    ) -> Result<(), ToolError> {
        self.run([
            "snapshot",
            "create",
            id.as_str(),
            "from",
            kind.as_str(),
            name.0.as_str(),
        ])
    }

    fn diff_snapshots(&self, old: &SnapshotId, new: &SnapshotId) -> Result<String, ToolError> {
        self.capture(["snapshot", "diff", old.as_str(), new.as_str()])
    }

    fn drop_snapshot(&self, id: &SnapshotId) -> Result<(), ToolError> {
        self.run(["snapshot", "drop", id.as_str()])
    }

    fn merge_snapshots(&self, id: &SnapshotId, sources: &[SnapshotId]) -> Result<(), ToolError> {
        let argv = ["snapshot", "merge", id.as_str()]
            .into_iter()
            .chain(sources.iter().map(SnapshotId::as_str));
        self.run(argv)
    }

    fn published(&self) -> Result<Vec<String>, ToolError> {
        self.lines(["publish", "list", "-raw"])
    }

    fn publish_snapshot(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError> {
        let distribution = format!("-distribution={}", target.release);
        self.run([
            "publish",
            "snapshot",
            distribution.as_str(),
            id.as_str(),
            target.publish_name.as_str(),
        ])
    }

    fn switch_published(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError> {
        self.run([
            "publish",
            "switch",
            target.release.as_str(),
            target.publish_name.as_str(),
            id.as_str(),
        ])
    }
}
