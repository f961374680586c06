//! Snapshot workflows against a recording stand-in for aptly.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use aptlier_core::{
    IDENTICAL_SNAPSHOTS, MalformedPolicy, PublishTarget, RepoTool, SnapshotId, SnapshotStore,
    SourceKind, SourceName, ToolError,
};
use aptlier_snapshot::{
    publish, Clock, Coordinator, FixedClock, PublishAction, SnapshotUpdate, UpdateScope,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Recording tool
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingTool {
    calls: RefCell<Vec<String>>,
    mirrors: Vec<&'static str>,
    repos: Vec<&'static str>,
    diff: Option<String>,
    published: Vec<String>,
    fail_update: Option<&'static str>,
    fail_call: Option<&'static str>,
}

impl RecordingTool {
    fn new() -> Self {
        Self::default()
    }

    fn with_mirrors(mut self, mirrors: &[&'static str]) -> Self {
        self.mirrors = mirrors.to_vec();
        self
    }

    fn with_diff(mut self, diff: &str) -> Self {
        self.diff = Some(diff.to_owned());
        self
    }

    fn with_published(mut self, lines: &[&str]) -> Self {
        self.published = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    fn failing_update(mut self, mirror: &'static str) -> Self {
        self.fail_update = Some(mirror);
        self
    }

    /// Fail every snapshot call whose command starts with `prefix`.
    fn failing(mut self, prefix: &'static str) -> Self {
        self.fail_call = Some(prefix);
        self
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn record_checked(&self, call: String) -> Result<(), ToolError> {
        self.record(call.clone());
        match self.fail_call {
            Some(prefix) if call.starts_with(prefix) => Err(failed(call)),
            _ => Ok(()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn calls_starting(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

fn failed(command: String) -> ToolError {
    ToolError::Spawn {
        command,
        source: std::io::Error::new(std::io::ErrorKind::Other, "upstream unreachable"),
    }
}

impl RepoTool for RecordingTool {
    fn create_mirror(&self, name: &SourceName, args: &[String]) -> Result<(), ToolError> {
        self.record(format!("mirror create {name} {}", args.join(" ")));
        Ok(())
    }

    fn update_mirror(&self, name: &SourceName) -> Result<(), ToolError> {
        let call = format!("mirror update {name}");
        self.record(call.clone());
        if self.fail_update == Some(name.0.as_str()) {
            return Err(failed(call));
        }
        Ok(())
    }

    fn add_packages(&self, repo: &SourceName, files: &[PathBuf]) -> Result<(), ToolError> {
        let files: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        self.record(format!("repo add {repo} {}", files.join(" ")));
        Ok(())
    }

    fn list_sources(&self, kind: SourceKind) -> Result<Vec<SourceName>, ToolError> {
        self.record(format!("{kind} list -raw"));
        let names = match kind {
            SourceKind::Mirror => &self.mirrors,
            SourceKind::Repo => &self.repos,
        };
        Ok(names.iter().map(|n| SourceName::from(*n)).collect())
    }

    fn create_snapshot(
        &self,
        id: &SnapshotId,
        kind: SourceKind,
        name: &SourceName,
    ) -> Result<(), ToolError> {
        self.record_checked(format!("snapshot create {id} from {kind} {name}"))
    }

    fn diff_snapshots(&self, old: &SnapshotId, new: &SnapshotId) -> Result<String, ToolError> {
        self.record_checked(format!("snapshot diff {old} {new}"))?;
        Ok(self
            .diff
            .clone()
            .unwrap_or_else(|| IDENTICAL_SNAPSHOTS.to_owned()))
    }

    fn drop_snapshot(&self, id: &SnapshotId) -> Result<(), ToolError> {
        self.record_checked(format!("snapshot drop {id}"))
    }

    fn merge_snapshots(&self, id: &SnapshotId, sources: &[SnapshotId]) -> Result<(), ToolError> {
        let sources: Vec<&str> = sources.iter().map(SnapshotId::as_str).collect();
        self.record(format!("snapshot merge {id} {}", sources.join(" ")));
        Ok(())
    }

    fn published(&self) -> Result<Vec<String>, ToolError> {
        self.record("publish list -raw".to_owned());
        Ok(self.published.clone())
    }

    fn publish_snapshot(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError> {
        self.record(format!(
            "publish snapshot -distribution={} {id} {}",
            target.release, target.publish_name
        ));
        Ok(())
    }

    fn switch_published(&self, target: &PublishTarget, id: &SnapshotId) -> Result<(), ToolError> {
        self.record(format!(
            "publish switch {} {} {id}",
            target.release, target.publish_name
        ));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const T1: &str = "20240131.0942";
const T2: &str = "20240131.1015";

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 31, hour, min, 0).unwrap()
}

fn target() -> PublishTarget {
    PublishTarget {
        release: "xenial".into(),
        publish_name: "main".into(),
    }
}

fn snapshots_file(dir: &TempDir, content: Option<&str>) -> PathBuf {
    let path = dir.path().join("snapshots");
    if let Some(content) = content {
        std::fs::write(&path, content).unwrap();
    }
    path
}

fn coordinator<'t>(
    tool: &'t RecordingTool,
    path: &Path,
    now: DateTime<Utc>,
) -> Coordinator<'t, RecordingTool> {
    Coordinator::new(
        tool,
        SnapshotStore::new(path, MalformedPolicy::Reject),
        target(),
    )
    .with_clock(FixedClock(now))
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Advances one minute per reading.
struct TickingClock(Cell<i64>);

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let minutes = self.0.get();
        self.0.set(minutes + 1);
        at(9, 0) + Duration::minutes(minutes)
    }
}

// ---------------------------------------------------------------------------
// 1. Change detection
// ---------------------------------------------------------------------------

#[test]
fn first_snapshot_of_a_source_is_recorded_without_diff() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, None);
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let update = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();

    assert_eq!(
        update,
        SnapshotUpdate::First {
            snapshot: SnapshotId::from("ubuntu@20240131.0942")
        }
    );
    assert_eq!(
        tool.calls(),
        vec!["snapshot create ubuntu@20240131.0942 from mirror ubuntu"]
    );
    assert!(coord.pending().contains(&"ubuntu".into()));
}

#[test]
fn identical_snapshot_is_dropped_and_nothing_saved() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("ubuntu@20240101.0000\n"));
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let update = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();

    assert!(matches!(update, SnapshotUpdate::Unchanged { .. }));
    assert_eq!(
        tool.calls(),
        vec![
            "snapshot create ubuntu@20240131.0942 from mirror ubuntu",
            "snapshot diff ubuntu@20240101.0000 ubuntu@20240131.0942",
            "snapshot drop ubuntu@20240131.0942",
        ]
    );
    assert!(coord.pending().is_empty());
    assert!(!coord.save().unwrap());
    assert_eq!(read(&path), "ubuntu@20240101.0000\n");
}

#[rstest]
#[case("Snapshots are identical.")]
#[case("Snapshots are identical.\n\n")]
#[case("  + nginx_1.18.0-1_amd64\n")]
fn only_exact_sentinel_counts_as_unchanged(#[case] diff: &str) {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("ubuntu@20240101.0000\n"));
    let tool = RecordingTool::new().with_diff(diff);
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let update = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();

    assert_eq!(update.diff(), Some(diff));
    assert!(tool.calls_starting("snapshot drop").is_empty());
    assert!(coord.save().unwrap());
    assert_eq!(read(&path), "ubuntu@20240131.0942\n");
}

#[rstest]
#[case("snapshot create")]
#[case("snapshot diff")]
#[case("snapshot drop")]
fn failing_snapshot_call_aborts_the_source(#[case] failing: &'static str) {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("ubuntu@20240101.0000\n"));
    let tool = RecordingTool::new().failing(failing);
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let err = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap_err();

    assert!(err.to_string().contains(failing), "got: {err}");
    assert_eq!(tool.calls().last().map(|c| c.starts_with(failing)), Some(true));
    assert!(coord.pending().is_empty());
    assert!(!coord.save().unwrap());
    assert_eq!(read(&path), "ubuntu@20240101.0000\n");
}

#[test]
fn second_run_without_upstream_change_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, None);

    let first = RecordingTool::new();
    let mut coord = coordinator(&first, &path, at(9, 42));
    coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();
    assert!(coord.save().unwrap());

    let second = RecordingTool::new();
    let mut coord = coordinator(&second, &path, at(10, 15));
    let update = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();

    assert!(!update.is_recorded());
    assert!(coord.pending().is_empty());
    assert!(!coord.save().unwrap());
    assert_eq!(read(&path), format!("ubuntu@{T1}\n"));
}

#[test]
fn snapshot_already_taken_at_this_timestamp_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some(&format!("ubuntu@{T1}\n")));
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let update = coord
        .update_source(&"ubuntu".into(), SourceKind::Mirror)
        .unwrap();

    assert!(matches!(update, SnapshotUpdate::Current { .. }));
    assert!(tool.calls().is_empty(), "got: {:?}", tool.calls());
}

// ---------------------------------------------------------------------------
// 2. Timestamps and saving
// ---------------------------------------------------------------------------

#[test]
fn timestamp_is_stable_until_save() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, None);
    let tool = RecordingTool::new();
    let mut coord = Coordinator::new(
        &tool,
        SnapshotStore::new(&path, MalformedPolicy::Reject),
        target(),
    )
    .with_clock(TickingClock(Cell::new(0)));

    let first = coord.timestamp();
    assert_eq!(coord.timestamp(), first);

    coord.update_source(&"a".into(), SourceKind::Repo).unwrap();
    coord.update_source(&"b".into(), SourceKind::Repo).unwrap();
    assert!(coord.save().unwrap());
    assert_eq!(read(&path), "a@20240131.0900\nb@20240131.0900\n");

    assert_ne!(coord.timestamp(), first);
}

#[test]
fn effective_set_overlays_pending_on_loaded() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\nb@20240101.0000\n"));
    let tool = RecordingTool::new().with_diff("changed\n");
    let mut coord = coordinator(&tool, &path, at(10, 15));

    coord.update_source(&"b".into(), SourceKind::Repo).unwrap();

    let effective = coord.effective().unwrap();
    assert_eq!(
        effective.sorted_ids(),
        vec![
            SnapshotId::from("a@20240101.0000"),
            SnapshotId::from(format!("b@{T2}").as_str()),
        ]
    );
    assert_eq!(coord.loaded().unwrap().len(), 2);
    assert_eq!(coord.pending().len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Bulk update selection
// ---------------------------------------------------------------------------

#[test]
fn default_selection_is_recorded_mirrors_in_name_order() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("b@20240101.0000\na@20240101.0000\n"));
    let tool = RecordingTool::new()
        .with_mirrors(&["c", "b", "a"])
        .with_diff("changed\n");
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let report = coord
        .update_selected(UpdateScope::from_names(Vec::<String>::new()))
        .unwrap();

    assert_eq!(
        tool.calls_starting("mirror update"),
        vec!["mirror update a", "mirror update b"]
    );
    assert_eq!(report.recorded().count(), 2);
    assert!(report.saved);
    assert_eq!(read(&path), format!("a@{T1}\nb@{T1}\n"));
}

#[test]
fn explicit_selection_includes_unrecorded_mirrors() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\n"));
    let tool = RecordingTool::new().with_mirrors(&["a", "c"]);
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let report = coord
        .update_selected(UpdateScope::from_names(["c"]))
        .unwrap();

    assert_eq!(tool.calls_starting("mirror update"), vec!["mirror update c"]);
    assert!(tool.calls_starting("mirror list").is_empty());
    assert!(report.saved);
    assert_eq!(read(&path), format!("a@20240101.0000\nc@{T1}\n"));
}

#[test]
fn failing_mirror_aborts_without_saving() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\nb@20240101.0000\n"));
    let tool = RecordingTool::new()
        .with_mirrors(&["a", "b"])
        .with_diff("changed\n")
        .failing_update("b");
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let err = coord.update_selected(UpdateScope::Managed).unwrap_err();

    assert!(err.to_string().contains("mirror update b"), "got: {err}");
    assert_eq!(read(&path), "a@20240101.0000\nb@20240101.0000\n");
}

#[test]
fn each_mirror_is_reported_as_soon_as_it_is_done() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\nb@20240101.0000\n"));
    let tool = RecordingTool::new()
        .with_mirrors(&["a", "b"])
        .with_diff("  + nginx_1.18.0-1_amd64\n")
        .failing_update("b");
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let mut seen = Vec::new();
    let result = coord.update_selected_with(UpdateScope::Managed, |entry| {
        seen.push((entry.name.to_string(), entry.update.diff().map(str::to_owned)));
    });

    assert!(result.is_err());
    assert_eq!(
        seen,
        vec![("a".to_owned(), Some("  + nginx_1.18.0-1_amd64\n".to_owned()))]
    );
    assert_eq!(read(&path), "a@20240101.0000\nb@20240101.0000\n");
}

// ---------------------------------------------------------------------------
// 4. Add workflows
// ---------------------------------------------------------------------------

#[test]
fn add_packages_snapshots_the_repo() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, None);
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let report = coord
        .add_packages(&"local".into(), &[PathBuf::from("pkg_1.0_amd64.deb")])
        .unwrap();

    assert_eq!(
        tool.calls(),
        vec![
            "repo add local pkg_1.0_amd64.deb".to_owned(),
            format!("snapshot create local@{T1} from repo local"),
        ]
    );
    assert!(report.saved);
    assert_eq!(read(&path), format!("local@{T1}\n"));
}

#[test]
fn add_mirror_creates_updates_and_snapshots() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, None);
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let args = vec![
        "http://ppa.launchpad.net/deadsnakes/ppa/ubuntu".to_owned(),
        "xenial".to_owned(),
        "main".to_owned(),
    ];
    let report = coord.add_mirror(&"deadsnakes".into(), &args).unwrap();

    assert_eq!(
        tool.calls(),
        vec![
            "mirror create deadsnakes http://ppa.launchpad.net/deadsnakes/ppa/ubuntu xenial main"
                .to_owned(),
            "mirror update deadsnakes".to_owned(),
            format!("snapshot create deadsnakes@{T1} from mirror deadsnakes"),
        ]
    );
    assert!(report.saved);
}

// ---------------------------------------------------------------------------
// 5. Merge and publish
// ---------------------------------------------------------------------------

#[test]
fn merge_lists_sources_in_record_order() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("b@20240102.0000\na@20240101.0000\n"));
    let tool = RecordingTool::new();
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let id = coord.merge_all().unwrap();

    assert_eq!(id.as_str(), format!("publish:main@{T1}"));
    assert_eq!(
        tool.calls(),
        vec![format!(
            "snapshot merge publish:main@{T1} a@20240101.0000 b@20240102.0000"
        )]
    );
}

#[test]
fn merge_prefers_pending_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\n"));
    let tool = RecordingTool::new().with_diff("changed\n");
    let mut coord = coordinator(&tool, &path, at(9, 42));

    coord.update_source(&"a".into(), SourceKind::Repo).unwrap();
    coord.merge_all().unwrap();

    assert_eq!(
        tool.calls_starting("snapshot merge"),
        vec![format!("snapshot merge publish:main@{T1} a@{T1}")]
    );
}

#[rstest]
#[case(&[], PublishAction::Published, "publish snapshot -distribution=xenial publish:main@20240131.0942 main")]
#[case(&["other bionic"], PublishAction::Published, "publish snapshot -distribution=xenial publish:main@20240131.0942 main")]
#[case(&["main xenial"], PublishAction::Switched, "publish switch xenial main publish:main@20240131.0942")]
#[case(&["other bionic", "main"], PublishAction::Switched, "publish switch xenial main publish:main@20240131.0942")]
fn publish_branches_on_existing_publication(
    #[case] published: &[&str],
    #[case] action: PublishAction,
    #[case] expected: &str,
) {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("a@20240101.0000\n"));
    let tool = RecordingTool::new().with_published(published);
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let outcome = publish(&mut coord).unwrap();

    assert_eq!(outcome.action, action);
    assert_eq!(outcome.snapshot.as_str(), format!("publish:main@{T1}"));
    assert_eq!(tool.calls().last().map(String::as_str), Some(expected));
    assert_eq!(
        tool.calls_starting("publish").len(),
        2,
        "one listing and exactly one publish call"
    );
}

// ---------------------------------------------------------------------------
// 6. Listing
// ---------------------------------------------------------------------------

#[test]
fn listing_joins_aptly_sources_with_recorded_snapshots() {
    let dir = TempDir::new().unwrap();
    let path = snapshots_file(&dir, Some("b@20240101.0000\nlocal@20240102.0000\n"));
    let mut tool = RecordingTool::new().with_mirrors(&["b", "a"]);
    tool.repos = vec!["local"];
    let mut coord = coordinator(&tool, &path, at(9, 42));

    let listing = coord.listing().unwrap();

    let mirrors: Vec<(&str, Option<&str>)> = listing
        .mirrors
        .iter()
        .map(|e| (e.name.0.as_str(), e.snapshot.as_ref().map(|t| t.0.as_str())))
        .collect();
    assert_eq!(mirrors, vec![("a", None), ("b", Some("20240101.0000"))]);
    assert_eq!(listing.repos.len(), 1);
    assert!(listing.repos[0].is_managed());
    assert_eq!(listing.iter().count(), 3);
}
