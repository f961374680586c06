//! Snapshot coordination for one run.
//!
//! A [`Coordinator`] owns the two-layer view of snapshot pointers: the
//! durable set from the snapshot file and the pending set produced by this
//! run. Every workflow ends in [`Coordinator::save`], which persists the
//! pending layer (if any) and starts a fresh run window.

use std::path::PathBuf;

use serde::Serialize;

use aptlier_core::{
    PublishTarget, RepoTool, Settings, SnapshotId, SnapshotSet, SnapshotStore, SourceKind,
    SourceName, Timestamp,
};

use crate::clock::{Clock, SystemClock};
use crate::detector::{detect_change, SnapshotUpdate};
use crate::error::SnapshotError;
use crate::registry::{self, SourceListing};

/// Which mirrors a bulk update covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateScope {
    /// Every mirror that already has a recorded snapshot.
    Managed,
    /// Exactly these mirrors, in this order.
    Sources(Vec<SourceName>),
}

impl UpdateScope {
    /// [`UpdateScope::Managed`] for an empty name list.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceName>,
    {
        let names: Vec<SourceName> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::Managed
        } else {
            Self::Sources(names)
        }
    }
}

/// Result of updating one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceUpdate {
    pub name: SourceName,
    #[serde(flatten)]
    pub update: SnapshotUpdate,
}

/// Result of a workflow that ends in a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub updates: Vec<SourceUpdate>,
    /// Whether the snapshot file was rewritten.
    pub saved: bool,
}

impl UpdateReport {
    /// Sources that got a new snapshot.
    pub fn recorded(&self) -> impl Iterator<Item = &SourceUpdate> {
        self.updates.iter().filter(|u| u.update.is_recorded())
    }
}

pub struct Coordinator<'t, T: RepoTool + ?Sized> {
    tool: &'t T,
    store: SnapshotStore,
    target: PublishTarget,
    clock: Box<dyn Clock>,
    timestamp: Option<Timestamp>,
    pending: SnapshotSet,
}

impl<'t, T: RepoTool + ?Sized> Coordinator<'t, T> {
    pub fn new(tool: &'t T, store: SnapshotStore, target: PublishTarget) -> Self {
        Self {
            tool,
            store,
            target,
            clock: Box::new(SystemClock),
            timestamp: None,
            pending: SnapshotSet::new(),
        }
    }

    /// Coordinator over the snapshot file and publish target in `settings`.
    pub fn from_settings(tool: &'t T, settings: &Settings) -> Self {
        Self::new(tool, SnapshotStore::open(settings), settings.publish_target())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn tool(&self) -> &'t T {
        self.tool
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    // -----------------------------------------------------------------------
    // Snapshot layers
    // -----------------------------------------------------------------------

    /// This run's timestamp, fixed on first use until the next save.
    pub fn timestamp(&mut self) -> Timestamp {
        let clock = &self.clock;
        self.timestamp
            .get_or_insert_with(|| Timestamp::from_datetime(clock.now()))
            .clone()
    }

    /// The durable set.
    pub fn loaded(&mut self) -> Result<&SnapshotSet, SnapshotError> {
        Ok(self.store.load()?)
    }

    /// Pointers produced by this run and not yet saved.
    pub fn pending(&self) -> &SnapshotSet {
        &self.pending
    }

    /// Durable set with pending pointers laid over it.
    pub fn effective(&mut self) -> Result<SnapshotSet, SnapshotError> {
        let loaded = self.store.load()?;
        Ok(loaded.overlay(&self.pending))
    }

    /// Every mirror and repo known to aptly with its recorded snapshot.
    pub fn listing(&mut self) -> Result<SourceListing, SnapshotError> {
        let tool = self.tool;
        let loaded = self.store.load()?;
        Ok(registry::list_sources(tool, loaded)?)
    }

    // -----------------------------------------------------------------------
    // Per-source updates
    // -----------------------------------------------------------------------

    /// Snapshot `name` at this run's timestamp and record it as pending if
    /// it differs from the durable snapshot.
    pub fn update_source(
        &mut self,
        name: &SourceName,
        kind: SourceKind,
    ) -> Result<SnapshotUpdate, SnapshotError> {
        let timestamp = self.timestamp();
        let new = SnapshotId::new(name, &timestamp);
        let previous = self.store.load()?.snapshot_id(name);

        let update = detect_change(self.tool, name, kind, &new, previous.as_ref())?;
        if update.is_recorded() {
            tracing::info!("snapshot {new} recorded for {name}");
            self.pending.insert(name.clone(), timestamp);
        }
        Ok(update)
    }

    /// Fetch upstream changes for mirror `name`, then snapshot it.
    pub fn refresh_mirror(&mut self, name: &SourceName) -> Result<SnapshotUpdate, SnapshotError> {
        tracing::info!("updating mirror {name}");
        self.tool.update_mirror(name)?;
        self.update_source(name, SourceKind::Mirror)
    }

    // -----------------------------------------------------------------------
    // Workflows
    // -----------------------------------------------------------------------

    /// Refresh every mirror in `scope`, then save.
    ///
    /// The first failing mirror aborts the run; nothing is saved for it or
    /// for the mirrors before it.
    pub fn update_selected(&mut self, scope: UpdateScope) -> Result<UpdateReport, SnapshotError> {
        self.update_selected_with(scope, |_| {})
    }

    /// [`Coordinator::update_selected`], handing each mirror's outcome to
    /// `on_update` as soon as that mirror is done.
    ///
    /// Outcomes reported before a failing mirror are still not saved.
    pub fn update_selected_with(
        &mut self,
        scope: UpdateScope,
        mut on_update: impl FnMut(&SourceUpdate),
    ) -> Result<UpdateReport, SnapshotError> {
        let names = match scope {
            UpdateScope::Sources(names) => names,
            UpdateScope::Managed => {
                let tool = self.tool;
                registry::managed_mirrors(tool, self.store.load()?)?
            }
        };
        if names.is_empty() {
            tracing::info!("no managed mirrors to update");
        }

        let mut updates = Vec::with_capacity(names.len());
        for name in names {
            let update = self.refresh_mirror(&name)?;
            let entry = SourceUpdate { name, update };
            on_update(&entry);
            updates.push(entry);
        }
        let saved = self.save()?;
        Ok(UpdateReport { updates, saved })
    }

    /// Add package files to local repo `repo`, snapshot it and save.
    pub fn add_packages(
        &mut self,
        repo: &SourceName,
        files: &[PathBuf],
    ) -> Result<UpdateReport, SnapshotError> {
        self.tool.add_packages(repo, files)?;
        let update = self.update_source(repo, SourceKind::Repo)?;
        let saved = self.save()?;
        Ok(UpdateReport {
            updates: vec![SourceUpdate {
                name: repo.clone(),
                update,
            }],
            saved,
        })
    }

    /// Create mirror `name` from `args`, fetch it, take its first snapshot
    /// and save.
    pub fn add_mirror(
        &mut self,
        name: &SourceName,
        args: &[String],
    ) -> Result<UpdateReport, SnapshotError> {
        tracing::info!("creating mirror {name}");
        self.tool.create_mirror(name, args)?;
        let update = self.refresh_mirror(name)?;
        let saved = self.save()?;
        Ok(UpdateReport {
            updates: vec![SourceUpdate {
                name: name.clone(),
                update,
            }],
            saved,
        })
    }

    /// Persist pending pointers and start a new run window.
    ///
    /// Returns whether the snapshot file was written.
    pub fn save(&mut self) -> Result<bool, SnapshotError> {
        let saved = self.store.save(&self.pending)?;
        if saved {
            self.pending.clear();
            self.timestamp = None;
        }
        Ok(saved)
    }

    /// Merge the effective snapshot of every source into
    /// `publish:<publish name>@<timestamp>`.
    pub fn merge_all(&mut self) -> Result<SnapshotId, SnapshotError> {
        let timestamp = self.timestamp();
        let id = SnapshotId::merged(&self.target.publish_name, &timestamp);
        let sources = self.effective()?.sorted_ids();
        if sources.is_empty() {
            tracing::warn!("no snapshots recorded, {id} will be empty");
        }

        tracing::info!("merging {} snapshots into {id}", sources.len());
        self.tool.merge_snapshots(&id, &sources)?;
        Ok(id)
    }
}
