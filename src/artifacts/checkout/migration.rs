use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::snapshot::entry_mode::{EntryMode, FileMode};
use anyhow::Context;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Type of file system action required for checkout
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Create new file
    Add,
    /// Delete file
    Delete,
    /// Modify existing file
    Modify,
}

/// Set of planned actions grouped by type
pub type ActionsSet = HashMap<ActionType, Vec<(PathBuf, Option<DatabaseEntry>)>>;

/// Checkout migration planner and executor
///
/// Plans the file system operations needed to make the working directory
/// match a target tree exactly, then applies them through the workspace.
/// Planning compares the target against the directory's actual current state,
/// so files that drifted from any commit are still overwritten and files
/// absent from the target are removed.
pub struct Migration<'r> {
    database: &'r Database,
    workspace: &'r Workspace,
    /// Flattened target tree: every blob keyed by path
    target: BTreeMap<PathBuf, DatabaseEntry>,
    /// Planned file system actions
    actions: ActionsSet,
    /// Directories to create
    mkdirs: BTreeSet<PathBuf>,
    /// Directories to remove
    rmdirs: BTreeSet<PathBuf>,
}

impl<'r> Migration<'r> {
    pub fn new(
        database: &'r Database,
        workspace: &'r Workspace,
        target: BTreeMap<PathBuf, DatabaseEntry>,
    ) -> Self {
        let actions = HashMap::from([
            (ActionType::Add, Vec::new()),
            (ActionType::Delete, Vec::new()),
            (ActionType::Modify, Vec::new()),
        ]);

        Self {
            database,
            workspace,
            target,
            actions,
            mkdirs: BTreeSet::new(),
            rmdirs: BTreeSet::new(),
        }
    }

    pub fn actions(&self) -> &ActionsSet {
        &self.actions
    }

    pub fn mkdirs(&self) -> &BTreeSet<PathBuf> {
        &self.mkdirs
    }

    pub fn rmdirs(&self) -> &BTreeSet<PathBuf> {
        &self.rmdirs
    }

    pub fn apply_changes(&mut self) -> anyhow::Result<()> {
        self.plan_changes()?;

        let workspace = self.workspace;
        workspace.apply_migration(self)?;

        Ok(())
    }

    fn plan_changes(&mut self) -> anyhow::Result<()> {
        let current = self.scan_workspace()?;

        let mut deletes = Vec::new();
        let mut writes = Vec::new();

        for (path, (oid, mode)) in &current {
            match self.target.get(path) {
                None => deletes.push(path.clone()),
                Some(entry) => {
                    if &entry.oid != oid || entry.mode != EntryMode::File(mode.clone()) {
                        writes.push((path.clone(), entry.clone(), ActionType::Modify));
                    }
                }
            }
        }

        for (path, entry) in &self.target {
            if !current.contains_key(path) {
                writes.push((path.clone(), entry.clone(), ActionType::Add));
            }
        }

        tracing::debug!(
            deletes = deletes.len(),
            writes = writes.len(),
            "planned checkout migration"
        );

        for path in deletes {
            self.record_removed_dirs(&path);
            self.actions
                .entry(ActionType::Delete)
                .or_default()
                .push((path, None));
        }

        for (path, entry, action) in writes {
            self.record_created_dirs(&path);
            self.actions
                .entry(action)
                .or_default()
                .push((path, Some(entry)));
        }

        Ok(())
    }

    /// Hash every file currently in the working directory.
    fn scan_workspace(&self) -> anyhow::Result<BTreeMap<PathBuf, (ObjectId, FileMode)>> {
        let mut state = BTreeMap::new();

        for path in self.workspace.list_files()? {
            let blob = self.workspace.parse_blob(&path)?;
            let oid = blob.object_id()?;
            state.insert(path, (oid, blob.mode().clone()));
        }

        Ok(state)
    }

    /// Queue the ancestors of a deleted file for removal, unless the target
    /// tree still keeps files under them.
    fn record_removed_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }

            let still_needed = self.target.keys().any(|kept| kept.starts_with(ancestor));
            if !still_needed {
                self.rmdirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn record_created_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }

            self.mkdirs.insert(ancestor.to_path_buf());
        }
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let blob = self
            .database
            .parse_object_as_blob(object_id)?
            .with_context(|| format!("Failed to parse blob object {}", object_id))?;

        Ok(blob.into_content())
    }
}
