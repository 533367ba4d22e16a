use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::VcsError;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::snapshot::snapshot_entry::SnapshotEntry;
use anyhow::Context;

impl Repository {
    /// Record the working directory as a new commit on `branch`.
    ///
    /// Walks the directory, stores every file as a blob, builds trees
    /// bottom-up, and compares the root tree with the branch tip's. An
    /// identical tree fails with [`VcsError::NoChanges`] and writes no commit.
    /// Otherwise the commit's single parent is the previous tip (none when the
    /// branch is new) and the branch pointer advances to it.
    pub fn snapshot(&self, branch: &str, message: &str) -> anyhow::Result<ObjectId> {
        let branch = BranchName::try_parse(branch.to_string())?;
        let _lock = self.lock_store()?;

        let entries = self.collect_snapshot_entries()?;
        let tree = Tree::build(entries.iter())?;
        let store_tree = &|subtree: &Tree| self.database().store(subtree.clone());
        tree.traverse(store_tree)?;
        let tree_oid = tree.object_id()?;

        let parent = if self.refs().branch_exists(&branch) {
            self.refs().read_ref(&branch)?
        } else {
            None
        };

        if let Some(parent_oid) = &parent {
            let parent_commit = self
                .database()
                .parse_object_as_commit(parent_oid)?
                .with_context(|| format!("branch {} does not point to a commit", branch))?;

            if parent_commit.tree_oid() == &tree_oid {
                return Err(VcsError::NoChanges.into());
            }
        }

        let commit_oid = self.write_commit(parent.into_iter().collect(), &branch, tree_oid, message)?;

        tracing::debug!(
            branch = %branch,
            commit = %commit_oid.to_short_oid(),
            files = entries.len(),
            "snapshot recorded"
        );

        Ok(commit_oid)
    }

    /// Hash every workspace file into the store and collect its entry.
    fn collect_snapshot_entries(&self) -> anyhow::Result<Vec<SnapshotEntry>> {
        self.workspace()
            .list_files()?
            .into_iter()
            .map(|path| {
                let blob = self.workspace().parse_blob(&path)?;
                self.database().store(blob.clone())?;

                let oid = blob.object_id()?;
                Ok(SnapshotEntry::new(path, oid, blob.mode().clone()))
            })
            .collect()
    }
}
