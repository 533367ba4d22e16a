use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::core::error::VcsError;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Materialize a commit's tree into the working directory.
    ///
    /// `revision` is a full commit ID or a unique abbreviation. The working
    /// directory is made to match the commit's tree exactly: files absent from
    /// the tree are removed and differing files rewritten, so uncommitted
    /// changes are lost. No branch pointer moves; switching branches is the
    /// separate [`Repository::switch`].
    pub fn checkout(&self, revision: &str) -> anyhow::Result<ObjectId> {
        let _lock = self.lock_store()?;

        let commit_oid = self.resolve_commit(revision)?;
        self.materialize_commit(&commit_oid)?;

        Ok(commit_oid)
    }

    /// Check out a branch tip and point `HEAD` at the branch.
    pub fn switch(&self, branch: &str) -> anyhow::Result<ObjectId> {
        let branch = BranchName::try_parse(branch.to_string())?;
        let _lock = self.lock_store()?;

        let tip = self
            .refs()
            .read_ref(&branch)?
            .ok_or_else(|| VcsError::UnknownBranch(branch.clone()))?;

        self.materialize_commit(&tip)?;
        self.refs()
            .set_head(branch.as_ref(), tip.as_ref().to_string())?;

        tracing::debug!(branch = %branch, tip = %tip.to_short_oid(), "switched branch");

        Ok(tip)
    }

    /// Resolve a revision string to a stored object ID.
    ///
    /// Accepts a full 64-character ID or a shorter unique prefix. Fails with
    /// [`VcsError::NotFound`] when nothing matches and
    /// [`VcsError::AmbiguousId`] when several objects share the prefix.
    pub fn resolve_commit(&self, revision: &str) -> anyhow::Result<ObjectId> {
        if revision.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(revision.to_string())?;
            if !self.database().contains(&oid) {
                return Err(VcsError::NotFound(revision.to_string()).into());
            }
            return Ok(oid);
        }

        let mut matches = self.database().find_objects_by_prefix(revision)?;
        match matches.len() {
            0 => Err(VcsError::NotFound(revision.to_string()).into()),
            1 => Ok(matches.remove(0)),
            _ => Err(VcsError::AmbiguousId(revision.to_string()).into()),
        }
    }

    fn materialize_commit(&self, commit_oid: &ObjectId) -> anyhow::Result<()> {
        let commit = self
            .database()
            .parse_object_as_commit(commit_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {} is not a commit", commit_oid))?;

        let target = self.database().flatten_tree(commit.tree_oid())?;
        let mut migration = Migration::new(self.database(), self.workspace(), target);
        migration.apply_changes()?;

        tracing::debug!(commit = %commit_oid.to_short_oid(), "working directory materialized");

        Ok(())
    }
}
