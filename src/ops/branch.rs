use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Create a branch pointing at the given revision.
    ///
    /// Branch pointers may target any stored commit; this is how histories
    /// fork before diverging through `snapshot`.
    pub fn create_branch(&self, name: &str, revision: &str) -> anyhow::Result<()> {
        let name = BranchName::try_parse(name.to_string())?;
        let _lock = self.lock_store()?;

        let oid = self.resolve_commit(revision)?;
        self.database()
            .parse_object_as_commit(&oid)?
            .ok_or_else(|| anyhow::anyhow!("object {} is not a commit", oid))?;

        self.refs().create_branch(name, oid)
    }

    /// Delete a branch pointer. The commits it pointed at stay in the store.
    pub fn delete_branch(&self, name: &str) -> anyhow::Result<ObjectId> {
        let name = BranchName::try_parse(name.to_string())?;
        let _lock = self.lock_store()?;

        if self.refs().is_current_branch(&name)? {
            anyhow::bail!("cannot delete the current branch {}", name);
        }

        self.refs().delete_branch(&name)
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        self.refs()
            .list_branches()?
            .iter()
            .map(BranchName::try_parse_sym_ref_name)
            .collect()
    }

    /// The branch `HEAD` currently names, or `None` when `HEAD` is detached.
    pub fn current_branch(&self) -> anyhow::Result<Option<BranchName>> {
        let current_ref = self.refs().current_ref(None)?;

        if current_ref.is_detached_head() {
            return Ok(None);
        }

        Ok(Some(BranchName::try_parse_sym_ref_name(&current_ref)?))
    }
}
