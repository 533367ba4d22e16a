use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::VcsError;
use crate::artifacts::objects::commit::{Commit, commit_timestamp};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Store a commit and advance the branch pointer to it.
    ///
    /// Every parent must already exist in the store; a commit can never
    /// reference forward. The branch ref file is replaced with a single locked
    /// write, and the caller holds the store lock for the whole operation, so
    /// the commit and the pointer move together.
    pub(crate) fn write_commit(
        &self,
        parents: Vec<ObjectId>,
        branch: &BranchName,
        tree_oid: ObjectId,
        message: &str,
    ) -> anyhow::Result<ObjectId> {
        for parent in &parents {
            if !self.database().contains(parent) {
                return Err(VcsError::InvalidParent(parent.clone()).into());
            }
        }

        let commit = Commit::new(
            parents,
            tree_oid,
            branch.clone(),
            commit_timestamp(),
            message.trim().to_string(),
        );
        let commit_oid = commit.object_id()?;
        self.database().store(commit)?;

        let branch_path = self
            .refs()
            .heads_path()
            .join(branch.as_ref())
            .into_boxed_path();
        self.refs()
            .update_ref_file(branch_path, commit_oid.as_ref().to_string())?;

        Ok(commit_oid)
    }
}
