use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::VcsError;
use crate::artifacts::log::rev_list::{RevList, RevListIter};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Every commit reachable from the branch tip, newest first.
    pub fn history(&self, branch: &str) -> anyhow::Result<Vec<(ObjectId, Commit)>> {
        let branch = BranchName::try_parse(branch.to_string())?;
        let tip = self
            .refs()
            .read_ref(&branch)?
            .ok_or_else(|| VcsError::UnknownBranch(branch.clone()))?;

        self.ancestors(tip)?.collect()
    }

    /// Lazy walk over a commit and its ancestors, newest first.
    ///
    /// The sequence is finite and yields each reachable commit once; build a
    /// new walk to iterate again.
    pub fn ancestors(&self, start: ObjectId) -> anyhow::Result<RevListIter<'_>> {
        RevList::new(self, start).into_iter()
    }
}
