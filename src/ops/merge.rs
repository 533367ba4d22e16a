use crate::areas::database::CommitCache;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::VcsError;
use crate::artifacts::merge::bca_finder::BCAFinder;
use crate::artifacts::merge::three_way::ThreeWayMerge;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;

impl Repository {
    /// Three-way merge of `source` into `target`.
    ///
    /// Resolves both tips, finds their best common ancestor, and resolves the
    /// three trees path by path. Conflicting paths abort the merge with
    /// [`VcsError::MergeConflict`] before anything is written; otherwise a
    /// commit with parents `[target tip, source tip]` is stored and the target
    /// branch pointer advances to it. The working directory is untouched
    /// either way; `switch` materializes the result.
    ///
    /// Expected recoverable outcomes: [`VcsError::NoChanges`] when the source
    /// tip is already contained in the target, [`VcsError::Unrelated`] when
    /// the branches share no history.
    pub fn merge(&self, source: &str, target: &str, message: &str) -> anyhow::Result<ObjectId> {
        let source = BranchName::try_parse(source.to_string())?;
        let target = BranchName::try_parse(target.to_string())?;
        let _lock = self.lock_store()?;

        let source_tip = self
            .refs()
            .read_ref(&source)?
            .ok_or_else(|| VcsError::UnknownBranch(source.clone()))?;
        let target_tip = self
            .refs()
            .read_ref(&target)?
            .ok_or_else(|| VcsError::UnknownBranch(target.clone()))?;

        if source_tip == target_tip {
            return Err(VcsError::NoChanges.into());
        }

        // Find the best common ancestor
        let commit_cache = CommitCache::new();
        let database = self.database();

        let base_oid = {
            let finder = BCAFinder::new(|oid: &ObjectId| commit_cache.get_or_load(database, oid));
            finder.find_best_common_ancestor(&target_tip, &source_tip)?
        }
        .ok_or(VcsError::Unrelated)?;

        if base_oid == source_tip {
            // target already contains every source commit
            return Err(VcsError::NoChanges.into());
        }

        tracing::debug!(
            source = %source_tip.to_short_oid(),
            target = %target_tip.to_short_oid(),
            base = %base_oid.to_short_oid(),
            "merging branches"
        );

        let outcome = ThreeWayMerge::new(database).resolve(&base_oid, &source_tip, &target_tip)?;
        if !outcome.conflicts.is_empty() {
            return Err(VcsError::MergeConflict {
                paths: outcome.conflicts,
            }
            .into());
        }

        let tree = Tree::build(outcome.entries.iter())?;
        let store_tree = &|subtree: &Tree| database.store(subtree.clone());
        tree.traverse(store_tree)?;
        let tree_oid = tree.object_id()?;

        let commit_oid = self.write_commit(vec![target_tip, source_tip], &target, tree_oid, message)?;

        tracing::debug!(commit = %commit_oid.to_short_oid(), branch = %target, "merge committed");

        Ok(commit_oid)
    }
}
