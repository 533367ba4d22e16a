//! Common ancestor finder for merge operations
//!
//! This module finds the best common ancestor(s) between two commits, the base
//! commit a three-way merge diffs against.
//!
//! ## Algorithm Overview
//!
//! The implementation uses a two-phase algorithm:
//!
//! ### Phase 1: Find All Common Ancestors
//!
//! A bidirectional graph traversal explores the commit history of both input
//! commits:
//! - Process commits in reverse chronological order (newest first via a
//!   priority queue keyed by timestamp)
//! - Mark commits as visited from source or target side
//! - When a commit is visited from both sides, mark it as a common ancestor
//! - Mark ancestors of common ancestors as STALE to prune the search space
//!
//! ### Phase 2: Filter to Best Common Ancestors
//!
//! Apply the **Best Common Ancestor (BCA) Invariant**:
//! > A best common ancestor of commits X and Y is any common ancestor of X and Y
//! > that is not an ancestor of any other common ancestor.
//!
//! For each pair of common ancestors, check whether one is reachable from the
//! other and drop the reachable one. When several best common ancestors
//! survive (criss-cross histories), the newest is chosen so the result is
//! deterministic.
//!
//! An empty result means the two commits share no history (different roots);
//! merge fails with `Unrelated` in that case.
//!
//! ## Debug Logging
//!
//! Build with the `debug_merge` feature to trace commit processing order,
//! visit states and the redundancy filter on stderr.

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

/// Macro for debug logging that is enabled with the debug_merge feature flag
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug_merge")]
        {
            eprintln!($($arg)*);
        }
    };
}

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        const STALE = 0b100; // Marks commits whose descendants already answered the search
        const RESULT = 0b1000; // Marks commits identified as common ancestors
    }
}

impl fmt::Debug for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.contains(VisitState::VISITED_FROM_SOURCE) {
            flags.push("SOURCE");
        }
        if self.contains(VisitState::VISITED_FROM_TARGET) {
            flags.push("TARGET");
        }
        if self.contains(VisitState::STALE) {
            flags.push("STALE");
        }
        if self.contains(VisitState::RESULT) {
            flags.push("RESULT");
        }
        if flags.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Finds common ancestors between commits
///
/// Takes a function that can load [`SlimCommit`] data for any given commit,
/// making it flexible enough to work with different storage backends (object
/// store, in-memory test graphs, etc.).
#[derive(Debug, Clone)]
struct CommonAncestorsFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    /// Function to load commit data for any given commit ID
    commit_loader: CommitLoaderFn,
}

impl<CommitLoaderFn> CommonAncestorsFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    fn new(commit_loader: CommitLoaderFn) -> Self {
        Self { commit_loader }
    }

    /// Finds all common ancestors between a source commit and a set of target
    /// commits.
    ///
    /// Returns a map of commit IDs to their visit states, filtered down to the
    /// non-stale common ancestors (commits visited from both sides).
    fn find_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_ids: HashSet<&ObjectId>,
    ) -> anyhow::Result<HashMap<ObjectId, VisitState>> {
        if target_commit_ids.contains(source_commit_id) {
            // If the source commit is also a target, it's the common ancestor
            return Ok(HashMap::from([(
                source_commit_id.clone(),
                VisitState::RESULT,
            )]));
        }

        let mut ancestors_states = HashMap::<ObjectId, VisitState>::new();
        let mut priority_queue = std::collections::BinaryHeap::new();

        // Add source and target commits with their respective visit states.
        // Process newest commits first (max heap keyed by timestamp).
        let source_commit = (self.commit_loader)(source_commit_id)?;
        ancestors_states.insert(source_commit.oid.clone(), VisitState::VISITED_FROM_SOURCE);
        priority_queue.push((source_commit.timestamp, source_commit.oid.clone()));

        for &target_commit_id in target_commit_ids.iter() {
            ancestors_states.insert(target_commit_id.clone(), VisitState::VISITED_FROM_TARGET);

            let target_commit = (self.commit_loader)(target_commit_id)?;
            priority_queue.push((target_commit.timestamp, target_commit.oid.clone()));
        }

        while let Some((_, commit_id)) = priority_queue.pop() {
            let current_state = ancestors_states
                .get(&commit_id)
                .copied()
                .unwrap_or(VisitState::NONE);

            debug_log!("Processing commit {}: state={}", &commit_id, current_state);

            if current_state.contains(VisitState::STALE) {
                continue; // Skip already processed commits
            }

            // Check if this commit has been visited from both sides
            let is_common_ancestor = if current_state.contains(VisitState::VISITED_FROM_BOTH) {
                ancestors_states
                    .entry(commit_id.clone())
                    .and_modify(|state| *state |= VisitState::RESULT);
                true
            } else {
                false
            };

            // Load the commit to get its parents
            let current_commit = (self.commit_loader)(&commit_id)?;

            // Process all parents
            for parent_id in &current_commit.parents {
                let parent_commit = (self.commit_loader)(parent_id)?;
                let parent_state = ancestors_states
                    .get(parent_id)
                    .copied()
                    .unwrap_or(VisitState::NONE);

                // Inherit visit state from current commit
                let mut new_state = parent_state | current_state;
                if is_common_ancestor {
                    new_state |= VisitState::STALE;
                }

                // Only add to queue if we haven't processed this parent with this state
                if !parent_state.contains(current_state) {
                    ancestors_states.insert(parent_id.clone(), new_state);
                    priority_queue.push((parent_commit.timestamp, parent_id.clone()));
                }
            }
        }

        debug_log!(
            "Final ancestors states: {}",
            ancestors_states
                .iter()
                .map(|(oid, state)| format!("{}: {}", oid, state))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ancestors_states
            .into_iter()
            .filter(|(_, state)| {
                !state.contains(VisitState::STALE) && state.contains(VisitState::RESULT)
            })
            .collect())
    }
}

/// Best common ancestor finder
pub struct BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    inner: CommonAncestorsFinder<CommitLoaderFn>,
}

impl<CommitLoaderFn> BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    /// Creates a new best common ancestor finder with the given commit loader
    ///
    /// The loader takes a commit ObjectId and returns a [`SlimCommit`]
    /// containing parent ObjectIds and timestamp; root commits carry an empty
    /// parents vector.
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            inner: CommonAncestorsFinder::new(commit_loader),
        }
    }

    /// Finds the best common ancestor between two commits
    ///
    /// Phase 1 collects all common ancestors via bidirectional traversal;
    /// phase 2 filters out every common ancestor reachable from another one.
    /// Returns `None` when the commits share no history.
    pub fn find_best_common_ancestor(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Option<ObjectId>> {
        let target_commit_ids = HashSet::from([target_commit_id]);
        let common_ancestors = self
            .inner
            .find_common_ancestors(source_commit_id, target_commit_ids)?
            .into_keys()
            .collect::<HashSet<_>>();

        if common_ancestors.is_empty() {
            return Ok(None);
        }

        debug_log!(
            "Found common ancestors: {}",
            common_ancestors
                .iter()
                .map(|oid| oid.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut redundant_ancestors = HashSet::<ObjectId>::new();
        for commit in &common_ancestors {
            debug_log!("Evaluating common ancestor {} for redundancy", commit);

            if redundant_ancestors.contains(commit) {
                continue; // Skip already marked redundant ancestors
            }

            let others = common_ancestors
                .iter()
                .filter(|other| *other != commit && !redundant_ancestors.contains(*other))
                .collect::<HashSet<_>>();
            if others.is_empty() {
                continue;
            }

            let common_states = self.inner.find_common_ancestors(commit, others.clone())?;

            if common_states
                .get(commit)
                .unwrap_or(&VisitState::NONE)
                .contains(VisitState::VISITED_FROM_TARGET)
            {
                redundant_ancestors.insert(commit.clone());
            }

            for other in others {
                if common_states
                    .get(other)
                    .unwrap_or(&VisitState::NONE)
                    .contains(VisitState::VISITED_FROM_SOURCE)
                {
                    redundant_ancestors.insert(other.clone());
                }
            }
        }

        debug_log!(
            "Redundant ancestors: {}",
            redundant_ancestors
                .iter()
                .map(|oid| oid.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );

        // Filter out redundant ancestors to find the best common ancestor(s)
        let best_common_ancestors = common_ancestors
            .into_iter()
            .filter(|commit| !redundant_ancestors.contains(commit))
            .collect::<Vec<_>>();

        debug_log!(
            "Best common ancestors: {}",
            best_common_ancestors
                .iter()
                .map(|oid| oid.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );

        // Several best common ancestors can survive in criss-cross histories;
        // pick the newest (ties broken by id) so the choice is deterministic.
        let mut dated_ancestors = best_common_ancestors
            .into_iter()
            .map(|oid| {
                let commit = (self.inner.commit_loader)(&oid)?;
                Ok((commit.timestamp, oid))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        dated_ancestors.sort();

        Ok(dated_ancestors.pop().map(|(_, oid)| oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::collections::HashMap;

    /// In-memory commit graph for testing
    #[derive(Debug, Clone, Default)]
    struct InMemoryCommitStore {
        commits: HashMap<ObjectId, (Vec<ObjectId>, DateTime<FixedOffset>)>,
    }

    impl InMemoryCommitStore {
        fn new() -> Self {
            Self::default()
        }

        fn add_commit(&mut self, commit_id: ObjectId, parents: Vec<ObjectId>) {
            // Incrementally increasing timestamps keep the ordering deterministic
            let timestamp_offset = self.commits.len() as i64 * 3600; // 1 hour apart
            let timestamp = FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(1640995200 + timestamp_offset, 0) // Starting from 2022-01-01
                .unwrap();
            self.commits.insert(commit_id, (parents, timestamp));
        }

        fn loader(&self) -> impl Fn(&ObjectId) -> anyhow::Result<SlimCommit> + '_ {
            |oid| {
                let (parents, timestamp) = self
                    .commits
                    .get(oid)
                    .ok_or_else(|| anyhow::anyhow!("commit {} not in test store", oid))?;

                Ok(SlimCommit {
                    oid: oid.clone(),
                    parents: parents.clone(),
                    timestamp: *timestamp,
                })
            }
        }
    }

    fn create_oid(id: &str) -> ObjectId {
        // Create a deterministic 64-character hex ObjectId from a label
        let mut hex_string = String::new();

        for byte in id.as_bytes().iter() {
            hex_string.push_str(&format!("{:02x}", byte));
        }

        while hex_string.len() < 64 {
            hex_string.push('0');
        }
        hex_string.truncate(64);

        ObjectId::try_parse(hex_string).expect("Invalid test ObjectId")
    }

    #[test]
    fn linear_history_returns_the_older_commit() {
        // A <- B <- C <- D
        let (a, b, c, d) = (
            create_oid("a"),
            create_oid("b"),
            create_oid("c"),
            create_oid("d"),
        );
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![b.clone()]);
        store.add_commit(d.clone(), vec![c.clone()]);

        let finder = BCAFinder::new(store.loader());

        assert_eq!(
            finder.find_best_common_ancestor(&b, &d).unwrap(),
            Some(b.clone())
        );
        assert_eq!(finder.find_best_common_ancestor(&d, &b).unwrap(), Some(b));
    }

    #[test]
    fn forked_history_returns_the_fork_point() {
        //     A
        //    / \
        //   B   C
        let (a, b, c) = (create_oid("a"), create_oid("b"), create_oid("c"));
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a.clone()]);

        let finder = BCAFinder::new(store.loader());

        assert_eq!(finder.find_best_common_ancestor(&b, &c).unwrap(), Some(a));
    }

    #[test]
    fn a_commit_is_its_own_best_common_ancestor() {
        let a = create_oid("a");
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);

        let finder = BCAFinder::new(store.loader());

        assert_eq!(
            finder.find_best_common_ancestor(&a, &a).unwrap(),
            Some(a.clone())
        );
    }

    #[test]
    fn unrelated_roots_share_no_ancestor() {
        // A <- B    C <- D
        let (a, b, c, d) = (
            create_oid("a"),
            create_oid("b"),
            create_oid("c"),
            create_oid("d"),
        );
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a]);
        store.add_commit(c.clone(), vec![]);
        store.add_commit(d.clone(), vec![c]);

        let finder = BCAFinder::new(store.loader());

        assert_eq!(finder.find_best_common_ancestor(&b, &d).unwrap(), None);
    }

    #[test]
    fn merge_commit_contains_the_merged_branch() {
        //  A <- B <------ M
        //   \       /
        //    C <- D       (M has parents B and D)
        let (a, b, c, d, m) = (
            create_oid("a"),
            create_oid("b"),
            create_oid("c"),
            create_oid("d"),
            create_oid("m"),
        );
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a.clone()]);
        store.add_commit(d.clone(), vec![c.clone()]);
        store.add_commit(m.clone(), vec![b.clone(), d.clone()]);

        let finder = BCAFinder::new(store.loader());

        // The merged-in branch tip is an ancestor of the merge commit
        assert_eq!(
            finder.find_best_common_ancestor(&m, &d).unwrap(),
            Some(d.clone())
        );
    }

    #[test]
    fn criss_cross_merges_pick_a_deterministic_best_ancestor() {
        //     A
        //    / \
        //   B   C
        //   |\ /|
        //   | X |
        //   |/ \|
        //   D   E     (D and E each have parents B and C)
        //   |   |
        //   F   G
        let (a, b, c, d, e, f, g) = (
            create_oid("a"),
            create_oid("b"),
            create_oid("c"),
            create_oid("d"),
            create_oid("e"),
            create_oid("f"),
            create_oid("g"),
        );
        let mut store = InMemoryCommitStore::new();
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a.clone()]);
        store.add_commit(d.clone(), vec![b.clone(), c.clone()]);
        store.add_commit(e.clone(), vec![b.clone(), c.clone()]);
        store.add_commit(f.clone(), vec![d.clone()]);
        store.add_commit(g.clone(), vec![e.clone()]);

        let finder = BCAFinder::new(store.loader());

        let result = finder.find_best_common_ancestor(&f, &g).unwrap();
        // B and C are both best common ancestors; the newer one wins the tie
        assert_eq!(result, Some(c));

        // and the choice is stable across invocations
        let again = finder.find_best_common_ancestor(&f, &g).unwrap();
        assert_eq!(result, again);
    }
}
