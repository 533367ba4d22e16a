use crate::areas::database::Database;
use crate::artifacts::diff::tree_diff::TreeChangeType;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::snapshot::entry_mode::FileMode;
use crate::artifacts::snapshot::snapshot_entry::SnapshotEntry;
use derive_new::new;
use std::path::PathBuf;

/// Result of a three-way tree resolution
///
/// When `conflicts` is empty, `entries` is the flat file list of the merged
/// tree, ready for tree building. When it is not, no merged tree should be
/// written; the conflicting paths are reported to the caller instead.
#[derive(Debug)]
pub struct MergeOutcome {
    pub entries: Vec<SnapshotEntry>,
    pub conflicts: Vec<PathBuf>,
}

/// Per-path three-way merge of (base, source, target) commits
///
/// Both sides are diffed against the common base, then combined path by path:
///
/// - changed only in source → take the source version
/// - changed only in target → keep the target version
/// - unchanged in both → keep the base version
/// - changed identically in both → take that version, no conflict
/// - changed differently in both (including modify vs. delete) → conflict;
///   no resolution is guessed
#[derive(Debug, new)]
pub struct ThreeWayMerge<'r> {
    database: &'r Database,
}

impl ThreeWayMerge<'_> {
    pub fn resolve(
        &self,
        base: &ObjectId,
        source: &ObjectId,
        target: &ObjectId,
    ) -> anyhow::Result<MergeOutcome> {
        let source_changes = self
            .database
            .tree_diff(Some(base), Some(source))?
            .into_changes();
        let target_changes = self
            .database
            .tree_diff(Some(base), Some(target))?
            .into_changes();

        // Start from the target's files; the target side's own changes are
        // already part of that snapshot.
        let mut merged = self.database.flatten_tree(target)?;
        let mut conflicts = Vec::new();

        for (path, source_change) in source_changes {
            match target_changes.get(&path) {
                None => match &source_change {
                    TreeChangeType::Added(entry) | TreeChangeType::Modified { new: entry, .. } => {
                        merged.insert(path, entry.clone());
                    }
                    TreeChangeType::Deleted(_) => {
                        merged.remove(&path);
                    }
                },
                Some(target_change) => {
                    // Both sides touched the path: identical outcomes merge
                    // silently, anything else is a conflict.
                    if source_change.new_entry() != target_change.new_entry() {
                        conflicts.push(path);
                    }
                }
            }
        }

        let entries = merged
            .into_iter()
            .map(|(path, entry)| {
                let mode = FileMode::try_from(entry.mode)?;
                Ok(SnapshotEntry::new(path, entry.oid, mode))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        tracing::debug!(
            files = entries.len(),
            conflicts = conflicts.len(),
            "resolved three-way merge"
        );

        Ok(MergeOutcome { entries, conflicts })
    }
}
