use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::snapshot::entry_mode::FileMode;
use derive_new::new;
use std::path::{Path, PathBuf};

/// A single file captured by a snapshot walk or produced by a merge
///
/// Carries the workspace-relative path, the content hash of the stored blob,
/// and the file mode recorded in the owning tree.
#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct SnapshotEntry {
    /// File path relative to the repository root
    pub path: PathBuf,
    /// SHA-256 hash of the file content
    pub oid: ObjectId,
    /// File mode (permissions)
    pub mode: FileMode,
}

impl SnapshotEntry {
    pub fn basename(&self) -> anyhow::Result<&str> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name"))
    }

    /// All parent directories of the entry, shallowest first.
    ///
    /// `a/b/c.txt` yields `[a, a/b]`; a root-level file yields nothing.
    pub fn parent_dirs(&self) -> anyhow::Result<Vec<&Path>> {
        let mut dirs = Vec::new();
        let mut parent = self.path.parent();

        while let Some(new_parent) = parent {
            dirs.push(new_parent);
            parent = new_parent.parent();
        }
        dirs.reverse();
        let dirs = dirs[1..].to_vec();

        Ok(dirs)
    }
}
