//! Error taxonomy for repository operations
//!
//! Operations return `anyhow::Result` so call sites can attach context, but
//! every outcome a caller is expected to branch on is raised as a [`VcsError`]
//! and can be recovered with `err.downcast_ref::<VcsError>()`.
//!
//! `NoChanges` and `MergeConflict` are expected, recoverable outcomes rather
//! than failures. Filesystem errors surface as `std::io::Error` values inside
//! the `anyhow` chain; nothing is retried or swallowed.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// An object, commit, or revision is absent from the store.
    #[error("object {0} not found in the object store")]
    NotFound(String),

    /// A branch name does not resolve to a commit.
    #[error("branch {0} does not exist")]
    UnknownBranch(BranchName),

    /// A snapshot produced a tree identical to the branch tip's.
    #[error("nothing to snapshot, working directory matches the branch tip")]
    NoChanges,

    /// A commit was created with a parent that is not in the store.
    #[error("parent commit {0} does not exist")]
    InvalidParent(ObjectId),

    /// Two branches share no common history.
    #[error("branches share no common ancestor")]
    Unrelated,

    /// A three-way merge found paths changed incompatibly on both sides.
    /// The caller resolves them externally and retries.
    #[error("merge conflicts in {paths:?}")]
    MergeConflict { paths: Vec<PathBuf> },

    /// The snapshot walk met a symlink or other special file.
    #[error("{0} is not a regular file or directory")]
    SpecialFile(PathBuf),

    /// An abbreviated object ID matched more than one object.
    #[error("object id prefix {0} is ambiguous")]
    AmbiguousId(String),
}
