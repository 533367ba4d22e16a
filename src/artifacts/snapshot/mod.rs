//! Working-directory snapshot primitives
//!
//! The snapshot engine flattens the working directory into a list of
//! [`snapshot_entry::SnapshotEntry`] values (path, content hash, mode) which
//! feed tree building. The merge engine produces the same entry lists for
//! merged trees, so both paths share the tree builder.

pub mod entry_mode;
pub mod snapshot_entry;
