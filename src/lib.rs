//! A content-addressed snapshot store with a commit graph, branch table and
//! three-way merge.
//!
//! State lives under a `.tuck` directory inside the tracked project:
//! immutable blobs, trees and commits in an append-only object store keyed by
//! SHA-256, and mutable branch pointers under `refs/heads`. The public
//! operations hang off [`areas::repository::Repository`]: `init`, `snapshot`,
//! `merge`, `checkout`, `switch`, `history`, `current_branch` and branch
//! management.

pub mod areas;
pub mod artifacts;
pub mod ops;
