//! Checkout migration planning
//!
//! Materializing a stored tree replaces the working directory contents with
//! the tree's exact state. The migration plans every file system operation
//! against the directory's actual current state before any write happens, then
//! applies them in a safe order (deletes, directory removals, directory
//! creations, writes).
//!
//! The operation is destructive: uncommitted changes are lost. An I/O
//! failure mid-apply leaves the directory in a best-effort partial state;
//! full-directory atomic replacement is not attempted.

pub mod migration;
