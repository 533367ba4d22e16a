//! Core data structures and algorithms
//!
//! This module contains the repository's types and algorithms:
//!
//! - `branch`: Branch name validation and symbolic ref names
//! - `checkout`: Working-directory migration planning
//! - `core`: Shared utilities (error taxonomy)
//! - `database`: Database entry types
//! - `diff`: Recursive tree diffing
//! - `log`: Commit history traversal
//! - `merge`: Common ancestor search and three-way tree merging
//! - `objects`: Object types (blob, tree, commit)
//! - `snapshot`: Working-directory snapshot entries and file modes

pub mod branch;
pub mod checkout;
pub mod core;
pub mod database;
pub mod diff;
pub mod log;
pub mod merge;
pub mod objects;
pub mod snapshot;
