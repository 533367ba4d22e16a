//! Tree diffing
//!
//! Recursive comparison of two stored trees, producing a flat change set of
//! added, deleted and modified blob paths. Both the merge engine (base vs.
//! either side) and checkout rely on it.

pub mod tree_diff;
