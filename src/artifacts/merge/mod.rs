//! Merge algorithms
//!
//! - `bca_finder`: best common ancestor search over the commit graph
//! - `three_way`: per-path three-way resolution of (base, source, target)
//!   trees with explicit conflict detection

pub mod bca_finder;
pub mod three_way;
