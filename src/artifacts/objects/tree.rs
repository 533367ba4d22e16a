//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<32-byte-sha256>`
//!
//! Entries are kept ordered by name, so two identical directory states always
//! serialize to the same bytes and therefore share one hash, regardless of the
//! order the walk discovered them in or of any commit history.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::snapshot::entry_mode::EntryMode;
use crate::artifacts::snapshot::snapshot_entry::SnapshotEntry;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Internal tree entry representation
#[derive(Debug, Clone)]
enum TreeEntry {
    /// File entry (blob)
    File(SnapshotEntry),
    /// Directory entry (nested tree)
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::File(entry) => EntryMode::File(entry.mode.clone()),
            TreeEntry::Directory(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::File(entry) => Ok(entry.oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// Tree object representing a directory snapshot
///
/// Trees maintain two sets of entries:
/// - `readable_entries`: For trees loaded from the database
/// - `writeable_entries`: For trees being built from snapshot entries
///
/// This dual representation allows efficient reading and writing of tree objects.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// Entries loaded from database (read mode)
    readable_entries: BTreeMap<String, DatabaseEntry>,
    /// Entries being built (write mode)
    writeable_entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from flat snapshot entries
    ///
    /// Creates a hierarchical tree structure from a flat list of entries.
    /// Files are organized into directories matching their path structure.
    pub fn build<'e>(entries: impl Iterator<Item = &'e SnapshotEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let parents = entry.parent_dirs()?;
            root.add_entry(parents, entry)?;
        }

        Ok(root)
    }

    /// Traverse the tree depth-first, calling a function on each node
    ///
    /// Visits children before parents (post-order traversal), which is
    /// necessary for storing trees since child OIDs must be known before
    /// storing the parent.
    pub fn traverse<F>(&self, func: &F) -> anyhow::Result<()>
    where
        F: Fn(&Tree) -> anyhow::Result<()>,
    {
        for entry in &self.writeable_entries {
            if let TreeEntry::Directory(tree) = entry.1 {
                tree.traverse(func)?;
            }
        }
        func(self)?;

        Ok(())
    }

    /// Add an entry to the tree at the appropriate location
    ///
    /// Creates intermediate directory entries as needed.
    fn add_entry(&mut self, parents: Vec<&Path>, entry: &SnapshotEntry) -> anyhow::Result<()> {
        if parents.is_empty() {
            self.writeable_entries.insert(
                entry.basename()?.to_string(),
                TreeEntry::File(entry.clone()),
            );
        } else {
            let parent = parents[0]
                .file_name()
                .and_then(|s| s.to_str())
                .context("Invalid parent")?;
            // directory keys carry a trailing '/' so they sort like git's tree order
            let parent = format!("{}/", parent);
            let tree = match self.writeable_entries.get_mut(&parent) {
                Some(TreeEntry::Directory(tree)) => tree,
                _ => {
                    let tree = Self::default();
                    self.writeable_entries
                        .insert(parent.to_string(), TreeEntry::Directory(tree.clone()));

                    match self.writeable_entries.get_mut(&parent) {
                        Some(TreeEntry::Directory(tree)) => tree,
                        _ => unreachable!(),
                    }
                }
            };
            tree.add_entry(parents[1..].to_vec(), entry)?;
        }

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.readable_entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.readable_entries.into_iter()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content_bytes: Bytes = self
            .writeable_entries
            .iter()
            .map(|(name, tree_entry)| {
                let mut entry_bytes = Vec::new();
                let name = name.trim_end_matches('/'); // Remove trailing '/' for directories

                let header = format!("{:o} {}", tree_entry.mode().as_u32(), name);
                entry_bytes.write_all(header.as_bytes())?;
                entry_bytes.push(0);
                tree_entry.oid()?.write_h64_to(&mut entry_bytes)?;

                Ok(Bytes::from(entry_bytes))
            })
            .collect::<anyhow::Result<Vec<Bytes>>>()?
            .into_iter()
            .fold(Vec::new(), |mut acc, entry_bytes| {
                acc.extend(entry_bytes);
                acc
            })
            .into();

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            // Must end with ' ' or it's malformed
            if *mode_bytes.last().unwrap() != b' ' {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            mode_bytes.pop(); // drop the space

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            // Read "name\0"
            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || *name_bytes.last().unwrap() != b'\0' {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            name_bytes.pop(); // drop NUL
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            // Read object id
            let oid =
                ObjectId::read_h64_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: Default::default(),
        })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::blob::Blob;
    use crate::artifacts::objects::object_type::ObjectType;
    use crate::artifacts::snapshot::entry_mode::FileMode;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn entry(path: &str, content: &str) -> SnapshotEntry {
        let blob = Blob::new(Bytes::from(content.as_bytes().to_vec()), FileMode::Regular);
        SnapshotEntry::new(PathBuf::from(path), blob.object_id().unwrap(), FileMode::Regular)
    }

    #[test]
    fn identical_entry_sets_produce_identical_hashes() {
        let entries = vec![entry("1.txt", "one"), entry("a/2.txt", "two")];
        let first = Tree::build(entries.iter()).unwrap().object_id().unwrap();
        let second = Tree::build(entries.iter()).unwrap().object_id().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn changing_any_content_changes_the_root_hash() {
        let original = vec![entry("1.txt", "one"), entry("a/2.txt", "two")];
        let edited = vec![entry("1.txt", "one"), entry("a/2.txt", "TWO")];

        let original_oid = Tree::build(original.iter()).unwrap().object_id().unwrap();
        let edited_oid = Tree::build(edited.iter()).unwrap().object_id().unwrap();

        assert_ne!(original_oid, edited_oid);
    }

    #[test]
    fn serialize_then_deserialize_preserves_entries() {
        let entries = vec![
            entry("1.txt", "one"),
            entry("a/2.txt", "two"),
            entry("a/b/3.txt", "three"),
        ];
        let tree = Tree::build(entries.iter()).unwrap();

        let serialized = tree.serialize().unwrap();
        let mut reader = Cursor::new(serialized);
        let object_type = ObjectType::parse_object_type(&mut reader).unwrap();
        assert_eq!(object_type, ObjectType::Tree);

        let read_back = Tree::deserialize(reader).unwrap();
        let names: Vec<&String> = read_back.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["1.txt", "a"]);

        let a_entry = read_back.entries().find(|(name, _)| *name == "a").unwrap().1;
        assert!(a_entry.is_tree());
    }

    proptest! {
        #[test]
        fn tree_hash_is_independent_of_entry_order(
            files in proptest::collection::btree_map(
                "[a-z]{1,8}(/[a-z]{1,8})?",
                "[ -~]{0,32}",
                1..10,
            )
        ) {
            let entries: Vec<SnapshotEntry> = files
                .iter()
                .map(|(path, content)| entry(path, content))
                .collect();
            let reversed: Vec<SnapshotEntry> = entries.iter().rev().cloned().collect();

            let forward = Tree::build(entries.iter()).unwrap().object_id().unwrap();
            let backward = Tree::build(reversed.iter()).unwrap().object_id().unwrap();

            prop_assert_eq!(forward, backward);
        }
    }
}
