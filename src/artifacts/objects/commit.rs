//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history; merge commits carry two)
//! - The branch the commit was created on
//! - Creation timestamp
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! branch <name>
//! date <rfc3339-timestamp>
//!
//! <commit message>
//! ```

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Write};

/// Resolve the timestamp for a new commit
///
/// Reads `TUCK_COMMIT_DATE` (RFC 3339 or `%Y-%m-%d %H:%M:%S %z`) so histories
/// can be reproduced exactly; falls back to the current local time. Timestamps
/// keep nanosecond precision, which also keeps ancestor traversal ordering
/// stable for commits created in quick succession.
pub fn commit_timestamp() -> chrono::DateTime<chrono::FixedOffset> {
    std::env::var("TUCK_COMMIT_DATE")
        .ok()
        .and_then(|date_str| {
            chrono::DateTime::parse_from_rfc3339(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        })
        .unwrap_or_else(|| chrono::Local::now().fixed_offset())
}

/// Slim representation of a commit
///
/// Contains only what ancestor traversal needs: identity, parents, and the
/// timestamp used for ordering.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    /// The commit's object ID
    pub oid: ObjectId,
    /// The commit's parent object IDs
    pub parents: Vec<ObjectId>,
    /// Commit timestamp (needed for comparison)
    pub timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl PartialOrd for SlimCommit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlimCommit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp.cmp(&other.timestamp)
    }
}

/// Commit object
///
/// An immutable record linking a tree to its parent commit(s), labelled with
/// the branch it was created on.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for initial commit, two for merge commits)
    parents: Vec<ObjectId>,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Branch the commit was created on
    branch: BranchName,
    /// Creation timestamp
    timestamp: chrono::DateTime<chrono::FixedOffset>,
    /// Commit message
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        branch: BranchName,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            branch,
            timestamp,
            message,
        }
    }

    /// Get the first line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut object_content = vec![];

        object_content.push(format!("tree {}", self.tree_oid.as_ref()));
        for parent in &self.parents {
            object_content.push(format!("parent {}", parent.as_ref()));
        }
        object_content.push(format!("branch {}", self.branch));
        object_content.push(format!("date {}", self.timestamp.to_rfc3339()));
        object_content.push(String::new());
        object_content.push(self.message.to_string());

        let object_content = object_content.join("\n");

        let mut content_bytes = Vec::new();
        content_bytes.write_all(object_content.as_bytes())?;

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        let content = String::from_utf8(content)?;
        let mut lines = content.lines();

        let tree_line = lines
            .next()
            .context("Invalid commit object: missing tree line")?;
        let tree_oid = tree_line
            .strip_prefix("tree ")
            .context("Invalid commit object: invalid tree line")?
            .to_string();
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        // Parse all parent lines (there can be 0, 1, or multiple parents)
        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .context("Invalid commit object: missing branch line")?;

        while next_line.starts_with("parent ") {
            let parent_oid = next_line
                .strip_prefix("parent ")
                .context("Invalid commit object: invalid parent line")?;
            parents.push(ObjectId::try_parse(parent_oid.to_string())?);

            next_line = lines
                .next()
                .context("Invalid commit object: missing branch line")?;
        }

        // At this point, next_line should be the branch line
        let branch = next_line
            .strip_prefix("branch ")
            .context("Invalid commit object: invalid branch line")?;
        let branch = BranchName::try_parse(branch.to_string())?;

        let date_line = lines
            .next()
            .context("Invalid commit object: missing date line")?;
        let date = date_line
            .strip_prefix("date ")
            .context("Invalid commit object: invalid date line")?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(date)
            .context("Invalid commit object: invalid date value")?;

        // skip the empty line
        lines.next();

        let message = lines.collect::<Vec<&str>>().join("\n");
        Ok(Self::new(parents, tree_oid, branch, timestamp, message))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn oid(fill: &str) -> ObjectId {
        ObjectId::try_parse(fill.repeat(64)).unwrap()
    }

    #[test]
    fn serialize_then_deserialize_round_trips() {
        let commit = Commit::new(
            vec![oid("a"), oid("b")],
            oid("c"),
            BranchName::try_parse("main".to_string()).unwrap(),
            commit_timestamp(),
            "Merge topic into main\n\nwith a body".to_string(),
        );

        let serialized = commit.serialize().unwrap();
        let mut reader = Cursor::new(serialized);
        let object_type = ObjectType::parse_object_type(&mut reader).unwrap();
        assert_eq!(object_type, ObjectType::Commit);

        let read_back = Commit::deserialize(reader).unwrap();
        assert_eq!(read_back, commit);
    }

    #[test]
    fn root_commits_have_no_parents() {
        let commit = Commit::new(
            vec![],
            oid("c"),
            BranchName::try_parse("main".to_string()).unwrap(),
            commit_timestamp(),
            "Initial snapshot".to_string(),
        );

        let serialized = commit.serialize().unwrap();
        let mut reader = Cursor::new(serialized);
        ObjectType::parse_object_type(&mut reader).unwrap();

        let read_back = Commit::deserialize(reader).unwrap();
        assert!(read_back.parent().is_none());
        assert_eq!(read_back.short_message(), "Initial snapshot");
    }
}
