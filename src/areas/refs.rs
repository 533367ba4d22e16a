//! References (branches and HEAD)
//!
//! This module manages the branch table: human-readable names pointing to
//! commits. References can be:
//! - Direct: Containing a commit SHA-256
//! - Symbolic: Pointing to another reference (e.g., HEAD -> refs/heads/main)
//!
//! ## File Format
//!
//! References are stored as text files containing either:
//! - A 64-character SHA-256 hash (direct reference)
//! - `ref: <path>` for symbolic references
//!
//! Ref files are written under an exclusive lock and swapped into place with
//! a rename, so a concurrent reader never observes a torn pointer.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::core::error::VcsError;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::path::Path;
use walkdir::WalkDir;

/// Branch table and HEAD manager
///
/// Handles reading and writing references. Provides safe concurrent access
/// through file locking.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the refs root (the `.tuck` directory)
    path: Box<Path>,
}

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Internal representation of a reference value
///
/// Can be either a symbolic reference or a direct object ID.
#[derive(Debug, Clone)]
enum SymRefOrOid {
    /// Symbolic reference pointing to another ref
    SymRef { sym_ref_name: SymRefName },
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

impl Refs {
    /// Check if a branch is the currently checked-out branch
    pub fn is_current_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        let current_ref = self.current_ref(None)?;

        if current_ref.is_detached_head() {
            return Ok(false);
        }

        Ok(branch_name == &BranchName::try_parse_sym_ref_name(&current_ref)?)
    }

    /// Get the current symbolic reference
    ///
    /// Follows symbolic references recursively to find the final direct
    /// reference. For example, if HEAD points to refs/heads/main, returns
    /// refs/heads/main.
    pub fn current_ref(&self, source: Option<SymRefName>) -> anyhow::Result<SymRefName> {
        let source = source.unwrap_or_else(|| SymRefName::new(HEAD_REF_NAME.to_string()));

        let ref_content =
            SymRefOrOid::read_symref_or_oid(self.path.join(source.as_ref_path()).as_path())?;

        match ref_content {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => Ok(self.current_ref(Some(sym_ref_name))?),
            Some(_) | None => Ok(source),
        }
    }

    /// Read a symbolic reference, following indirection
    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let ref_content = SymRefOrOid::read_symref_or_oid(path)?;

        match ref_content {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => {
                self.read_symref(self.path.join(sym_ref_name.as_ref_path()).as_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    pub fn set_head(&self, revision: &str, raw_ref: String) -> anyhow::Result<()> {
        let revision_path = self.heads_path().join(revision).into_boxed_path();

        if revision_path.exists() {
            self.update_ref_file(self.head_path(), format!("ref: refs/heads/{}", revision))
        } else {
            self.update_ref_file(self.head_path(), raw_ref)
        }
    }

    pub fn update_ref_file(&self, path: Box<Path>, raw_ref: String) -> anyhow::Result<()> {
        // create all the parent directories if they don't exist
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        // open the ref file as WRONLY and CREAT to take the writer lock on it
        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(path.clone())
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        // write the new pointer beside the ref and rename it into place, so a
        // concurrent reader sees the old value or the new one, never a torn
        // write (branch names ending in .lock are rejected, no ref can
        // collide with the swap file)
        let mut temp_path = path.to_path_buf().into_os_string();
        temp_path.push(".lock");
        let temp_path = std::path::PathBuf::from(temp_path);

        std::fs::write(&temp_path, raw_ref.as_bytes())
            .with_context(|| format!("failed to write ref swap file at {:?}", temp_path))?;
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("failed to swap ref file at {:?}", path))?;

        drop(lock);
        Ok(())
    }

    /// Whether a branch ref file exists (even if the branch is still unborn).
    pub fn branch_exists(&self, branch_name: &BranchName) -> bool {
        self.heads_path().join(branch_name.as_ref()).exists()
    }

    /// Read the commit a branch points to.
    ///
    /// Fails with [`VcsError::UnknownBranch`] when there is no ref file for
    /// the branch; returns `None` for an unborn branch (empty ref file).
    pub fn read_ref(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let ref_path = self.find_path_to_branch(branch_name)?;
        self.read_symref(&ref_path)
    }

    fn find_path_to_branch(&self, branch_name: &BranchName) -> anyhow::Result<Box<Path>> {
        // search for the branch ref file in .tuck, .tuck/refs and .tuck/refs/heads
        [self.path.clone(), self.refs_path(), self.heads_path()]
            .iter()
            .map(|base_path| base_path.join(branch_name.as_ref()).into_boxed_path())
            .find(|path| path.exists())
            .ok_or_else(|| VcsError::UnknownBranch(branch_name.clone()).into())
    }

    pub fn create_branch(&self, name: BranchName, source_oid: ObjectId) -> anyhow::Result<()> {
        let branch_path = self.heads_path().join(name.as_ref()).into_boxed_path();

        // check whether another branch with the same name already exists
        if branch_path.exists() && !name.is_default_branch() {
            anyhow::bail!("branch {} already exists", name);
        }

        self.update_ref_file(branch_path, source_oid.as_ref().into())
    }

    pub fn delete_branch(&self, name: &BranchName) -> anyhow::Result<ObjectId> {
        let branch_path = self.heads_path().join(name.as_ref()).into_boxed_path();

        let oid = self.read_symref(branch_path.as_ref())?;
        match oid {
            Some(oid) => {
                std::fs::remove_file(branch_path.as_ref()).with_context(|| {
                    format!("failed to delete branch file at {:?}", branch_path)
                })?;
                self.prune_branch_empty_parent_dirs(branch_path.as_ref())?;

                Ok(oid)
            }
            None => Err(VcsError::UnknownBranch(name.clone()).into()),
        }
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<SymRefName>> {
        Ok(WalkDir::new(self.heads_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                if entry.path().is_file() {
                    let relative_path = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                    Some(SymRefName::new(relative_path.to_string_lossy().to_string()))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>())
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.heads_path().as_ref()
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent).with_context(|| {
                format!("failed to remove empty branch directory at {:?}", parent)
            })?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
