use crate::areas::repository::{LOCK_FILE, Repository};
use anyhow::Context;
use std::fs;

pub const DEFAULT_BRANCH: &str = "main";

impl Repository {
    /// Initialize the metadata directory.
    ///
    /// Creates the object store, the refs layout, an unborn default branch and
    /// the store lock file. Safe to call on an already initialized repository.
    pub fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create the objects directory")?;

        fs::create_dir_all(self.refs().refs_path()).context("Failed to create the refs directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create the refs/heads directory")?;

        self.refs()
            .set_head(DEFAULT_BRANCH, format!("ref: refs/heads/{}", DEFAULT_BRANCH))
            .context("Failed to create initial HEAD reference")?;

        // make sure the DEFAULT_BRANCH file exists
        let head_ref_path = self.refs().heads_path().join(DEFAULT_BRANCH);
        if !head_ref_path.exists() {
            fs::write(&head_ref_path, b"").context("Failed to create default branch file")?;
        }

        // create the lock file taken by mutating operations
        let lock_path = self.vcs_path().join(LOCK_FILE);
        if !lock_path.exists() {
            fs::write(&lock_path, b"").context("Failed to create the lock file")?;
        }

        tracing::debug!(path = %self.path().display(), "initialized repository");

        Ok(())
    }
}
