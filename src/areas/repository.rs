use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use anyhow::Context;
use file_guard::{FileGuard, Lock};
use std::fs::File;
use std::path::Path;

/// Name of the metadata directory inside the tracked project
pub const VCS_DIR: &str = ".tuck";

/// Name of the store-wide lock file inside the metadata directory
pub const LOCK_FILE: &str = "lock";

/// A tracked project directory
///
/// Aggregates the object store, working directory and branch table and hosts
/// every public operation (`init`, `snapshot`, `merge`, `checkout`, `switch`,
/// `history`, branch management).
pub struct Repository {
    path: Box<Path>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

/// Exclusive lock over the object store, commit graph and branch table
///
/// Held by every mutating operation for its whole duration, so commit
/// creation and branch pointer updates act as one logical unit. Dropped on
/// scope exit; the underlying advisory lock releases with the file handle.
pub struct StoreLock {
    _guard: FileGuard<Box<File>>,
}

impl Repository {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;

        let database = Database::new(path.join(VCS_DIR).join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(path.join(VCS_DIR).into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vcs_path(&self) -> Box<Path> {
        self.path.join(VCS_DIR).into_boxed_path()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Take the store-wide exclusive lock.
    ///
    /// Mutating operations hold it until they finish so readers in other
    /// processes never see a commit written but its branch pointer not yet
    /// advanced within the same operation.
    pub(crate) fn lock_store(&self) -> anyhow::Result<StoreLock> {
        let lock_path = self.vcs_path().join(LOCK_FILE);
        let lock_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file at {}", lock_path.display()))?;

        let guard = file_guard::lock(Box::new(lock_file), Lock::Exclusive, 0, 1)
            .context("failed to acquire the store lock")?;

        Ok(StoreLock { _guard: guard })
    }
}
