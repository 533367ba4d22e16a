use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::core::error::VcsError;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::snapshot::entry_mode::FileMode;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".tuck", ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse_blob(&self, path: &Path) -> anyhow::Result<Blob> {
        let data = self.read_file(path)?;
        let mode = self.stat_mode(path)?;
        Ok(Blob::new(data, mode))
    }

    /// List every tracked file, relative to the workspace root, ordered by name.
    ///
    /// The walk order is deterministic so the trees built from it hash the
    /// same regardless of readdir order. Symlinks and other special files fail
    /// the walk with [`VcsError::SpecialFile`] instead of being skipped.
    pub fn list_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walk = WalkDir::new(self.path.as_ref())
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.path()));

        for entry in walk {
            let entry = entry.context("failed to walk the working directory")?;
            let relative_path = entry
                .path()
                .strip_prefix(self.path.as_ref())
                .context("walked outside the working directory")?
                .to_path_buf();

            let file_type = entry.file_type();
            if file_type.is_symlink() || (!file_type.is_file() && !file_type.is_dir()) {
                return Err(VcsError::SpecialFile(relative_path).into());
            }

            if file_type.is_file() {
                files.push(relative_path);
            }
        }

        Ok(files)
    }

    fn is_ignored(path: &Path) -> bool {
        // Check if any component of the path is in IGNORED_PATHS
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name_str = name.to_string_lossy();
                IGNORED_PATHS.contains(&name_str.as_ref())
            } else {
                false
            }
        })
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("Unable to read file {}", file_path.display()))?;

        Ok(content.into())
    }

    pub fn stat_mode(&self, file_path: &Path) -> anyhow::Result<FileMode> {
        let metadata = std::fs::metadata(self.path.join(file_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 != 0 {
                return Ok(FileMode::Executable);
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;

        Ok(FileMode::Regular)
    }

    // The order of applying migrations is important:
    // For deletions, we first delete files and then remove directories in reverse order.
    // For additions, we first create directories and then add/update files.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        self.apply_migration_action_set(migration, ActionType::Delete)?;
        // remove directories in reverse order so child directories go before parents
        for dir_path in migration.rmdirs().iter().rev() {
            self.remove_directory(dir_path)?;
        }

        // create directories in order so parent directories come before children
        for dir_path in migration.mkdirs().iter() {
            self.make_directory(dir_path)?;
        }
        self.apply_migration_action_set(migration, ActionType::Modify)?;
        self.apply_migration_action_set(migration, ActionType::Add)?;

        Ok(())
    }

    fn apply_migration_action_set(
        &self,
        migration: &Migration,
        action: ActionType,
    ) -> anyhow::Result<()> {
        let actions = migration
            .actions()
            .get(&action)
            .ok_or_else(|| anyhow::anyhow!("Invalid action type"))?;

        for (file_path, entry) in actions {
            let path = self.path.join(file_path);

            if path.exists() {
                let metadata = std::fs::metadata(&path)
                    .with_context(|| format!("Failed to get metadata for file: {:?}", file_path))?;

                if metadata.is_dir() {
                    std::fs::remove_dir_all(&path).with_context(|| {
                        format!("Failed to remove existing directory: {:?}", file_path)
                    })?;
                }

                if metadata.is_file() {
                    std::fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove file: {:?}", file_path))?;
                }
            }

            match (&action, entry) {
                (ActionType::Delete, None) => {}
                (ActionType::Add | ActionType::Modify, Some(entry)) => {
                    // read blob data
                    let data = migration.load_blob_data(&entry.oid)?;

                    let mut file = std::fs::OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .open(&path)
                        .with_context(|| format!("Failed to open file: {:?}", file_path))?;

                    // write data to file
                    file.write_all(&data)
                        .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

                    // update file mode if necessary
                    #[cfg(unix)]
                    {
                        use std::os::unix::fs::PermissionsExt;
                        let permissions = std::fs::Permissions::from_mode(entry.mode.as_u32());
                        std::fs::set_permissions(self.path.join(file_path), permissions)
                            .with_context(|| {
                                format!("Failed to set permissions for file: {:?}", file_path)
                            })?;
                    }
                }
                _ => return Err(anyhow::anyhow!("Invalid action and entry combination")),
            }
        }

        Ok(())
    }

    fn remove_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        let dir_path = self.path.join(dir_path);

        if !dir_path.exists() {
            return Ok(());
        }

        std::fs::remove_dir_all(dir_path)?;

        Ok(())
    }

    fn make_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        let dir_path = self.path.join(dir_path);

        if !dir_path.exists() {
            std::fs::create_dir(&dir_path)?;
            return Ok(());
        }

        let metadata = std::fs::metadata(&dir_path)?;
        // delete existing file if it's a file
        if metadata.is_file() {
            std::fs::remove_file(&dir_path)?;
        }

        if !metadata.is_dir() {
            std::fs::create_dir(dir_path)?;
        }

        Ok(())
    }
}
