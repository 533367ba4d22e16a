#![allow(dead_code)]

pub mod file;

use assert_fs::TempDir;
use file::{FileSpec, write_file};
use rstest::fixture;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tuck::areas::repository::Repository;
use tuck::artifacts::objects::object_id::ObjectId;
use walkdir::WalkDir;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Open a repository over an existing directory and initialize it.
pub fn init_repository(dir: &Path) -> Repository {
    let repository = Repository::new(dir).expect("Failed to open repository");
    repository.init().expect("Failed to initialize repository");
    repository
}

/// Repository directory seeded with three files committed on `main`.
#[fixture]
pub fn seeded_repository_dir(repository_dir: TempDir) -> TempDir {
    let repository = init_repository(repository_dir.path());

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    repository
        .snapshot("main", "Initial snapshot")
        .expect("Failed to record the initial snapshot");

    repository_dir
}

/// Read every tracked file (path -> content), ignoring the metadata directory.
pub fn read_workspace_state(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".tuck")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("walked outside the workspace")
                .to_path_buf();
            let content = std::fs::read_to_string(entry.path()).expect("Failed to read file");
            (relative, content)
        })
        .collect()
}

/// Newest commit id on a branch.
pub fn tip(repository: &Repository, branch: &str) -> ObjectId {
    repository.history(branch).expect("Failed to read history")[0]
        .0
        .clone()
}
