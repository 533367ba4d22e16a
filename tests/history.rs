mod common;

use assert_fs::TempDir;
use common::file::{FileSpec, write_file};
use common::{init_repository, repository_dir, seeded_repository_dir, tip};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tuck::areas::repository::Repository;
use tuck::artifacts::core::error::VcsError;

#[rstest]
fn history_lists_commits_newest_first(seeded_repository_dir: TempDir) {
    let repository = Repository::new(seeded_repository_dir.path()).expect("Failed to open");

    write_file(FileSpec::new(
        seeded_repository_dir.path().join("1.txt"),
        "uno".to_string(),
    ));
    repository
        .snapshot("main", "Second snapshot")
        .expect("Failed to snapshot");

    write_file(FileSpec::new(
        seeded_repository_dir.path().join("1.txt"),
        "ein".to_string(),
    ));
    repository
        .snapshot("main", "Third snapshot")
        .expect("Failed to snapshot");

    let history = repository.history("main").expect("Failed to read history");
    let messages: Vec<&str> = history.iter().map(|(_, commit)| commit.message()).collect();

    assert_eq!(
        messages,
        vec!["Third snapshot", "Second snapshot", "Initial snapshot"]
    );

    // newest first, and no commit precedes its child
    for window in history.windows(2) {
        assert!(window[0].1.timestamp() >= window[1].1.timestamp());
    }
}

#[rstest]
fn history_spans_both_parents_of_a_merge(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "1".to_string(),
    ));
    let main_tip = repository
        .snapshot("main", "Seed a.txt")
        .expect("Failed to snapshot");

    repository
        .create_branch("feature", main_tip.as_ref())
        .expect("Failed to create branch");
    write_file(FileSpec::new(
        repository_dir.path().join("a.txt"),
        "2".to_string(),
    ));
    let feature_tip = repository
        .snapshot("feature", "Change a.txt")
        .expect("Failed to snapshot");

    let merge_oid = repository
        .merge("feature", "main", "Merge feature into main")
        .expect("Failed to merge");

    let history = repository.history("main").expect("Failed to read history");
    let ids: Vec<_> = history.iter().map(|(oid, _)| oid.clone()).collect();

    assert_eq!(history[0].1.parents().len(), 2);
    assert_eq!(ids[0], merge_oid);
    assert!(ids.contains(&feature_tip));
    assert!(ids.contains(&main_tip));
    assert_eq!(ids.len(), 3);
}

#[rstest]
fn history_of_an_unknown_branch_fails(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let error = repository
        .history("ghost")
        .expect_err("history of a missing branch must fail");

    assert!(matches!(
        error.downcast_ref::<VcsError>(),
        Some(VcsError::UnknownBranch(_))
    ));
}

#[rstest]
fn ancestors_walk_is_reinvokable_from_scratch(seeded_repository_dir: TempDir) {
    let repository = Repository::new(seeded_repository_dir.path()).expect("Failed to open");

    write_file(FileSpec::new(
        seeded_repository_dir.path().join("1.txt"),
        "uno".to_string(),
    ));
    repository
        .snapshot("main", "Second snapshot")
        .expect("Failed to snapshot");

    let start = tip(&repository, "main");

    let first_walk: Vec<_> = repository
        .ancestors(start.clone())
        .expect("Failed to start walk")
        .collect::<anyhow::Result<Vec<_>>>()
        .expect("walk failed")
        .into_iter()
        .map(|(oid, _)| oid)
        .collect();
    let second_walk: Vec<_> = repository
        .ancestors(start)
        .expect("Failed to start walk")
        .collect::<anyhow::Result<Vec<_>>>()
        .expect("walk failed")
        .into_iter()
        .map(|(oid, _)| oid)
        .collect();

    assert_eq!(first_walk, second_walk);
    assert_eq!(first_walk.len(), 2);
}

#[rstest]
fn current_branch_defaults_to_main(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let current = repository
        .current_branch()
        .expect("Failed to read current branch")
        .expect("HEAD is detached");

    assert_eq!(current.as_ref(), "main");

    let branches = repository.list_branches().expect("Failed to list branches");
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].as_ref(), "main");
}

#[rstest]
fn commits_record_their_branch_label(seeded_repository_dir: TempDir) {
    let repository = Repository::new(seeded_repository_dir.path()).expect("Failed to open");

    let history = repository.history("main").expect("Failed to read history");
    assert_eq!(history[0].1.branch().as_ref(), "main");
}
