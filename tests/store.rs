mod common;

use assert_fs::TempDir;
use bytes::Bytes;
use common::file::write_generated_files;
use common::{init_repository, repository_dir, tip};
use fake::Fake;
use fake::faker::lorem::en::Words;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use tuck::artifacts::core::error::VcsError;
use tuck::artifacts::objects::blob::Blob;
use tuck::artifacts::objects::object::Object;
use tuck::artifacts::objects::object_id::ObjectId;
use walkdir::WalkDir;

fn count_objects(root: &Path) -> usize {
    WalkDir::new(root.join(".tuck").join("objects"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}

#[rstest]
fn storing_identical_content_twice_writes_a_single_object(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let blob = Blob::new(Bytes::from_static(b"same bytes"), Default::default());
    let oid = blob.object_id().expect("Failed to hash blob");

    repository
        .database()
        .store(blob.clone())
        .expect("Failed to store blob");
    repository
        .database()
        .store(blob)
        .expect("Failed to store blob again");

    assert!(repository.database().contains(&oid));
    assert_eq!(count_objects(repository_dir.path()), 1);
}

#[rstest]
fn identical_content_always_hashes_identically(repository_dir: TempDir) {
    let _repository = init_repository(repository_dir.path());

    let content: String = Words(5..10).fake::<Vec<String>>().join(" ");
    let first = Blob::new(Bytes::from(content.clone().into_bytes()), Default::default());
    let second = Blob::new(Bytes::from(content.into_bytes()), Default::default());

    assert_eq!(
        first.object_id().expect("Failed to hash blob"),
        second.object_id().expect("Failed to hash blob")
    );
}

#[rstest]
fn loading_an_unknown_object_fails_with_not_found(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let oid = ObjectId::try_parse("0".repeat(64)).expect("Invalid test oid");
    let error = repository
        .database()
        .load(&oid)
        .expect_err("loading a missing object must fail");

    assert!(matches!(
        error.downcast_ref::<VcsError>(),
        Some(VcsError::NotFound(_))
    ));
}

#[rstest]
fn stored_blobs_read_back_with_identical_content(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let content: String = Words(5..10).fake::<Vec<String>>().join(" ");
    let blob = Blob::new(Bytes::from(content.clone().into_bytes()), Default::default());
    let oid = blob.object_id().expect("Failed to hash blob");

    repository
        .database()
        .store(blob)
        .expect("Failed to store blob");

    let read_back = repository
        .database()
        .parse_object_as_blob(&oid)
        .expect("Failed to load blob")
        .expect("object is not a blob");

    assert_eq!(read_back.content().as_ref(), content.as_bytes());
}

#[rstest]
fn commits_resolve_by_unique_abbreviation(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());
    write_generated_files(repository_dir.path(), 3);

    let commit_oid = repository
        .snapshot("main", "Initial snapshot")
        .expect("Failed to snapshot");

    let abbreviated = &commit_oid.as_ref()[..12];
    let resolved = repository
        .resolve_commit(abbreviated)
        .expect("Failed to resolve abbreviation");

    assert_eq!(resolved, commit_oid);
    assert_eq!(tip(&repository, "main"), commit_oid);
}

#[rstest]
fn unknown_revisions_fail_with_not_found(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path());

    let error = repository
        .resolve_commit(&"d".repeat(64))
        .expect_err("resolving a missing commit must fail");

    assert!(matches!(
        error.downcast_ref::<VcsError>(),
        Some(VcsError::NotFound(_))
    ));
}
