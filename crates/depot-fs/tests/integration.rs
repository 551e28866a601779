use std::io::Write;

use depot_fs::{Error, StagedFile, ensure_dir, ensure_parent_dir, remove_file_if_exists};
use tempfile::tempdir;

#[test]
fn test_ensure_dir_is_idempotent() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a/b/c");

    ensure_dir(&nested).unwrap();
    ensure_dir(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn test_ensure_parent_dir_bare_file_name() {
    let parent = ensure_parent_dir("file.txt").unwrap();
    assert_eq!(parent, std::path::PathBuf::from("."));
}

#[test]
fn test_staged_file_replaces_existing() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("existing.txt");
    std::fs::write(&dest, "original").unwrap();

    let mut staged = StagedFile::new(&dest).unwrap();
    staged.file_mut().write_all(b"new content").unwrap();
    staged.commit().unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new content");
}

#[test]
fn test_staged_file_reopen_shares_content() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("shared.bin");

    let staged = StagedFile::new(&dest).unwrap();
    let mut handle = staged.reopen().unwrap();
    handle.write_all(b"through handle").unwrap();
    drop(handle);
    staged.commit().unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"through handle");
}

#[test]
fn test_remove_file_if_exists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.txt");

    remove_file_if_exists(&path).unwrap();
    std::fs::write(&path, "x").unwrap();
    remove_file_if_exists(&path).unwrap();

    assert!(!path.exists());
}

#[test]
fn test_error_carries_path() {
    let dir = tempdir().unwrap();
    let err = StagedFile::new(dir.path()).err().unwrap();
    assert!(matches!(err, Error::IsDirectory { .. }));
    assert_eq!(err.path(), dir.path());
}
