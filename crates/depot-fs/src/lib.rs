//! Filesystem primitives used by the transfer engine.
//!
//! - [`StagedFile`] - write beside the destination, rename on commit, clean up on drop
//! - [`ensure_dir`] / [`ensure_parent_dir`] - idempotent directory creation

mod error;
mod staged;

pub use error::{Error, Result, from_io};
pub use staged::StagedFile;

use std::path::{Path, PathBuf};

/// Create `path` and all of its parents if missing.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path:   path.to_path_buf(),
        source: e,
    })
}

/// Create the parent directory of `path` and return it. A bare file name resolves to `.`.
pub fn ensure_parent_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let parent = match path.as_ref().parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&parent)?;
    Ok(parent)
}

/// Remove a file, treating a missing file as success.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(from_io(e, path)),
    }
}
