use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result, from_io};

/// A file written beside its final destination and moved into place on commit.
///
/// The staging file lives in the destination's directory so the final rename never
/// crosses a filesystem boundary. Dropping an uncommitted `StagedFile` removes it.
pub struct StagedFile {
    destination: PathBuf,
    temp:        NamedTempFile,
}

impl StagedFile {
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        if destination.is_dir() {
            return Err(Error::IsDirectory { path: destination });
        }
        let parent = crate::ensure_parent_dir(&destination)?;
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(|e| from_io(e, &parent))?;

        Ok(Self { destination, temp })
    }

    pub fn path(&self) -> &Path { self.temp.path() }

    pub fn destination(&self) -> &Path { &self.destination }

    pub fn file_mut(&mut self) -> &mut File { self.temp.as_file_mut() }

    /// Open an independent handle to the staging file, e.g. for async writers.
    pub fn reopen(&self) -> Result<File> { self.temp.reopen().map_err(|e| from_io(e, self.temp.path())) }

    /// Rename the staging file over the destination, replacing any existing file.
    pub fn commit(self) -> Result<PathBuf> {
        let destination = self.destination;
        self.temp.persist(&destination).map_err(|e| Error::Persist {
            path:   destination.clone(),
            source: e.error,
        })?;
        Ok(destination)
    }
}
