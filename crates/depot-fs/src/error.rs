use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("destination is a directory: {path}")]
    IsDirectory { path: PathBuf },

    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to persist staged file to {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn from_io(err: io::Error, path: &Path) -> Error {
    let path = path.to_path_buf();
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound { path },
        io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
        io::ErrorKind::IsADirectory => Error::IsDirectory { path },
        _ => Error::Io { path, source: err },
    }
}

impl Error {
    pub fn path(&self) -> &Path {
        match self {
            Error::NotFound { path }
            | Error::PermissionDenied { path }
            | Error::IsDirectory { path }
            | Error::CreateDir { path, .. }
            | Error::Persist { path, .. }
            | Error::Io { path, .. } => path,
        }
    }
}
