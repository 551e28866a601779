use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("target '{target}' references {{{index}}} but pattern '{pattern}' has {groups} group(s)")]
    UnmatchedPlaceholder {
        pattern: String,
        target:  String,
        index:   usize,
        groups:  usize,
    },

    #[error("invalid property '{0}': expected key=value[,value...]")]
    InvalidProperty(String),

    #[error("remote query failed: {0}")]
    Query(String),

    #[error("failed to scan {path}: {source}")]
    Scan {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resolver task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Stream(#[from] depot_stream::Error),
}

impl Error {
    /// Errors caused by the match specification itself, detected before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::UnmatchedPlaceholder { .. } | Self::InvalidProperty(_))
    }
}
