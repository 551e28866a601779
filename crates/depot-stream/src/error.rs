use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("result store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed record at line {line}: {source}")]
    Malformed {
        line:   usize,
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("result writer lock poisoned")]
    Poisoned,

    #[error("result reader is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
