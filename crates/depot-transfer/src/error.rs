//! Error taxonomy for transfer sessions.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    Integrity {
        path:     PathBuf,
        expected: String,
        actual:   String,
    },

    #[error("multipart upload failed: {0}")]
    MultipartFailed(String),

    #[error("max retries exceeded ({count} attempts): {last}")]
    MaxRetriesExceeded { count: u32, last: Box<TransferError> },

    #[error("session deadline exceeded")]
    DeadlineExceeded,

    #[error("no files were affected")]
    NoOp,

    #[error(transparent)]
    Fs(#[from] depot_fs::Error),

    #[error(transparent)]
    Archive(#[from] depot_archive::Error),

    #[error("result store: {0}")]
    Stream(#[from] depot_stream::Error),
}

impl TransferError {
    /// Whether the same task may be attempted again.
    ///
    /// Network failures, timeouts, transient I/O, 5xx, 408 and 429 are retryable.
    /// Other 4xx and integrity failures are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Network(_) | Self::Timeout | Self::Io(_) => true,
            _ => false,
        }
    }

    /// Errors that abort the whole session rather than a single file.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Resolution(_) | Self::DeadlineExceeded | Self::NoOp)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self { Self::Http { status, message: message.into() } }
}

impl From<depot_spec::Error> for TransferError {
    fn from(e: depot_spec::Error) -> Self {
        if e.is_configuration() {
            Self::Configuration(e.to_string())
        } else {
            Self::Resolution(e.to_string())
        }
    }
}

impl From<depot_verify::VerificationError> for TransferError {
    fn from(e: depot_verify::VerificationError) -> Self {
        match e {
            depot_verify::VerificationError::Io(e) => Self::Io(e),
            depot_verify::VerificationError::Mismatch { expected, actual } => Self::Integrity {
                path: PathBuf::new(),
                expected,
                actual,
            },
            other => Self::Io(std::io::Error::other(other)),
        }
    }
}

impl From<tokio::task::JoinError> for TransferError {
    fn from(e: tokio::task::JoinError) -> Self { Self::Io(std::io::Error::other(e)) }
}

impl From<figment::Error> for TransferError {
    fn from(e: figment::Error) -> Self { Self::Configuration(e.to_string()) }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransferError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::http(status.as_u16(), e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
