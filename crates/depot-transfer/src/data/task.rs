use depot_spec::{Candidate, Properties, UploadCandidate};
use depot_verify::Checksums;
use serde::{Deserialize, Serialize};

use crate::error::TransferError;

/// How a file reached its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Whole-body PUT or GET.
    Direct,
    /// Placed by digest reference, no body sent.
    ChecksumDeploy,
    Multipart,
    /// Transferred and extracted, on the server for uploads or locally for downloads.
    Explode,
    /// Directory created, no content.
    Folder,
    /// Local file already held the remote content.
    Cached,
    /// A symbolic link, recorded by property on upload and recreated on download.
    Symlink,
    /// Nothing was sent or written.
    DryRun,
}

/// One unit of work for the worker pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferTask {
    Upload(UploadCandidate),
    Download(Candidate),
}

impl TransferTask {
    pub fn source(&self) -> &str {
        match self {
            Self::Upload(c) => &c.local_path,
            Self::Download(c) => &c.repo_path,
        }
    }

    /// Remote path for uploads, local path for downloads. Collisions are detected on it.
    pub fn destination(&self) -> &str {
        match self {
            Self::Upload(c) => &c.target,
            Self::Download(c) => &c.destination,
        }
    }

    /// Repository path of the artifact, whichever side it is on.
    pub fn remote_path(&self) -> &str {
        match self {
            Self::Upload(c) => &c.target,
            Self::Download(c) => &c.repo_path,
        }
    }

    pub fn is_folder(&self) -> bool {
        match self {
            Self::Upload(c) => c.is_dir,
            Self::Download(c) => c.is_folder,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Self::Upload(c) => &c.properties,
            Self::Download(c) => &c.properties,
        }
    }
}

/// What an executor reports for a successful placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placed {
    pub strategy:  Strategy,
    pub bytes:     u64,
    pub checksums: Checksums,
}

impl Placed {
    pub fn new(strategy: Strategy, bytes: u64, checksums: Checksums) -> Self { Self { strategy, bytes, checksums } }

    pub fn folder() -> Self { Self::new(Strategy::Folder, 0, Checksums::default()) }
}

/// Terminal result of one task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub source:      String,
    pub target:      String,
    pub remote_path: String,
    pub success:     bool,
    pub error:       Option<String>,
    pub bytes:       u64,
    pub sha256:      String,
    pub duration_ms: u64,
    pub strategy:    Option<Strategy>,
    pub checksums:   Checksums,
    pub properties:  Properties,
}

impl TransferOutcome {
    pub fn succeeded(task: &TransferTask, placed: Placed, duration_ms: u64) -> Self {
        Self {
            source: task.source().to_string(),
            target: task.destination().to_string(),
            remote_path: task.remote_path().to_string(),
            success: true,
            error: None,
            bytes: placed.bytes,
            sha256: placed.checksums.sha256.clone(),
            duration_ms,
            strategy: Some(placed.strategy),
            checksums: placed.checksums,
            properties: task.properties().clone(),
        }
    }

    pub fn failed(task: &TransferTask, error: &TransferError, duration_ms: u64) -> Self {
        Self {
            source: task.source().to_string(),
            target: task.destination().to_string(),
            remote_path: task.remote_path().to_string(),
            success: false,
            error: Some(error.to_string()),
            bytes: 0,
            sha256: String::new(),
            duration_ms,
            strategy: None,
            checksums: Checksums::default(),
            properties: task.properties().clone(),
        }
    }
}

/// What the aggregator receives from the dispatcher and the workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed(TransferOutcome),
    /// Destination already claimed by an earlier dispatch.
    Skipped { source: String, destination: String },
}
