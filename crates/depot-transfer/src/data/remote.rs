use std::path::PathBuf;

use depot_spec::Properties;
use depot_verify::Checksums;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PutBody {
    /// Streamed from disk by the client.
    File(PathBuf),
    /// Directory creation, or an empty artifact when the target has no trailing `/`.
    Empty,
}

/// A deploy request handed to [`TransferClient::put`](crate::TransferClient::put).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRequest {
    pub target:     String,
    pub body:       PutBody,
    pub checksums:  Checksums,
    pub size:       u64,
    pub properties: Properties,
    /// Ask the remote to extract the archive at the target.
    pub explode:    bool,
}

impl PutRequest {
    pub fn file(target: impl Into<String>, path: impl Into<PathBuf>, checksums: Checksums, size: u64) -> Self {
        Self {
            target: target.into(),
            body: PutBody::File(path.into()),
            checksums,
            size,
            properties: Properties::new(),
            explode: false,
        }
    }

    /// Directory targets always end in `/`.
    pub fn directory(target: &str) -> Self {
        let target = if target.ends_with('/') { target.to_string() } else { format!("{target}/") };
        Self {
            target,
            body: PutBody::Empty,
            checksums: Checksums::default(),
            size: 0,
            properties: Properties::new(),
            explode: false,
        }
    }

    /// Zero-length artifact, used to record symbolic links.
    pub fn empty(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            body: PutBody::Empty,
            checksums: Checksums::default(),
            size: 0,
            properties: Properties::new(),
            explode: false,
        }
    }

    #[must_use]
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }
}

/// Digests the remote recorded for a deploy. Empty when the remote sent none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutResponse {
    pub checksums: Checksums,
}

/// Token returned by the remote when a multipart upload is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartSession {
    pub token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultipartStatus {
    Parts,
    Queued,
    Processing,
    Finished,
    RetryableError,
    NonRetryableError,
    Aborted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status:         MultipartStatus,
    #[serde(default)]
    pub error:          String,
    #[serde(default)]
    pub progress:       Option<u32>,
    #[serde(default)]
    pub checksum_token: String,
}

impl StatusResponse {
    pub fn new(status: MultipartStatus) -> Self {
        Self { status, error: String::new(), progress: None, checksum_token: String::new() }
    }
}
