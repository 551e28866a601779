//! Concurrent artifact upload and download against a binary repository manager.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - configuration, service details, task and summary records
//! - [`core`] - pure decisions: strategy selection, part layout, retry timing, task state
//! - [`effects`] - the [`TransferClient`] seam, the `reqwest` client, executors and the session
//!
//! # Key Features
//!
//! - **Cheapest Correct Strategy**: checksum deploy, then multipart, then a plain PUT
//! - **Bounded Workers**: a fixed pool fed through a small read-ahead buffer
//! - **First Dispatch Wins**: colliding destinations are skipped, never overwritten
//! - **Disk-Backed Summaries**: transfer and artifact logs spool to temporary files

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{Part, TaskState, UploadPlan, is_cached, part_size_mb, plan_parts, plan_upload, retry_delay};
pub use data::{
    ArtifactDetails, ArtifactoryDetails, Auth, DEFAULT_COMMIT_MAX_POLLS, DistributionDetails, GIB, KIB,
    MAX_MULTIPART_SIZE, MIB, MultipartSession, MultipartStatus, Outcome, Placed, PutBody, PutRequest, PutResponse,
    ServiceDetails, StatusResponse, Strategy, Summary, TIB, TransferConfig, TransferDetails, TransferOutcome,
    TransferTask,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use effects::{BoxStream, MultipartSupport, TransferClient, TransferSession};
pub use error::{Result, TransferError};
