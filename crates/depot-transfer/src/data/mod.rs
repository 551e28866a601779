//! Immutable configuration and records.

pub mod config;
pub mod remote;
pub mod service;
pub mod summary;
pub mod task;

pub use config::{DEFAULT_COMMIT_MAX_POLLS, GIB, KIB, MAX_MULTIPART_SIZE, MIB, TIB, TransferConfig};
pub use remote::{MultipartSession, MultipartStatus, PutBody, PutRequest, PutResponse, StatusResponse};
pub use service::{ArtifactoryDetails, Auth, DistributionDetails, ServiceDetails};
pub use summary::{ArtifactDetails, Summary, TransferDetails};
pub use task::{Outcome, Placed, Strategy, TransferOutcome, TransferTask};
