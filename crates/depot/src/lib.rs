//! Bulk artifact transfer against a binary repository manager.
//!
//! # Architecture
//!
//! - [`spec`] - match specifications, placeholders and candidate resolution
//! - [`transfer`] - the transfer session, its collaborators and summaries
//! - [`stream`] - disk-backed result readers shared by queries and summaries
//! - [`verify`] - content digests
//! - [`fs`] / [`archive`] - staged writes and client-side extraction
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "reqwest")]
//! # async fn run() -> depot::Result<()> {
//! use depot::{ArtifactoryDetails, MatchSpec, ReqwestClient, TransferConfig, TransferSession};
//!
//! let details = ArtifactoryDetails::new("https://repo.example.com/artifactory").with_access_token("token");
//! let config = TransferConfig::load("depot.toml")?;
//! let client = ReqwestClient::new(&details, &config)?;
//! let session = TransferSession::new(client, config)?;
//!
//! let spec = MatchSpec::new("libs-release/org/acme/").target("downloads/").flat(true);
//! let mut summary = session.download(&[spec]).await?;
//! println!("{} succeeded, {} failed", summary.total_succeeded, summary.total_failed);
//! summary.close()?;
//! # Ok(())
//! # }
//! ```

pub use depot_archive as archive;
pub use depot_fs as fs;
pub use depot_spec as spec;
pub use depot_stream as stream;
pub use depot_transfer as transfer;
pub use depot_verify as verify;

pub use depot_spec::{Candidate, LocalResolver, MatchSpec, Properties, QueryClient, RemoteItem, RemoteResolver};
pub use depot_stream::{ResultReader, ResultWriter};
pub use depot_transfer::{
    ArtifactDetails, ArtifactoryDetails, Auth, DistributionDetails, Result, ServiceDetails, Strategy, Summary,
    TransferClient, TransferConfig, TransferDetails, TransferError, TransferSession,
};
#[cfg(feature = "reqwest")]
pub use depot_transfer::ReqwestClient;
pub use depot_verify::Checksums;
