//! Network, filesystem and task I/O behind the [`TransferClient`] seam.

mod client;
mod download;
#[cfg(feature = "reqwest")]
mod http;
mod multipart;
mod recorder;
mod retry;
mod session;
mod upload;

pub use client::{BoxStream, TransferClient};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use multipart::MultipartSupport;
pub use session::TransferSession;
