use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use depot_spec::Properties;
use depot_verify::Checksums;
use futures_util::Stream;

use crate::data::{MultipartSession, PutRequest, PutResponse, StatusResponse};
use crate::error::Result;

/// A boxed stream type for response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Remote transfer collaborator.
///
/// The engine never builds HTTP requests itself; every network call goes through
/// this trait. Errors must be classified into [`TransferError`](crate::TransferError)
/// variants so retries see the right `is_retryable` answer.
///
/// # Implementations
///
/// - [`ReqwestClient`](crate::ReqwestClient): production implementation using `reqwest`
/// - in-memory mocks for testing
pub trait TransferClient: Send + Sync {
    /// Base URL recorded in transfer details.
    fn service_url(&self) -> &str { "" }

    /// Deploy a body, or create a directory for [`PutBody::Empty`](crate::PutBody::Empty).
    fn put(&self, request: PutRequest) -> impl Future<Output = Result<PutResponse>> + Send;

    /// Try to place `target` by digest alone. `Ok(false)` means the remote does not hold
    /// the content.
    fn checksum_deploy(
        &self,
        target: &str,
        checksums: &Checksums,
        properties: &Properties,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Stream the content of a repository path.
    fn get(&self, path: &str) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes>>>> + Send;

    fn multipart_supported(&self) -> impl Future<Output = Result<bool>> + Send;

    fn multipart_create(
        &self,
        target: &str,
        properties: &Properties,
        part_size_mb: u64,
    ) -> impl Future<Output = Result<MultipartSession>> + Send;

    fn multipart_upload_part(
        &self,
        session: &MultipartSession,
        part_number: u32,
        data: Bytes,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Ask the remote to merge all uploaded parts.
    fn multipart_commit(&self, session: &MultipartSession, sha1: &str) -> impl Future<Output = Result<()>> + Send;

    fn multipart_status(&self, session: &MultipartSession) -> impl Future<Output = Result<StatusResponse>> + Send;

    fn multipart_abort(&self, session: &MultipartSession) -> impl Future<Output = Result<()>> + Send;
}
