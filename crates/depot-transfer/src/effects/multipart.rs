use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use depot_spec::Properties;
use futures_util::{StreamExt, TryStreamExt, stream};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{OnceCell, Semaphore};

use super::client::TransferClient;
use super::retry::with_retries;
use crate::core::{Part, part_size_mb, plan_parts, retry_delay};
use crate::data::{MultipartSession, MultipartStatus, TransferConfig};
use crate::error::{Result, TransferError};

/// Per-session cache of the remote's multipart capability.
///
/// The first caller asks the remote; concurrent callers wait for that answer. A
/// failed capability check is cached as unsupported.
#[derive(Debug, Default)]
pub struct MultipartSupport {
    answer: OnceCell<bool>,
}

impl MultipartSupport {
    pub fn new() -> Self { Self::default() }

    pub async fn is_supported<C: TransferClient>(&self, client: &C) -> bool {
        *self
            .answer
            .get_or_init(|| async {
                match client.multipart_supported().await {
                    Ok(supported) => {
                        tracing::debug!(supported, "multipart support checked");
                        supported
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "multipart capability check failed, using single uploads");
                        false
                    }
                }
            })
            .await
    }

    /// Cached answer, if the remote has been asked.
    pub fn cached(&self) -> Option<bool> { self.answer.get().copied() }
}

/// One multipart upload: create, send parts, commit, wait for the merge.
pub(crate) struct MultipartUpload<'a, C> {
    pub client: &'a C,
    pub config: &'a TransferConfig,
    /// Session-wide bound on in-flight parts, separate from the file workers.
    pub parts:  &'a Semaphore,
}

impl<C: TransferClient> MultipartUpload<'_, C> {
    /// Upload `path` to `target`. The remote upload is aborted on failure.
    pub async fn run(&self, path: &Path, target: &str, properties: &Properties, sha1: &str, size: u64) -> Result<()> {
        let session = self
            .client
            .multipart_create(target, properties, part_size_mb(self.config.chunk_size))
            .await?;
        tracing::debug!(path = target, size, "multipart upload created");

        let result = match self.upload_parts(&session, path, size).await {
            Ok(()) => self.commit(&session, target, sha1).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            if let Err(e) = self.client.multipart_abort(&session).await {
                tracing::warn!(path = target, error = %e, "failed to abort multipart upload");
            }
        }
        result
    }

    async fn upload_parts(&self, session: &MultipartSession, path: &Path, size: u64) -> Result<()> {
        let parts = plan_parts(size, self.config.chunk_size);
        let total = parts.len();
        let label = path.to_string_lossy();

        stream::iter(parts)
            .map(Ok::<Part, TransferError>)
            .try_for_each_concurrent(self.config.split_count.max(1), |part| {
                let label = &label;
                async move {
                    let _permit = self
                        .parts
                        .acquire()
                        .await
                        .map_err(|e| TransferError::MultipartFailed(e.to_string()))?;
                    let data = read_part(path, part).await?;
                    with_retries(self.config, label, || {
                        self.client.multipart_upload_part(session, part.number, data.clone())
                    })
                    .await?;
                    tracing::debug!(path = %label, part = part.number, total, "uploaded part");
                    Ok(())
                }
            })
            .await
    }

    /// Commit, then poll until the remote finishes merging. Retryable merge failures
    /// re-run the commit only; parts are never sent again.
    async fn commit(&self, session: &MultipartSession, target: &str, sha1: &str) -> Result<()> {
        with_retries(self.config, target, || self.client.multipart_commit(session, sha1)).await?;

        let mut recommits = 0;
        let mut polls = 0;
        loop {
            let status = with_retries(self.config, target, || self.client.multipart_status(session)).await?;
            match status.status {
                MultipartStatus::Finished => return Ok(()),
                MultipartStatus::Parts | MultipartStatus::Queued | MultipartStatus::Processing => {
                    polls += 1;
                    if polls > self.config.commit_max_polls {
                        return Err(TransferError::MultipartFailed(format!(
                            "merge timed out, still {:?} after {} polls",
                            status.status, self.config.commit_max_polls
                        )));
                    }
                    tokio::time::sleep(self.config.commit_poll_interval).await;
                }
                MultipartStatus::RetryableError if recommits < self.config.commit_retries => {
                    recommits += 1;
                    tracing::warn!(path = target, attempt = recommits, error = %status.error, "retrying multipart commit");
                    tokio::time::sleep(retry_delay(recommits - 1, self.config.retry_backoff)).await;
                    with_retries(self.config, target, || self.client.multipart_commit(session, sha1)).await?;
                }
                MultipartStatus::RetryableError => {
                    return Err(TransferError::MultipartFailed(format!(
                        "commit failed after {recommits} retries: {}",
                        status.error
                    )));
                }
                MultipartStatus::NonRetryableError | MultipartStatus::Aborted => {
                    return Err(TransferError::MultipartFailed(format!("{:?}: {}", status.status, status.error)));
                }
            }
        }
    }
}

async fn read_part(path: &Path, part: Part) -> Result<Bytes> {
    let len = usize::try_from(part.len).map_err(|_| TransferError::MultipartFailed("part too large".into()))?;
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(part.offset)).await?;
    let mut buf = vec![0; len];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
