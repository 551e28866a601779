use std::path::{Path, PathBuf};

use depot_archive::is_supported_archive;
use depot_spec::{SYMLINK_DEST, SYMLINK_DEST_SHA1, UploadCandidate};
use depot_verify::{Checksums, checksum_file};

use super::client::TransferClient;
use super::multipart::MultipartUpload;
use super::retry::with_retries;
use super::session::Shared;
use crate::core::{UploadPlan, plan_upload};
use crate::data::{Placed, PutRequest, Strategy};
use crate::error::{Result, TransferError};

/// Upload one local file or directory.
///
/// Digests are computed once, off the async workers, and reused across retries.
pub(crate) async fn execute<C: TransferClient>(shared: &Shared<C>, candidate: &UploadCandidate) -> Result<Placed> {
    if candidate.is_dir {
        let request = PutRequest::directory(&candidate.target).properties(candidate.properties.clone());
        with_retries(&shared.config, &candidate.target, || shared.client.put(request.clone())).await?;
        return Ok(Placed::folder());
    }
    if let Some(dest) = &candidate.symlink {
        return upload_link(shared, candidate, dest).await;
    }

    let path = PathBuf::from(&candidate.local_path);
    let (checksums, size) = digest(&path).await?;
    let plan = plan_upload(size, &shared.config, is_supported_archive(&path));
    tracing::debug!(path = %candidate.local_path, size, ?plan, "planned upload");

    with_retries(&shared.config, &candidate.local_path, || {
        attempt(shared, candidate, &path, &checksums, size, plan)
    })
    .await
}

/// Record a link as an empty artifact whose properties name its target.
///
/// The target's SHA-1 is recorded too when the link resolves to a regular file.
async fn upload_link<C: TransferClient>(shared: &Shared<C>, candidate: &UploadCandidate, dest: &str) -> Result<Placed> {
    let mut properties = candidate.properties.clone().with(SYMLINK_DEST, dest);
    let path = Path::new(&candidate.local_path);
    if path.is_file() {
        let (checksums, _) = digest(path).await?;
        properties.add(SYMLINK_DEST_SHA1, checksums.sha1);
    }
    tracing::debug!(path = %candidate.local_path, dest, "uploading symlink");

    let request = PutRequest::empty(&candidate.target).properties(properties);
    with_retries(&shared.config, &candidate.local_path, || shared.client.put(request.clone())).await?;
    Ok(Placed::new(Strategy::Symlink, 0, Checksums::default()))
}

async fn digest(path: &Path) -> Result<(Checksums, u64)> {
    let owned = path.to_path_buf();
    Ok(tokio::task::spawn_blocking(move || checksum_file(owned)).await??)
}

async fn attempt<C: TransferClient>(
    shared: &Shared<C>,
    candidate: &UploadCandidate,
    path: &Path,
    checksums: &Checksums,
    size: u64,
    plan: UploadPlan,
) -> Result<Placed> {
    let client = &shared.client;
    let target = candidate.target.as_str();

    if plan.checksum_deploy {
        if client.checksum_deploy(target, checksums, &candidate.properties).await? {
            tracing::debug!(path = target, "placed by checksum");
            return Ok(Placed::new(Strategy::ChecksumDeploy, 0, checksums.clone()));
        }
        tracing::debug!(path = target, "checksum deploy missed, sending content");
    }

    if plan.multipart && shared.multipart.is_supported(client).await {
        let upload = MultipartUpload {
            client,
            config: &shared.config,
            parts: &shared.parts,
        };
        upload.run(path, target, &candidate.properties, &checksums.sha1, size).await?;
        return Ok(Placed::new(Strategy::Multipart, size, checksums.clone()));
    }

    let request = PutRequest::file(target, path, checksums.clone(), size)
        .properties(candidate.properties.clone())
        .explode(plan.explode);
    let response = client.put(request).await?;

    let remote = &response.checksums.sha256;
    if !remote.is_empty() && !remote.eq_ignore_ascii_case(&checksums.sha256) {
        return Err(TransferError::Integrity {
            path:     path.to_path_buf(),
            expected: checksums.sha256.clone(),
            actual:   remote.clone(),
        });
    }

    let strategy = if plan.explode { Strategy::Explode } else { Strategy::Direct };
    Ok(Placed::new(strategy, size, checksums.clone()))
}
