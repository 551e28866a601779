use std::path::{Path, PathBuf};

use depot_archive::{extract_file, is_supported_archive};
use depot_fs::{StagedFile, ensure_dir, ensure_parent_dir, remove_file_if_exists};
use depot_spec::{Candidate, SYMLINK_DEST_SHA1};
use depot_verify::{ChecksumHasher, Checksums, VerificationError, checksum_file};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use super::client::TransferClient;
use super::retry::with_retries;
use super::session::Shared;
use crate::core::is_cached;
use crate::data::{Placed, Strategy};
use crate::error::{Result, TransferError};

/// Download one candidate to its local destination.
pub(crate) async fn execute<C: TransferClient>(shared: &Shared<C>, candidate: &Candidate) -> Result<Placed> {
    let destination = PathBuf::from(&candidate.destination);
    if candidate.is_folder {
        ensure_dir(&destination)?;
        return Ok(Placed::folder());
    }
    if let Some(dest) = &candidate.symlink {
        return recreate_link(candidate, &destination, dest).await;
    }

    let mut placed = match local_copy(&destination, &candidate.checksums).await? {
        Some(local) => {
            tracing::debug!(path = %candidate.destination, "local file is up to date");
            Placed::new(Strategy::Cached, 0, local)
        }
        None => with_retries(&shared.config, &candidate.repo_path, || fetch(shared, candidate, &destination)).await?,
    };

    if shared.config.explode && is_supported_archive(&destination) && destination.is_file() {
        explode(&destination).await?;
        placed.strategy = Strategy::Explode;
    }
    Ok(placed)
}

/// Digests of an existing local file that already matches the remote one.
async fn local_copy(destination: &Path, remote: &Checksums) -> Result<Option<Checksums>> {
    if remote.is_empty() || !destination.is_file() {
        return Ok(None);
    }
    let owned = destination.to_path_buf();
    let (local, _) = tokio::task::spawn_blocking(move || checksum_file(owned)).await??;
    Ok(is_cached(&local, remote).then_some(local))
}

/// Stream the body into a staged file beside the destination, hashing as it lands.
async fn fetch<C: TransferClient>(shared: &Shared<C>, candidate: &Candidate, destination: &Path) -> Result<Placed> {
    let staged = StagedFile::new(destination)?;
    let mut file = tokio::fs::File::from_std(staged.reopen()?);
    let mut hasher = ChecksumHasher::new();

    let mut body = shared.client.get(&candidate.repo_path).await?;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    let bytes = hasher.bytes();
    let actual = hasher.finish();
    match actual.verify(&candidate.checksums) {
        Ok(()) | Err(VerificationError::NoDigest) => {}
        Err(VerificationError::Mismatch { expected, actual }) => {
            return Err(TransferError::Integrity { path: destination.to_path_buf(), expected, actual });
        }
        Err(e) => return Err(e.into()),
    }

    staged.commit()?;
    tracing::debug!(path = %destination.display(), bytes, "download placed");
    Ok(Placed::new(Strategy::Direct, bytes, actual))
}

/// Replace whatever is at `destination` with a link to `dest`.
///
/// When the remote recorded the SHA-1 of the link target and the new link resolves to a
/// regular file, the file must still hold that content.
async fn recreate_link(candidate: &Candidate, destination: &Path, dest: &str) -> Result<Placed> {
    remove_file_if_exists(destination)?;
    ensure_parent_dir(destination)?;
    create_symlink(Path::new(dest), destination)?;

    let recorded = candidate.properties.get(SYMLINK_DEST_SHA1).and_then(|v| v.first());
    if let Some(expected) = recorded.filter(|_| destination.is_file()) {
        let owned = destination.to_path_buf();
        let (actual, _) = tokio::task::spawn_blocking(move || checksum_file(owned)).await??;
        if !actual.sha1.eq_ignore_ascii_case(expected) {
            remove_file_if_exists(destination)?;
            return Err(TransferError::Integrity {
                path:     destination.to_path_buf(),
                expected: expected.clone(),
                actual:   actual.sha1,
            });
        }
    }
    tracing::debug!(path = %destination.display(), dest, "symlink recreated");
    Ok(Placed::new(Strategy::Symlink, 0, Checksums::default()))
}

#[cfg(unix)]
fn create_symlink(dest: &Path, link: &Path) -> std::io::Result<()> { std::os::unix::fs::symlink(dest, link) }

#[cfg(not(unix))]
fn create_symlink(_dest: &Path, link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("cannot create symlink {}", link.display()),
    ))
}

/// Extract an archive into its own directory, then remove the archive.
async fn explode(archive: &Path) -> Result<()> {
    let owned = archive.to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        let parent = match owned.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        extract_file(&owned, parent)
    })
    .await??;
    remove_file_if_exists(archive)?;
    tracing::debug!(path = %archive.display(), entries = report.entry_count, "archive extracted");
    Ok(())
}
