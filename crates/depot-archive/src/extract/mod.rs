use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, detect_from_reader};
use crate::report::ArchiveReport;
use crate::sanitize::{sanitize_path, sanitize_symlink_target};

mod tar;
mod zip;

/// Extract an archive held by `reader` into `destination`, detecting the format from its
/// leading bytes.
pub fn extract_from_reader<R: Read + Seek>(mut reader: R, destination: impl AsRef<Path>) -> Result<ArchiveReport> {
    let destination = destination.as_ref();
    let format = detect_from_reader(&mut reader)?
        .ok_or_else(|| Error::UnsupportedFormat(destination.to_path_buf()))?;
    extract_as(reader, format, destination)
}

pub fn extract_as<R: Read + Seek>(reader: R, format: ArchiveFormat, destination: &Path) -> Result<ArchiveReport> {
    depot_fs::ensure_dir(destination)?;
    tracing::debug!(?format, destination = %destination.display(), "extracting archive");
    match format {
        ArchiveFormat::Zip => zip::extract(reader, destination),
        ArchiveFormat::Tar(codec) => tar::extract(reader, codec, destination),
    }
}

/// Extract the archive at `archive` into `destination`.
///
/// The format is detected from content first and from the file name second.
pub fn extract_file(archive: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<ArchiveReport> {
    let archive = archive.as_ref();
    let mut file = File::open(archive).map_err(|e| depot_fs::from_io(e, archive))?;
    let format = match detect_from_reader(&mut file)? {
        Some(format) => format,
        None => archive
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ArchiveFormat::from_file_name)
            .ok_or_else(|| Error::UnsupportedFormat(archive.to_path_buf()))?,
    };
    extract_as(file, format, destination.as_ref())
}

pub(crate) fn write_file<R: Read + ?Sized>(reader: &mut R, target: &Path) -> Result<u64> {
    depot_fs::ensure_parent_dir(target)?;
    let mut out = File::create(target).map_err(|e| Error::ExtractionFailed {
        path:   target.to_path_buf(),
        source: e,
    })?;
    std::io::copy(reader, &mut out).map_err(|e| Error::ExtractionFailed {
        path:   target.to_path_buf(),
        source: e,
    })
}

pub(crate) fn resolve(entry: &Path, destination: &Path) -> Result<std::path::PathBuf> { sanitize_path(entry, destination) }

#[cfg(unix)]
pub(crate) fn write_symlink(target: &Path, link: &Path, destination: &Path) -> Result<()> {
    sanitize_symlink_target(target, link, destination)?;
    depot_fs::ensure_parent_dir(link)?;
    std::os::unix::fs::symlink(target, link).map_err(|e| Error::ExtractionFailed {
        path:   link.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
pub(crate) fn write_symlink(target: &Path, link: &Path, destination: &Path) -> Result<()> {
    sanitize_symlink_target(target, link, destination)?;
    tracing::warn!(link = %link.display(), "skipping symlink entry on this platform");
    Ok(())
}
