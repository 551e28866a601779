use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::extract::{resolve, write_file, write_symlink};
use crate::format::{ArchiveFormat, Compression};
use crate::report::{ArchiveReport, EntryKind, ExtractedEntry};

pub(super) fn extract<R: Read>(reader: R, codec: Compression, destination: &Path) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::new(ArchiveFormat::Tar(codec));
    match codec {
        Compression::None => unpack(::tar::Archive::new(reader), destination, &mut report)?,
        Compression::Gzip => unpack(::tar::Archive::new(GzDecoder::new(reader)), destination, &mut report)?,
    }
    Ok(report)
}

fn unpack<R: Read>(mut archive: ::tar::Archive<R>, destination: &Path, report: &mut ArchiveReport) -> Result<()> {
    for entry in archive.entries().map_err(|e| Error::Corrupted(e.to_string()))? {
        let mut entry = entry.map_err(|e| Error::Corrupted(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| Error::InvalidPath(e.to_string()))?
            .into_owned();
        let target = resolve(&entry_path, destination)?;
        let entry_type = entry.header().entry_type();

        let (size, kind) = if entry_type.is_dir() {
            depot_fs::ensure_dir(&target)?;
            (0, EntryKind::Directory)
        } else if entry_type.is_symlink() {
            let link_target = entry
                .link_name()
                .map_err(|e| Error::InvalidPath(e.to_string()))?
                .ok_or_else(|| Error::InvalidPath(entry_path.display().to_string()))?
                .into_owned();
            write_symlink(&link_target, &target, destination)?;
            (0, EntryKind::Symlink { target: link_target })
        } else if entry_type.is_file() {
            let mode = entry.header().mode().ok();
            let size = write_file(&mut entry, &target)?;
            #[cfg(unix)]
            if let Some(mode) = mode {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode | 0o600))?;
            }
            #[cfg(not(unix))]
            let _ = mode;
            (size, EntryKind::File)
        } else {
            tracing::debug!(entry = %entry_path.display(), "skipping unsupported tar entry type");
            continue;
        };

        report.push(ExtractedEntry {
            original_path: entry_path,
            target_path: target,
            size,
            kind,
        });
    }
    Ok(())
}
