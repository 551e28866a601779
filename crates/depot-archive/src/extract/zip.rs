use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::extract::{resolve, write_file};
use crate::format::ArchiveFormat;
use crate::report::{ArchiveReport, EntryKind, ExtractedEntry};

pub(super) fn extract<R: Read + Seek>(reader: R, destination: &Path) -> Result<ArchiveReport> {
    let mut archive = ::zip::ZipArchive::new(reader)?;
    let mut report = ArchiveReport::new(ArchiveFormat::Zip);

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let raw_name = file.name().to_string();
        let Some(entry_path) = file.enclosed_name().map(|p| p.to_path_buf()) else {
            return Err(Error::ZipSlip {
                entry:    raw_name.clone().into(),
                resolved: destination.join(&raw_name),
            });
        };
        let target = resolve(&entry_path, destination)?;

        if file.is_dir() {
            depot_fs::ensure_dir(&target)?;
            report.push(ExtractedEntry {
                original_path: entry_path,
                target_path:   target,
                size:          0,
                kind:          EntryKind::Directory,
            });
            continue;
        }

        let size = write_file(&mut file, &target)?;
        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode | 0o600))?;
        }
        report.push(ExtractedEntry {
            original_path: entry_path,
            target_path: target,
            size,
            kind: EntryKind::File,
        });
    }
    Ok(report)
}
