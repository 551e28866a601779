use std::io::{self, Read, Seek};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

const ZIP_EXTENSIONS: &[&str] = &[".zip", ".jar", ".war", ".ear", ".aar"];
const TGZ_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz"];

impl ArchiveFormat {
    /// Guess the format from a file name. Used where the bytes are not local yet.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if ZIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Some(Self::Zip)
        } else if TGZ_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Some(Self::Tar(Compression::Gzip))
        } else if lower.ends_with(".tar") {
            Some(Self::Tar(Compression::None))
        } else {
            None
        }
    }
}

pub fn is_supported_archive(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(ArchiveFormat::from_file_name)
        .is_some()
}

pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(ArchiveFormat::Zip),
        [0x1F, 0x8B, ..] => Some(ArchiveFormat::Tar(Compression::Gzip)),
        _ if is_tar_header(data) => Some(ArchiveFormat::Tar(Compression::None)),
        _ => None,
    }
}

fn is_tar_header(data: &[u8]) -> bool { data.len() >= 263 && data[257..262] == *b"ustar" }

pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<Option<ArchiveFormat>> {
    let mut header = Vec::with_capacity(512);
    reader.by_ref().take(512).read_to_end(&mut header)?;
    reader.rewind()?;
    Ok(detect_format(&header))
}
