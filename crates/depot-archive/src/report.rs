use std::path::PathBuf;

use crate::format::ArchiveFormat;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink { target: PathBuf },
}

#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    pub original_path: PathBuf,
    pub target_path:   PathBuf,
    pub size:          u64,
    pub kind:          EntryKind,
}

#[derive(Clone, Debug)]
pub struct ArchiveReport {
    pub format:      ArchiveFormat,
    pub entries:     Vec<ExtractedEntry>,
    pub entry_count: usize,
    pub total_bytes: u64,
}

impl ArchiveReport {
    pub(crate) fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            entries: Vec::new(),
            entry_count: 0,
            total_bytes: 0,
        }
    }

    pub(crate) fn push(&mut self, entry: ExtractedEntry) {
        self.total_bytes += entry.size;
        self.entry_count += 1;
        self.entries.push(entry);
    }
}
