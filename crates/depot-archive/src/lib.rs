//! Client-side archive extraction with path sanitization.
//!
//! # Architecture
//!
//! - `format.rs` - format detection from magic bytes or file name
//! - `sanitize.rs` - zip-slip prevention
//! - `extract/` - per-format extraction (zip, tar, tar.gz)
//! - `report.rs` - what was written where

mod error;
mod extract;
mod format;
mod report;
mod sanitize;

pub use error::{Error, Result};
pub use extract::{extract_as, extract_file, extract_from_reader};
pub use format::{ArchiveFormat, Compression, detect_format, detect_from_reader, is_supported_archive};
pub use report::{ArchiveReport, EntryKind, ExtractedEntry};
pub use sanitize::{sanitize_path, sanitize_symlink_target};
