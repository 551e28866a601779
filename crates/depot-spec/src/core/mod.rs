//! Pure compilation of match specifications.
//!
//! Nothing here performs I/O: patterns become regexes, targets become destinations,
//! and specs become remote queries.

mod mapping;
mod pattern;
mod query;

pub use mapping::{DownloadMapper, UploadMapper, join_path, local_destination};
pub use pattern::PatternMatcher;
pub use query::{INCLUDED_FIELDS, ItemQuery, PathTriple, path_triples};
