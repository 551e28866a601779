//! Match specifications and their resolution into transfer candidates.
//!
//! # Architecture
//!
//! - [`data`] - `MatchSpec`, `Properties` and the records resolution produces
//! - [`core`] - pure compilation: glob patterns, placeholders, destinations, remote queries
//! - [`effects`] - resolvers that talk to the remote repository or walk the local filesystem
//!
//! ```
//! use depot_spec::{DownloadMapper, MatchSpec, RemoteItem};
//!
//! let spec = MatchSpec::new("repo/(*).in").target("out/{1}/").flat(true);
//! let mapper = DownloadMapper::new(&spec).unwrap();
//!
//! let item = RemoteItem::file("repo", "test", "a.in");
//! assert_eq!(mapper.map(&item).unwrap().destination, "out/a/a.in");
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{
    DownloadMapper, INCLUDED_FIELDS, ItemQuery, PathTriple, PatternMatcher, UploadMapper, join_path,
    local_destination, path_triples,
};
pub use data::{
    Candidate, ItemType, MatchSpec, Properties, Property, RemoteItem, SYMLINK_DEST, SYMLINK_DEST_SHA1, UploadCandidate,
};
pub use effects::{LocalResolver, QueryClient, RemoteResolver, Resolved};
pub use error::{Error, Result};
