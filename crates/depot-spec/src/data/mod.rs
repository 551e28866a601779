//! Match specifications and the records that flow out of resolution.

mod item;
mod properties;
mod spec;

pub use item::{Candidate, ItemType, RemoteItem, UploadCandidate};
pub use properties::{Properties, Property, SYMLINK_DEST, SYMLINK_DEST_SHA1};
pub use spec::MatchSpec;
