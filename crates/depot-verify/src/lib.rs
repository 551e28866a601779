//! Content digests for artifact transfers.
//!
//! Artifacts are identified by three digests (SHA-1, SHA-256, MD5). They are computed
//! together in one streaming pass and compared on the strongest shared algorithm.
//!
//! # Example
//!
//! ```
//! use depot_verify::ChecksumHasher;
//!
//! let mut hasher = ChecksumHasher::new();
//! hasher.update(b"hello world");
//! let sums = hasher.finish();
//! assert_eq!(sums.sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
//! ```

pub use self::checksums::{Checksums, checksum_file, checksum_reader};
pub use self::error::{Result, VerificationError};
pub use self::hasher::ChecksumHasher;

mod checksums;
mod error;
mod hasher;
