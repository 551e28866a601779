use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ChecksumHasher, Result, VerificationError};

const READ_BUFFER: usize = 64 * 1024;

/// Hex-encoded digests of one artifact. Empty strings mean "unknown".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha1:   String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub md5:    String,
}

impl Checksums {
    pub fn is_empty(&self) -> bool { self.sha1.is_empty() && self.sha256.is_empty() && self.md5.is_empty() }

    /// Compare on the strongest digest both sides know.
    ///
    /// Fails with [`VerificationError::NoDigest`] when no algorithm is shared, and with
    /// [`VerificationError::Mismatch`] when the shared digest differs.
    pub fn verify(&self, expected: &Checksums) -> Result<()> {
        let pairs = [
            (&self.sha256, &expected.sha256),
            (&self.sha1, &expected.sha1),
            (&self.md5, &expected.md5),
        ];
        let (actual, wanted) = pairs
            .into_iter()
            .find(|(a, e)| !a.is_empty() && !e.is_empty())
            .ok_or(VerificationError::NoDigest)?;

        if actual.eq_ignore_ascii_case(wanted) {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: wanted.clone(),
                actual:   actual.clone(),
            })
        }
    }

    pub fn matches(&self, expected: &Checksums) -> bool { self.verify(expected).is_ok() }
}

/// Digest a file in one streaming pass. Returns the checksums and the byte count.
pub fn checksum_file(path: impl AsRef<Path>) -> Result<(Checksums, u64)> {
    let mut file = File::open(path.as_ref())?;
    checksum_reader(&mut file)
}

pub fn checksum_reader<R: Read>(reader: &mut R) -> Result<(Checksums, u64)> {
    let mut hasher = ChecksumHasher::new();
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let bytes = hasher.bytes();
    Ok((hasher.finish(), bytes))
}
