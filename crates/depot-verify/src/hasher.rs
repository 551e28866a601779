use digest::Digest;

use crate::Checksums;

/// Computes SHA-1, SHA-256 and MD5 in a single pass.
#[derive(Default)]
pub struct ChecksumHasher {
    sha1:   sha1::Sha1,
    sha256: sha2::Sha256,
    md5:    md5::Md5,
    bytes:  u64,
}

impl ChecksumHasher {
    pub fn new() -> Self { Self::default() }

    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.sha1, data);
        Digest::update(&mut self.sha256, data);
        Digest::update(&mut self.md5, data);
        self.bytes += data.len() as u64;
    }

    /// Bytes hashed so far.
    pub fn bytes(&self) -> u64 { self.bytes }

    pub fn finish(self) -> Checksums {
        Checksums {
            sha1:   hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
            md5:    hex::encode(self.md5.finalize()),
        }
    }
}
