use crate::data::MIB;

/// A byte range of a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// 1-based, as the remote numbers them.
    pub number: u32,
    pub offset: u64,
    pub len:    u64,
}

impl Part {
    pub fn end(&self) -> u64 { self.offset + self.len }
}

/// Split `size` bytes into fixed `chunk_size` parts. Only the last part may be shorter.
///
/// An empty file is a single empty part.
pub fn plan_parts(size: u64, chunk_size: u64) -> Vec<Part> {
    let chunk_size = chunk_size.max(1);
    if size == 0 {
        return vec![Part { number: 1, offset: 0, len: 0 }];
    }

    let count = size.div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let offset = i * chunk_size;
            Part {
                number: u32::try_from(i + 1).unwrap_or(u32::MAX),
                offset,
                len: chunk_size.min(size - offset),
            }
        })
        .collect()
}

/// Part size as announced to the remote, in whole MiB.
pub fn part_size_mb(chunk_size: u64) -> u64 { chunk_size.div_ceil(MIB).max(1) }
