use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use tempfile::TempPath;

use crate::error::{Error, Result};

/// Consume side of a result stream.
///
/// Forward-only and single-pass: each [`next_record`](Self::next_record) decodes exactly
/// one line from disk. The reader owns its backing file. [`close`](Self::close) removes
/// it, and dropping an unclosed reader removes it as well.
///
/// A malformed line stops iteration. Records read before it stay valid and the failure
/// is reported by [`error`](Self::error), so callers should check it after the loop.
pub struct ResultReader<T> {
    path:    Option<TempPath>,
    cursor:  Option<BufReader<File>>,
    line:    usize,
    buf:     String,
    error:   Option<Error>,
    closed:  bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> ResultReader<T> {
    /// A reader over zero records with no backing file.
    pub fn empty() -> Self {
        Self {
            path:    None,
            cursor:  None,
            line:    0,
            buf:     String::new(),
            error:   None,
            closed:  false,
            _record: PhantomData,
        }
    }

    pub(crate) fn from_temp_path(path: TempPath) -> Result<Self> {
        let cursor = BufReader::new(File::open(&path)?);
        let mut reader = Self::empty();
        reader.path = Some(path);
        reader.cursor = Some(cursor);
        Ok(reader)
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    /// First decode or I/O error hit during iteration.
    pub fn error(&self) -> Option<&Error> { self.error.as_ref() }

    pub fn take_error(&mut self) -> Option<Error> { self.error.take() }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Count records by streaming over the backing file.
    ///
    /// Uses a separate handle, so the iteration position is unaffected.
    pub fn len(&self) -> Result<usize> {
        if self.closed {
            return Err(Error::Closed);
        }
        let Some(path) = self.path.as_deref() else {
            return Ok(0);
        };
        let mut count = 0;
        for line in BufReader::new(File::open(path)?).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> { self.len().map(|n| n == 0) }

    /// Release the backing file. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        self.cursor = None;
        self.closed = true;
        match self.path.take() {
            Some(path) => path.close().map_err(Error::Io),
            None => Ok(()),
        }
    }
}

impl<T: DeserializeOwned> ResultReader<T> {
    /// Decode the next record, or `None` at the end of the stream or after an error.
    pub fn next_record(&mut self) -> Option<T> {
        if self.error.is_some() {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        loop {
            self.buf.clear();
            match cursor.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let raw = self.buf.trim();
                    if raw.is_empty() {
                        continue;
                    }
                    return match serde_json::from_str(raw) {
                        Ok(record) => Some(record),
                        Err(source) => {
                            tracing::debug!(line = self.line, error = %source, "malformed record in result store");
                            self.error = Some(Error::Malformed { line: self.line, source });
                            None
                        }
                    };
                }
                Err(e) => {
                    self.error = Some(Error::Io(e));
                    return None;
                }
            }
        }
    }
}

impl<T: DeserializeOwned> Iterator for ResultReader<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> { self.next_record() }
}

impl<T> Drop for ResultReader<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to remove result store");
        }
    }
}

impl<T> std::fmt::Debug for ResultReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultReader")
            .field("path", &self.path())
            .field("line", &self.line)
            .field("closed", &self.closed)
            .field("error", &self.error)
            .finish()
    }
}
