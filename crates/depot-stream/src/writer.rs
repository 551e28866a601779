use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::reader::ResultReader;

const FILE_PREFIX: &str = "depot-results-";

#[derive(Default)]
struct Store {
    file:  Option<BufWriter<NamedTempFile>>,
    count: usize,
}

/// Append side of a result stream.
///
/// Records are encoded as one JSON document per line. The backing temp file is created
/// on the first [`write`](Self::write); a writer that never receives a record touches
/// no disk. `write` takes `&self` and serializes appends internally, so one writer can
/// be shared between producers.
pub struct ResultWriter<T> {
    dir:     Option<PathBuf>,
    store:   Mutex<Store>,
    _record: PhantomData<fn(&T)>,
}

impl<T> Default for ResultWriter<T> {
    fn default() -> Self { Self::new() }
}

impl<T> ResultWriter<T> {
    pub fn new() -> Self {
        Self {
            dir:     None,
            store:   Mutex::new(Store::default()),
            _record: PhantomData,
        }
    }

    /// Place the backing file in `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize { self.store.lock().map(|s| s.count).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Path of the backing file, if one has been created.
    pub fn path(&self) -> Option<PathBuf> {
        let store = self.store.lock().ok()?;
        store.file.as_ref().map(|f| f.get_ref().path().to_path_buf())
    }

    fn create_file(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(FILE_PREFIX).suffix(".jsonl");
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tracing::trace!(path = %file.path().display(), "created result store");
        Ok(file)
    }

    /// Flush and hand the records over to a single consumer.
    pub fn finish(self) -> Result<ResultReader<T>> {
        let store = self.store.into_inner().map_err(|_| Error::Poisoned)?;
        match store.file {
            None => Ok(ResultReader::empty()),
            Some(buffered) => {
                let file = buffered.into_inner().map_err(|e| Error::Io(e.into_error()))?;
                ResultReader::from_temp_path(file.into_temp_path())
            }
        }
    }
}

impl<T: Serialize> ResultWriter<T> {
    pub fn write(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record).map_err(Error::Encode)?;
        line.push(b'\n');

        let mut store = self.store.lock().map_err(|_| Error::Poisoned)?;
        if store.file.is_none() {
            store.file = Some(BufWriter::new(self.create_file()?));
        }
        if let Some(file) = store.file.as_mut() {
            file.write_all(&line)?;
        }
        store.count += 1;
        Ok(())
    }

    /// Build a finished reader from an in-memory sequence.
    pub fn collect_from<I>(records: I) -> Result<ResultReader<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let writer = Self::new();
        for record in records {
            writer.write(&record)?;
        }
        writer.finish()
    }

    /// Same as [`collect_from`](Self::collect_from) with the store placed in `dir`.
    pub fn collect_in<I>(dir: &Path, records: I) -> Result<ResultReader<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let writer = Self::in_dir(dir);
        for record in records {
            writer.write(&record)?;
        }
        writer.finish()
    }
}
