use std::future::Future;

use depot_stream::{ResultReader, ResultWriter};

use crate::core::{DownloadMapper, ItemQuery};
use crate::data::{Candidate, MatchSpec, RemoteItem};
use crate::error::{Error, Result};

/// Remote query collaborator.
///
/// Implementations run the query and spool the rows into a [`ResultReader`].
/// Failures are reported as [`Error::Query`].
pub trait QueryClient: Send + Sync {
    fn search(&self, query: &ItemQuery) -> impl Future<Output = Result<ResultReader<RemoteItem>>> + Send;
}

/// Query rows mapped to candidates one at a time.
///
/// Nothing is buffered beyond the current row, so very large result sets can be
/// consumed while they are read.
#[derive(Debug)]
pub struct Resolved {
    items:  ResultReader<RemoteItem>,
    mapper: DownloadMapper,
}

impl Resolved {
    pub fn new(items: ResultReader<RemoteItem>, mapper: DownloadMapper) -> Self { Self { items, mapper } }

    pub fn next_candidate(&mut self) -> Option<Candidate> {
        loop {
            let item = self.items.next_record()?;
            if let Some(candidate) = self.mapper.map(&item) {
                return Some(candidate);
            }
        }
    }

    /// Read failure of the underlying rows, checked after iteration.
    pub fn error(&self) -> Option<&depot_stream::Error> { self.items.error() }

    pub fn take_error(&mut self) -> Option<depot_stream::Error> { self.items.take_error() }

    pub fn close(&mut self) -> Result<()> { Ok(self.items.close()?) }

    /// Drain into a disk-backed reader of candidates.
    pub fn into_reader(mut self) -> Result<ResultReader<Candidate>> {
        let writer = ResultWriter::new();
        while let Some(candidate) = self.next_candidate() {
            writer.write(&candidate)?;
        }
        if let Some(e) = self.take_error() {
            return Err(e.into());
        }
        self.close()?;
        Ok(writer.finish()?)
    }
}

impl Iterator for Resolved {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> { self.next_candidate() }
}

/// Resolves a [`MatchSpec`] against the remote repository.
pub struct RemoteResolver<'a, C> {
    client: &'a C,
}

impl<'a, C: QueryClient> RemoteResolver<'a, C> {
    pub fn new(client: &'a C) -> Self { Self { client } }

    /// Validate the spec, run its query, and return a lazy candidate stream.
    ///
    /// Configuration errors are returned before the query is sent.
    pub async fn stream(&self, spec: &MatchSpec) -> Result<Resolved> {
        let mapper = DownloadMapper::new(spec)?;
        let query = ItemQuery::from_spec(spec)?;
        tracing::debug!(pattern = %spec.pattern, aql = %query.to_aql(), "searching remote items");
        let items = self.client.search(&query).await?;
        Ok(Resolved::new(items, mapper))
    }

    /// Resolve into a disk-backed reader. Zero matches yield an empty reader.
    pub async fn resolve(&self, spec: &MatchSpec) -> Result<ResultReader<Candidate>> {
        let resolved = self.stream(spec).await?;
        tokio::task::spawn_blocking(move || resolved.into_reader())
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }
}
