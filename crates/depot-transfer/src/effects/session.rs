use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use depot_spec::{Candidate, LocalResolver, MatchSpec, QueryClient, RemoteResolver, Resolved};
use depot_stream::ResultReader;
use depot_verify::Checksums;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use super::client::TransferClient;
use super::multipart::MultipartSupport;
use super::recorder::Recorder;
use super::{download, upload};
use crate::data::{Outcome, Placed, Strategy, Summary, TransferConfig, TransferOutcome, TransferTask};
use crate::error::{Result, TransferError};

/// State shared by every worker of one session.
pub(crate) struct Shared<C> {
    pub client:    C,
    pub config:    TransferConfig,
    pub multipart: MultipartSupport,
    pub parts:     Semaphore,
}

impl<C: TransferClient> Shared<C> {
    async fn execute(&self, task: TransferTask) -> Outcome {
        let started = Instant::now();
        tracing::info!(source = task.source(), destination = task.destination(), "transfer started");

        let result = match &task {
            _ if self.config.dry_run => Ok(dry_run(&task)),
            TransferTask::Upload(candidate) => upload::execute(self, candidate).await,
            TransferTask::Download(candidate) => download::execute(self, candidate).await,
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(placed) => {
                tracing::debug!(
                    destination = task.destination(),
                    strategy = ?placed.strategy,
                    bytes = placed.bytes,
                    "transfer finished"
                );
                Outcome::Completed(TransferOutcome::succeeded(&task, placed, duration_ms))
            }
            Err(e) => {
                tracing::error!(source = task.source(), destination = task.destination(), error = %e, "transfer failed");
                Outcome::Completed(TransferOutcome::failed(&task, &e, duration_ms))
            }
        }
    }
}

fn dry_run(task: &TransferTask) -> Placed {
    tracing::info!(source = task.source(), destination = task.destination(), "dry run, nothing transferred");
    let checksums = match task {
        TransferTask::Download(candidate) => candidate.checksums.clone(),
        TransferTask::Upload(_) => Checksums::default(),
    };
    Placed::new(Strategy::DryRun, 0, checksums)
}

/// Destinations claimed so far. Claim-if-absent is atomic.
#[derive(Debug, Default)]
struct ClaimRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl ClaimRegistry {
    fn claim(&self, destination: &str) -> bool {
        let mut claimed = match self.claimed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        claimed.insert(destination.to_string())
    }
}

/// Feeds tasks to the workers in dispatch order. Runs on a blocking thread.
struct Dispatcher {
    jobs:     mpsc::Sender<TransferTask>,
    outcomes: mpsc::Sender<Outcome>,
    claims:   ClaimRegistry,
}

impl Dispatcher {
    /// Blocks while the read-ahead buffer is full.
    fn dispatch(&self, task: TransferTask) -> Result<()> {
        if !self.claims.claim(task.destination()) {
            let skipped = Outcome::Skipped {
                source:      task.source().to_string(),
                destination: task.destination().to_string(),
            };
            return self.outcomes.blocking_send(skipped).map_err(|_| stopped());
        }
        self.jobs.blocking_send(task).map_err(|_| stopped())
    }

    fn dispatch_all(&self, mut readers: Vec<ResultReader<depot_spec::UploadCandidate>>) -> Result<()> {
        for reader in &mut readers {
            while let Some(candidate) = reader.next_record() {
                self.dispatch(TransferTask::Upload(candidate))?;
            }
            if let Some(e) = reader.take_error() {
                return Err(TransferError::Resolution(e.to_string()));
            }
            reader.close()?;
        }
        Ok(())
    }

    fn dispatch_resolved(&self, streams: Vec<Resolved>) -> Result<()> {
        for mut resolved in streams {
            while let Some(candidate) = resolved.next_candidate() {
                self.dispatch(TransferTask::Download(candidate))?;
            }
            if let Some(e) = resolved.take_error() {
                return Err(TransferError::Resolution(e.to_string()));
            }
            resolved.close()?;
        }
        Ok(())
    }
}

fn stopped() -> TransferError { TransferError::Io(std::io::Error::other("transfer workers stopped")) }

/// One logical transfer operation: a client, a configuration and per-session caches.
///
/// Each call to [`upload`](Self::upload) or [`download`](Self::download) resolves every
/// spec first, so configuration and resolution errors abort before any transfer. The
/// candidates are then fed through a bounded buffer to `threads` workers, with the
/// first dispatch to any destination winning.
///
/// # Examples
///
/// ```no_run
/// use depot_spec::MatchSpec;
/// use depot_transfer::{ArtifactoryDetails, ReqwestClient, TransferConfig, TransferSession};
///
/// # async fn run() -> depot_transfer::Result<()> {
/// let details = ArtifactoryDetails::new("https://example.com/artifactory").with_access_token("token");
/// let config = TransferConfig::default().threads(8).save_summary(true);
/// let session = TransferSession::new(ReqwestClient::new(&details, &config)?, config)?;
///
/// let mut summary = session.upload(&[MatchSpec::new("build/*.jar").target("libs-release/app/")]).await?;
/// println!("{} uploaded, {} failed", summary.total_succeeded, summary.total_failed);
/// summary.close()?;
/// # Ok(())
/// # }
/// ```
pub struct TransferSession<C> {
    shared: Arc<Shared<C>>,
}

impl<C: TransferClient + 'static> TransferSession<C> {
    pub fn new(client: C, config: TransferConfig) -> Result<Self> {
        config.validate()?;
        let parts = Semaphore::new(config.split_count.max(1));
        Ok(Self {
            shared: Arc::new(Shared {
                client,
                config,
                multipart: MultipartSupport::new(),
                parts,
            }),
        })
    }

    pub fn client(&self) -> &C { &self.shared.client }

    pub fn config(&self) -> &TransferConfig { &self.shared.config }

    /// Multipart capability, once the remote has been asked.
    pub fn multipart_supported(&self) -> Option<bool> { self.shared.multipart.cached() }

    /// Upload every local file matched by `specs`.
    pub async fn upload(&self, specs: &[MatchSpec]) -> Result<Summary> {
        let resolvers = specs.iter().map(LocalResolver::new).collect::<depot_spec::Result<Vec<_>>>()?;
        self.bounded(async {
            let readers = tokio::task::spawn_blocking(move || {
                resolvers.iter().map(LocalResolver::resolve).collect::<depot_spec::Result<Vec<_>>>()
            })
            .await??;
            tracing::info!(specs = specs.len(), "upload session started");
            self.run(move |dispatcher| dispatcher.dispatch_all(readers)).await
        })
        .await
    }

    async fn bounded<F>(&self, session: F) -> Result<Summary>
    where
        F: Future<Output = Result<Summary>>,
    {
        match self.shared.config.session_timeout {
            Some(limit) => tokio::time::timeout(limit, session).await.map_err(|_| {
                tracing::error!(timeout_ms = limit.as_millis() as u64, "session deadline exceeded");
                TransferError::DeadlineExceeded
            })?,
            None => session.await,
        }
    }

    async fn run<F>(&self, source: F) -> Result<Summary>
    where
        F: FnOnce(&Dispatcher) -> Result<()> + Send + 'static,
    {
        let config = &self.shared.config;
        let (job_tx, job_rx) = mpsc::channel::<TransferTask>(config.read_ahead());
        let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>(config.read_ahead());
        let recorder = Recorder::new(config.save_summary, self.shared.client.service_url()).spawn(outcome_rx);

        let jobs = Arc::new(tokio::sync::Mutex::new(job_rx));
        let mut workers = JoinSet::new();
        for _ in 0..config.threads {
            let jobs = Arc::clone(&jobs);
            let outcomes = outcome_tx.clone();
            let shared = Arc::clone(&self.shared);
            workers.spawn(async move {
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some(task) = next else { break };
                    if outcomes.send(shared.execute(task).await).await.is_err() {
                        break;
                    }
                }
            });
        }

        let dispatcher = Dispatcher { jobs: job_tx, outcomes: outcome_tx, claims: ClaimRegistry::default() };
        let dispatched = tokio::task::spawn_blocking(move || source(&dispatcher)).await;

        while let Some(joined) = workers.join_next().await {
            joined?;
        }
        let mut summary = recorder.await??;

        if let Err(e) = dispatched.map_err(TransferError::from).and_then(|r| r) {
            if let Err(close) = summary.close() {
                tracing::warn!(error = %close, "failed to remove summary files");
            }
            return Err(e);
        }
        tracing::info!(
            succeeded = summary.total_succeeded,
            failed = summary.total_failed,
            skipped = summary.total_skipped,
            "transfer session finished"
        );
        if config.fail_no_op && summary.total_succeeded + summary.total_failed == 0 {
            if let Err(close) = summary.close() {
                tracing::warn!(error = %close, "failed to remove summary files");
            }
            return Err(TransferError::NoOp);
        }
        Ok(summary)
    }
}

impl<C: TransferClient + QueryClient + 'static> TransferSession<C> {
    /// Download every remote item matched by `specs`.
    ///
    /// All queries complete before the first transfer starts. Their rows stay on
    /// disk and are mapped lazily while dispatching.
    pub async fn download(&self, specs: &[MatchSpec]) -> Result<Summary> {
        for spec in specs {
            spec.validate()?;
        }
        self.bounded(async {
            let resolver = RemoteResolver::new(&self.shared.client);
            let mut streams = Vec::with_capacity(specs.len());
            for spec in specs {
                streams.push(resolver.stream(spec).await?);
            }
            tracing::info!(specs = specs.len(), "download session started");
            self.run(move |dispatcher| dispatcher.dispatch_resolved(streams)).await
        })
        .await
    }

    /// Resolve one spec into a disk-backed reader of candidates, without transferring.
    pub async fn search(&self, spec: &MatchSpec) -> Result<ResultReader<Candidate>> {
        Ok(RemoteResolver::new(&self.shared.client).resolve(spec).await?)
    }
}
