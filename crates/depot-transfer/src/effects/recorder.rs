use depot_stream::ResultWriter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data::{ArtifactDetails, Outcome, Summary, TransferDetails, TransferOutcome};
use crate::error::Result;

/// Single owner of the session counters and detail logs.
///
/// Outcomes are recorded in the order they arrive, which is completion order.
pub(crate) struct Recorder {
    rt_url:    String,
    succeeded: usize,
    failed:    usize,
    skipped:   usize,
    transfers: Option<ResultWriter<TransferDetails>>,
    artifacts: Option<ResultWriter<ArtifactDetails>>,
}

impl Recorder {
    pub fn new(save_summary: bool, rt_url: impl Into<String>) -> Self {
        Self {
            rt_url:    rt_url.into(),
            succeeded: 0,
            failed:    0,
            skipped:   0,
            transfers: save_summary.then(ResultWriter::new),
            artifacts: save_summary.then(ResultWriter::new),
        }
    }

    /// Receive outcomes until every sender is gone.
    pub fn spawn(mut self, mut outcomes: mpsc::Receiver<Outcome>) -> JoinHandle<Result<Summary>> {
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                self.record(outcome)?;
            }
            self.finish()
        })
    }

    pub fn record(&mut self, outcome: Outcome) -> Result<()> {
        let outcome = match outcome {
            Outcome::Completed(outcome) => outcome,
            Outcome::Skipped { source, destination } => {
                tracing::info!(source = %source, destination = %destination, "destination already claimed, skipping");
                self.skipped += 1;
                return Ok(());
            }
        };

        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if let Some(transfers) = &self.transfers {
            transfers.write(&self.transfer_details(&outcome))?;
        }
        if let Some(artifacts) = &self.artifacts {
            if outcome.success {
                artifacts.write(&ArtifactDetails {
                    artifactory_path: outcome.remote_path.clone(),
                    checksums:        outcome.checksums.clone(),
                    properties:       outcome.properties.clone(),
                })?;
            }
        }
        Ok(())
    }

    fn transfer_details(&self, outcome: &TransferOutcome) -> TransferDetails {
        TransferDetails {
            source:      outcome.source.clone(),
            target:      outcome.target.clone(),
            rt_url:      self.rt_url.clone(),
            bytes:       outcome.bytes,
            sha256:      outcome.sha256.clone(),
            duration_ms: outcome.duration_ms,
            success:     outcome.success,
            error:       outcome.error.clone(),
        }
    }

    pub fn finish(self) -> Result<Summary> {
        Ok(Summary {
            total_succeeded:   self.succeeded,
            total_failed:      self.failed,
            total_skipped:     self.skipped,
            transfer_details:  self.transfers.map(ResultWriter::finish).transpose()?,
            artifacts_details: self.artifacts.map(ResultWriter::finish).transpose()?,
        })
    }
}
