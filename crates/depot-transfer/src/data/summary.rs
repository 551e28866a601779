use depot_spec::Properties;
use depot_stream::ResultReader;
use depot_verify::Checksums;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One line of the transfer log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDetails {
    pub source:      String,
    pub target:      String,
    pub rt_url:      String,
    pub bytes:       u64,
    pub sha256:      String,
    pub duration_ms: u64,
    pub success:     bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:       Option<String>,
}

/// One placed artifact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDetails {
    pub artifactory_path: String,
    pub checksums:        Checksums,
    #[serde(default)]
    pub properties:       Properties,
}

/// Result of a transfer session.
///
/// Detail readers are present only when summaries were enabled. Call
/// [`close`](Self::close) to remove their backing files; dropping also removes them.
#[derive(Debug, Default)]
pub struct Summary {
    pub total_succeeded:   usize,
    pub total_failed:      usize,
    pub total_skipped:     usize,
    pub transfer_details:  Option<ResultReader<TransferDetails>>,
    pub artifacts_details: Option<ResultReader<ArtifactDetails>>,
}

impl Summary {
    pub fn is_success(&self) -> bool { self.total_failed == 0 }

    /// Close both detail readers. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        let transfers = self.transfer_details.as_mut().map_or(Ok(()), ResultReader::close);
        let artifacts = self.artifacts_details.as_mut().map_or(Ok(()), ResultReader::close);
        transfers?;
        artifacts?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use depot_stream::ResultWriter;

    use super::*;

    #[test]
    fn test_close_is_idempotent() {
        let details = TransferDetails {
            source: "a".into(),
            target: "repo/a".into(),
            success: true,
            ..TransferDetails::default()
        };
        let mut summary = Summary {
            total_succeeded: 1,
            transfer_details: Some(ResultWriter::collect_from([details]).unwrap()),
            ..Summary::default()
        };
        let path = summary.transfer_details.as_ref().and_then(|r| r.path()).unwrap().to_path_buf();
        assert!(path.exists());

        summary.close().unwrap();
        summary.close().unwrap();
        assert!(!path.exists());
        assert!(summary.is_success());
    }

    #[test]
    fn test_error_omitted_on_success() {
        let json = serde_json::to_string(&TransferDetails::default()).unwrap();
        assert!(!json.contains("error"));
    }
}
