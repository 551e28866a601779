use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

/// Largest file the remote accepts through multipart upload.
pub const MAX_MULTIPART_SIZE: u64 = 5 * TIB;

/// One week of status polls at the default one-second interval.
pub const DEFAULT_COMMIT_MAX_POLLS: u32 = 7 * 24 * 60 * 60;

/// Session-level transfer configuration.
///
/// Durations are written in milliseconds in TOML and environment variables.
///
/// # Examples
///
/// ```
/// use depot_transfer::TransferConfig;
/// use std::time::Duration;
///
/// let config = TransferConfig::default()
///     .threads(8)
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(50))
///     .save_summary(true);
/// config.validate().unwrap();
/// assert_eq!(config.read_ahead(), 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Size of the file-level worker pool.
    pub threads: usize,

    /// Files at least this large are first offered to the remote by checksum.
    pub min_checksum_deploy: u64,

    /// Files at least this large are uploaded in parts when the remote supports it.
    pub min_split_size: u64,

    /// Parts uploaded concurrently per file. Zero disables multipart upload.
    pub split_count: usize,

    /// Fixed size of every multipart part but the last.
    pub chunk_size: u64,

    /// Attempts after the first for retryable failures.
    pub max_retries: u32,

    #[serde(with = "millis")]
    pub retry_backoff: Duration,

    /// Commit-only retries after the remote reports a retryable merge failure.
    pub commit_retries: u32,

    #[serde(with = "millis")]
    pub commit_poll_interval: Duration,

    /// Status polls allowed while the remote is still merging parts.
    pub commit_max_polls: u32,

    /// Record per-transfer and per-artifact details in the summary.
    pub save_summary: bool,

    /// Download: extract supported archives after placement.
    pub explode: bool,

    /// Upload: ask the remote to extract supported archives.
    pub explode_archive: bool,

    /// Resolve and dispatch as usual but touch neither the remote nor local files.
    pub dry_run: bool,

    /// Fail the session when no file was transferred or failed.
    pub fail_no_op: bool,

    #[serde(with = "millis")]
    pub dial_timeout: Duration,

    #[serde(with = "millis")]
    pub request_timeout: Duration,

    /// Bound on the whole session.
    #[serde(with = "millis_opt", skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<Duration>,

    /// Dispatch buffer. Defaults to twice the worker count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_ahead: Option<usize>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            threads:              3,
            min_checksum_deploy:  10 * KIB,
            min_split_size:       200 * MIB,
            split_count:          5,
            chunk_size:           16 * MIB,
            max_retries:          3,
            retry_backoff:        Duration::from_millis(100),
            commit_retries:       5,
            commit_poll_interval: Duration::from_secs(1),
            commit_max_polls:     DEFAULT_COMMIT_MAX_POLLS,
            save_summary:         false,
            explode:              false,
            explode_archive:      false,
            dry_run:              false,
            fail_no_op:           false,
            dial_timeout:         Duration::from_secs(30),
            request_timeout:      Duration::from_secs(300),
            session_timeout:      None,
            read_ahead:           None,
        }
    }
}

impl TransferConfig {
    /// Defaults, then the TOML file if present, then `DEPOT_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DEPOT_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(raw))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| TransferError::Configuration(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(TransferError::Configuration("threads must be greater than 0".into()));
        }
        if self.chunk_size == 0 {
            return Err(TransferError::Configuration("chunk_size must be greater than 0".into()));
        }
        if self.read_ahead == Some(0) {
            return Err(TransferError::Configuration("read_ahead must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn read_ahead(&self) -> usize { self.read_ahead.unwrap_or(self.threads.saturating_mul(2)).max(1) }

    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn min_checksum_deploy(mut self, bytes: u64) -> Self {
        self.min_checksum_deploy = bytes;
        self
    }

    #[must_use]
    pub fn min_split_size(mut self, bytes: u64) -> Self {
        self.min_split_size = bytes;
        self
    }

    #[must_use]
    pub fn split_count(mut self, count: usize) -> Self {
        self.split_count = count;
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn commit_retries(mut self, retries: u32) -> Self {
        self.commit_retries = retries;
        self
    }

    #[must_use]
    pub fn commit_poll_interval(mut self, interval: Duration) -> Self {
        self.commit_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn commit_max_polls(mut self, polls: u32) -> Self {
        self.commit_max_polls = polls;
        self
    }

    #[must_use]
    pub fn save_summary(mut self, save: bool) -> Self {
        self.save_summary = save;
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    #[must_use]
    pub fn explode_archive(mut self, explode: bool) -> Self {
        self.explode_archive = explode;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn fail_no_op(mut self, fail: bool) -> Self {
        self.fail_no_op = fail;
        self
    }

    #[must_use]
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn read_ahead_buffer(mut self, slots: usize) -> Self {
        self.read_ahead = Some(slots);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => super::millis::serialize(d, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
