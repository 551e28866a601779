#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use depot_spec::{ItemQuery, ItemType, Properties, QueryClient, RemoteItem};
use depot_stream::{ResultReader, ResultWriter};
use depot_transfer::{
    BoxStream, MultipartSession, MultipartStatus, PutBody, PutRequest, PutResponse, Result, StatusResponse,
    TransferClient, TransferError,
};
use depot_verify::{ChecksumHasher, Checksums};

pub fn digest(data: &[u8]) -> Checksums {
    let mut hasher = ChecksumHasher::new();
    hasher.update(data);
    hasher.finish()
}

#[derive(Clone, Debug)]
pub struct Stored {
    pub data:       Vec<u8>,
    pub checksums:  Checksums,
    pub properties: Properties,
    pub folder:     bool,
}

impl Stored {
    fn item(&self, full_path: &str) -> RemoteItem {
        let (repo, rest) = full_path.split_once('/').unwrap_or((full_path, ""));
        let (path, name) = rest.rsplit_once('/').unwrap_or((".", rest));
        RemoteItem {
            repo:        repo.into(),
            path:        path.into(),
            name:        name.into(),
            item_type:   if self.folder { ItemType::Folder } else { ItemType::File },
            size:        self.data.len() as u64,
            actual_sha1: self.checksums.sha1.clone(),
            actual_md5:  self.checksums.md5.clone(),
            sha256:      self.checksums.sha256.clone(),
            properties:  self.properties.clone(),
        }
    }
}

struct PendingUpload {
    target:     String,
    properties: Properties,
    parts:      BTreeMap<u32, Bytes>,
}

/// In-memory repository implementing both collaborators.
#[derive(Default)]
pub struct MockRepository {
    pub files:                  Mutex<BTreeMap<String, Stored>>,
    pub missing:                Mutex<HashSet<String>>,
    pub transient_put_failures: AtomicU32,
    pub merge_failures:         AtomicU32,
    pub pending_merges:         AtomicU32,
    pub multipart:              bool,
    pub corrupt_downloads:      bool,
    pub fail_search:            bool,
    pub get_delay:              Option<Duration>,
    pub calls:                  Mutex<Vec<&'static str>>,
    pub uploads:                Mutex<HashMap<String, PendingUpload>>,
}

impl MockRepository {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, path: &str, data: &[u8], properties: Properties) {
        self.files.lock().unwrap().insert(path.to_string(), Stored {
            data: data.to_vec(),
            checksums: digest(data),
            properties,
            folder: false,
        });
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).filter(|s| !s.folder).map(|s| s.data.clone())
    }

    pub fn is_folder(&self, path: &str) -> bool {
        self.files.lock().unwrap().get(path).is_some_and(|s| s.folder)
    }

    pub fn count(&self, call: &str) -> usize { self.calls.lock().unwrap().iter().filter(|c| **c == call).count() }

    fn call(&self, name: &'static str) { self.calls.lock().unwrap().push(name); }
}

impl TransferClient for MockRepository {
    fn service_url(&self) -> &str { "http://mock/artifactory" }

    async fn put(&self, request: PutRequest) -> Result<PutResponse> {
        self.call("put");
        if self
            .transient_put_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransferError::http(503, "service unavailable"));
        }

        let folder = request.target.ends_with('/');
        let target = request.target.trim_end_matches('/').to_string();
        match &request.body {
            PutBody::Empty if folder => {
                self.files.lock().unwrap().insert(target, Stored {
                    data:       Vec::new(),
                    checksums:  Checksums::default(),
                    properties: request.properties.clone(),
                    folder:     true,
                });
                Ok(PutResponse::default())
            }
            PutBody::Empty => {
                self.insert(&target, &[], request.properties.clone());
                Ok(PutResponse { checksums: digest(&[]) })
            }
            PutBody::File(path) => {
                let data = tokio::fs::read(path).await?;
                self.insert(&target, &data, request.properties.clone());
                Ok(PutResponse { checksums: digest(&data) })
            }
        }
    }

    async fn checksum_deploy(&self, target: &str, checksums: &Checksums, properties: &Properties) -> Result<bool> {
        self.call("checksum_deploy");
        let existing = self
            .files
            .lock()
            .unwrap()
            .values()
            .find(|s| !s.folder && s.checksums.sha1 == checksums.sha1)
            .cloned();
        match existing {
            Some(stored) => {
                self.insert(target, &stored.data, properties.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, path: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
        self.call("get");
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        if self.missing.lock().unwrap().contains(path) {
            return Err(TransferError::http(404, "not found"));
        }
        let mut data = self.content(path).ok_or_else(|| TransferError::http(404, "not found"))?;
        if self.corrupt_downloads {
            if let Some(byte) = data.first_mut() {
                *byte ^= 0xff;
            }
        }
        let chunks: Vec<Result<Bytes>> = data.chunks(7).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }

    async fn multipart_supported(&self) -> Result<bool> {
        self.call("multipart_supported");
        Ok(self.multipart)
    }

    async fn multipart_create(&self, target: &str, properties: &Properties, _part_size_mb: u64) -> Result<MultipartSession> {
        self.call("multipart_create");
        let token = format!("token-{target}");
        self.uploads.lock().unwrap().insert(token.clone(), PendingUpload {
            target:     target.to_string(),
            properties: properties.clone(),
            parts:      BTreeMap::new(),
        });
        Ok(MultipartSession { token })
    }

    async fn multipart_upload_part(&self, session: &MultipartSession, part_number: u32, data: Bytes) -> Result<()> {
        self.call("multipart_upload_part");
        let mut uploads = self.uploads.lock().unwrap();
        let upload = uploads.get_mut(&session.token).ok_or_else(|| TransferError::http(404, "no such upload"))?;
        upload.parts.insert(part_number, data);
        Ok(())
    }

    async fn multipart_commit(&self, _session: &MultipartSession, _sha1: &str) -> Result<()> {
        self.call("multipart_commit");
        Ok(())
    }

    async fn multipart_status(&self, session: &MultipartSession) -> Result<StatusResponse> {
        self.call("multipart_status");
        if self.merge_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            let mut status = StatusResponse::new(MultipartStatus::RetryableError);
            status.error = "merge interrupted".into();
            return Ok(status);
        }
        if self.pending_merges.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            return Ok(StatusResponse::new(MultipartStatus::Processing));
        }
        let (target, properties, data) = {
            let uploads = self.uploads.lock().unwrap();
            let upload = uploads.get(&session.token).ok_or_else(|| TransferError::http(404, "no such upload"))?;
            let data: Vec<u8> = upload.parts.values().flat_map(|p| p.iter().copied()).collect();
            (upload.target.clone(), upload.properties.clone(), data)
        };
        self.insert(&target, &data, properties);
        Ok(StatusResponse::new(MultipartStatus::Finished))
    }

    async fn multipart_abort(&self, session: &MultipartSession) -> Result<()> {
        self.call("multipart_abort");
        self.uploads.lock().unwrap().remove(&session.token);
        Ok(())
    }
}

impl QueryClient for MockRepository {
    async fn search(&self, _query: &ItemQuery) -> depot_spec::Result<ResultReader<RemoteItem>> {
        self.call("search");
        if self.fail_search {
            return Err(depot_spec::Error::Query("401 unauthorized".into()));
        }
        let items: Vec<RemoteItem> = self.files.lock().unwrap().iter().map(|(path, s)| s.item(path)).collect();
        Ok(ResultWriter::collect_from(items)?)
    }
}

/// Route `tracing` output through the test harness. `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn write_file(root: &Path, relative: &str, data: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

pub fn dir_pattern(root: &Path, tail: &str) -> String { format!("{}/{tail}", root.to_string_lossy()) }
