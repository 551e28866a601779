//! Artifactory REST client.

use std::fmt;
use std::io::BufReader;

use bytes::Bytes;
use depot_spec::{ItemQuery, Properties, QueryClient, RemoteItem};
use depot_stream::{ResultReader, ResultWriter};
use depot_verify::Checksums;
use futures_util::StreamExt;
use reqwest::{Body, Method, RequestBuilder, Response, StatusCode, header};
use semver::Version;
use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::client::{BoxStream, TransferClient};
use crate::data::{
    Auth, MultipartSession, MultipartStatus, PutBody, PutRequest, PutResponse, ServiceDetails, StatusResponse,
    TransferConfig,
};
use crate::error::{Result, TransferError};

/// Oldest server release that accepts multipart uploads.
const MULTIPART_MIN_VERSION: Version = Version::new(7, 82, 2);
const UPLOADS_API: &str = "api/v1/uploads";
const SEARCH_API: &str = "api/search/aql";

#[derive(Deserialize, Default)]
struct DeployResponse {
    #[serde(default)]
    checksums: Checksums,
}

#[derive(Deserialize)]
struct UploadsConfig {
    #[serde(default)]
    supported: bool,
}

#[derive(Deserialize)]
struct PartUrl {
    url: String,
}

/// Production client using `reqwest`.
///
/// Implements both [`TransferClient`] and [`QueryClient`]. Connect and request timeouts
/// come from [`TransferConfig`].
pub struct ReqwestClient {
    client:  reqwest::Client,
    url:     String,
    auth:    Option<Auth>,
    version: Option<Version>,
}

impl ReqwestClient {
    pub fn new(details: &impl ServiceDetails, config: &TransferConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.dial_timeout)
            .timeout(config.request_timeout)
            .build()?;
        let version = details.version().and_then(|v| Version::parse(v.trim_start_matches('v')).ok());

        Ok(Self {
            client,
            url: details.url().to_string(),
            auth: details.auth().cloned(),
            version,
        })
    }

    fn artifact_url(&self, path: &str, properties: &Properties) -> String {
        format!("{}/{}{}", self.url, encode_path(path), properties.to_matrix_params())
    }

    fn api_url(&self, endpoint: &str) -> String { format!("{}/{endpoint}", self.url) }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Some(Auth::Basic { user, password }) => builder.basic_auth(user, Some(password)),
            Some(Auth::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Calls after `create` authenticate with the upload token.
    fn uploads(&self, session: &MultipartSession, endpoint: &str) -> RequestBuilder {
        self.client
            .post(self.api_url(&format!("{UPLOADS_API}/{endpoint}")))
            .bearer_auth(&session.token)
    }

    async fn search_aql(&self, aql: String) -> Result<ResultReader<RemoteItem>> {
        let request = self
            .request(Method::POST, &self.api_url(SEARCH_API))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(aql);
        let mut response = ensure_success(request.send().await?).await?;

        let spool = NamedTempFile::new()?;
        let mut file = tokio::fs::File::from_std(spool.reopen()?);
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::task::spawn_blocking(move || parse_results(&spool)).await?
    }
}

fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn with_checksums(mut builder: RequestBuilder, checksums: &Checksums) -> RequestBuilder {
    for (name, value) in [
        ("X-Checksum-Sha1", &checksums.sha1),
        ("X-Checksum-Md5", &checksums.md5),
        ("X-Checksum", &checksums.sha256),
    ] {
        if !value.is_empty() {
            builder = builder.header(name, value.as_str());
        }
    }
    builder
}

async fn failure(response: Response) -> TransferError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("request failed").to_string(),
        text => text.to_string(),
    };
    TransferError::http(status.as_u16(), message)
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() { Ok(response) } else { Err(failure(response).await) }
}

async fn expect_status(response: Response, expected: StatusCode) -> Result<()> {
    if response.status() == expected { Ok(()) } else { Err(failure(response).await) }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| TransferError::http(status, format!("malformed response body: {e}")))
}

impl TransferClient for ReqwestClient {
    fn service_url(&self) -> &str { &self.url }

    async fn put(&self, request: PutRequest) -> Result<PutResponse> {
        let url = self.artifact_url(&request.target, &request.properties);
        let mut builder = with_checksums(self.request(Method::PUT, &url), &request.checksums);
        if request.explode {
            builder = builder.header("X-Explode-Archive", "true");
        }
        builder = match &request.body {
            PutBody::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                builder
                    .header(header::CONTENT_LENGTH, request.size)
                    .body(Body::wrap_stream(ReaderStream::new(file)))
            }
            PutBody::Empty => builder.body(Vec::new()),
        };

        let response = ensure_success(builder.send().await?).await?;
        let body = response.bytes().await?;
        let checksums = serde_json::from_slice::<DeployResponse>(&body).map(|r| r.checksums).unwrap_or_default();
        Ok(PutResponse { checksums })
    }

    async fn checksum_deploy(&self, target: &str, checksums: &Checksums, properties: &Properties) -> Result<bool> {
        let url = self.artifact_url(target, properties);
        let response = with_checksums(self.request(Method::PUT, &url), checksums)
            .header("X-Checksum-Deploy", "true")
            .body(Vec::new())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }

    async fn get(&self, path: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
        let url = self.artifact_url(path, &Properties::new());
        let response = ensure_success(self.request(Method::GET, &url).send().await?).await?;
        Ok(Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(TransferError::from))))
    }

    async fn multipart_supported(&self) -> Result<bool> {
        if self.version.as_ref().is_some_and(|v| *v < MULTIPART_MIN_VERSION) {
            return Ok(false);
        }
        let url = self.api_url(&format!("{UPLOADS_API}/config"));
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let config: UploadsConfig = read_json(ensure_success(response).await?).await?;
        Ok(config.supported)
    }

    async fn multipart_create(&self, target: &str, properties: &Properties, part_size_mb: u64) -> Result<MultipartSession> {
        let (repo, path) = target.split_once('/').unwrap_or((target, ""));
        let repo_path = if properties.is_empty() { path.to_string() } else { format!("{path};{properties}") };
        let url = self.api_url(&format!("{UPLOADS_API}/create"));
        let response = self
            .request(Method::POST, &url)
            .query(&[("repoKey", repo), ("repoPath", repo_path.as_str())])
            .query(&[("partSizeMB", part_size_mb)])
            .send()
            .await?;
        read_json(ensure_success(response).await?).await
    }

    async fn multipart_upload_part(&self, session: &MultipartSession, part_number: u32, data: Bytes) -> Result<()> {
        let response = self.uploads(session, "urlPart").query(&[("partNumber", part_number)]).send().await?;
        let part: PartUrl = read_json(ensure_success(response).await?).await?;
        ensure_success(self.client.put(&part.url).body(data).send().await?).await?;
        Ok(())
    }

    async fn multipart_commit(&self, session: &MultipartSession, sha1: &str) -> Result<()> {
        let response = self.uploads(session, "complete").query(&[("sha1", sha1)]).send().await?;
        expect_status(response, StatusCode::ACCEPTED).await
    }

    async fn multipart_status(&self, session: &MultipartSession) -> Result<StatusResponse> {
        let response = self.uploads(session, "status").send().await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(StatusResponse::new(MultipartStatus::RetryableError));
        }
        read_json(ensure_success(response).await?).await
    }

    async fn multipart_abort(&self, session: &MultipartSession) -> Result<()> {
        let response = self.uploads(session, "abort").send().await?;
        expect_status(response, StatusCode::NO_CONTENT).await
    }
}

impl QueryClient for ReqwestClient {
    async fn search(&self, query: &ItemQuery) -> depot_spec::Result<ResultReader<RemoteItem>> {
        let aql = query.to_aql();
        self.search_aql(aql).await.map_err(|e| depot_spec::Error::Query(e.to_string()))
    }
}

/// Stream the `results` array of a spooled search response into a result store.
fn parse_results(spool: &NamedTempFile) -> Result<ResultReader<RemoteItem>> {
    let writer = ResultWriter::new();
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(spool.reopen()?));
    ResultsBody { writer: &writer }
        .deserialize(&mut deserializer)
        .map_err(|e| TransferError::http(200, format!("malformed search response: {e}")))?;
    Ok(writer.finish()?)
}

struct ResultsBody<'a> {
    writer: &'a ResultWriter<RemoteItem>,
}

impl<'de> DeserializeSeed<'de> for ResultsBody<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for ResultsBody<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("a search response object") }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "results" {
                map.next_value_seed(ResultRows { writer: self.writer })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct ResultRows<'a> {
    writer: &'a ResultWriter<RemoteItem>,
}

impl<'de> DeserializeSeed<'de> for ResultRows<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ResultRows<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("an array of items") }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while let Some(item) = seq.next_element::<RemoteItem>()? {
            self.writer.write(&item).map_err(de::Error::custom)?;
        }
        Ok(())
    }
}
