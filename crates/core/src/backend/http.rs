//! HTTP client for the mapping server.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::BackendConfig;
use crate::input::{FileHandle, Industry};
use crate::metrics::REMOTE_CALL_DURATION;

use super::types::{ErrorResponse, SummaryResponse};
use super::{
    ArtifactKind, BackendError, GartnerRow, MappingBackend, TaxonomyRow, UploadSummaryRow,
};

/// Mapping server client over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new client from configuration.
    ///
    /// No request timeout is applied unless `timeout_secs` is configured.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Decode a `{ "summary": [...] }` response, or turn it into a rejection.
    async fn read_summary<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, BackendError> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let parsed: SummaryResponse<T> = serde_json::from_slice(&body)
            .map_err(|e| BackendError::Parse(format!("invalid summary payload: {}", e)))?;
        Ok(parsed.summary)
    }
}

/// Build a rejection from an error body, preferring the server's `error` text
/// over the HTTP reason phrase.
fn rejection(status: StatusCode, body: &[u8]) -> BackendError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

    BackendError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn observe(operation: &str, started: Instant, ok: bool) {
    REMOTE_CALL_DURATION
        .with_label_values(&[operation, if ok { "success" } else { "failure" }])
        .observe(started.elapsed().as_secs_f64());
}

#[async_trait]
impl MappingBackend for HttpBackend {
    async fn upload(&self, file: &FileHandle) -> Result<Vec<UploadSummaryRow>, BackendError> {
        let started = Instant::now();
        debug!("Uploading {} ({} bytes)", file.name(), file.size_bytes());

        let bytes = tokio::fs::read(file.path()).await?;
        let part = multipart::Part::bytes(bytes).file_name(file.name().to_string());
        let form = multipart::Form::new().part("file", part);

        let result: Result<Vec<UploadSummaryRow>, BackendError> = async {
            let response = self
                .client
                .post(self.url("/api/upload"))
                .multipart(form)
                .send()
                .await?;
            Self::read_summary(response).await
        }
        .await;

        observe("upload", started, result.is_ok());
        result
    }

    async fn map_taxonomy(&self, industry: Industry) -> Result<Vec<TaxonomyRow>, BackendError> {
        let started = Instant::now();
        debug!("Requesting taxonomy mapping for industry '{}'", industry);

        let result: Result<Vec<TaxonomyRow>, BackendError> = async {
            let response = self
                .client
                .post(self.url("/api/map-cmdb"))
                .json(&serde_json::json!({ "industry": industry }))
                .send()
                .await?;
            Self::read_summary(response).await
        }
        .await;

        observe("map_taxonomy", started, result.is_ok());
        result
    }

    async fn map_gartner(&self) -> Result<Vec<GartnerRow>, BackendError> {
        let started = Instant::now();
        debug!("Requesting Gartner mapping");

        let result: Result<Vec<GartnerRow>, BackendError> = async {
            let response = self
                .client
                .post(self.url("/api/map-gartner"))
                .send()
                .await?;
            Self::read_summary(response).await
        }
        .await;

        observe("map_gartner", started, result.is_ok());
        result
    }

    async fn download_artifact(&self, kind: ArtifactKind) -> Result<Vec<u8>, BackendError> {
        let started = Instant::now();
        let endpoint = format!("/api/download/{}", kind.as_str());
        debug!("Downloading artifact from {}", endpoint);

        let result: Result<Vec<u8>, BackendError> = async {
            let response = self.client.get(self.url(&endpoint)).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            if !status.is_success() {
                return Err(rejection(status, &body));
            }
            Ok(body.to_vec())
        }
        .await;

        observe("download", started, result.is_ok());
        result
    }
}
