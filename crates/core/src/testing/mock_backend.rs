//! Mock mapping server for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{
    ArtifactKind, BackendError, GartnerRow, MappingBackend, TaxonomyRow, UploadSummaryRow,
};
use crate::input::{FileHandle, Industry};

/// Mapping server operations, for scripting and call assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Upload,
    MapTaxonomy,
    MapGartner,
    Download,
}

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Upload { file_name: String },
    MapTaxonomy { industry: Industry },
    MapGartner,
    Download { kind: ArtifactKind },
}

impl RecordedCall {
    pub fn operation(&self) -> MockOperation {
        match self {
            RecordedCall::Upload { .. } => MockOperation::Upload,
            RecordedCall::MapTaxonomy { .. } => MockOperation::MapTaxonomy,
            RecordedCall::MapGartner => MockOperation::MapGartner,
            RecordedCall::Download { .. } => MockOperation::Download,
        }
    }
}

/// How one operation behaves when called.
#[derive(Debug, Clone, Default)]
struct Script {
    delay: Option<Duration>,
    failure: Option<String>,
    hang: bool,
}

/// Mock implementation of the MappingBackend trait.
///
/// Provides controllable behavior for testing:
/// - Scripted summaries per operation
/// - Per-operation latency, failures, or calls that never return
/// - Recorded calls for assertions
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new();
/// backend.set_taxonomy_summary(vec![/* rows */]).await;
/// backend.set_delay(MockOperation::MapTaxonomy, Duration::from_secs(60)).await;
/// backend.fail(MockOperation::MapGartner, "server error").await;
///
/// // ... drive the workflow ...
///
/// assert_eq!(backend.call_count(MockOperation::MapTaxonomy).await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    upload_summary: Arc<RwLock<Vec<UploadSummaryRow>>>,
    taxonomy_summary: Arc<RwLock<Vec<TaxonomyRow>>>,
    gartner_summary: Arc<RwLock<Vec<GartnerRow>>>,
    artifacts: Arc<RwLock<HashMap<ArtifactKind, Vec<u8>>>>,
    scripts: Arc<RwLock<HashMap<MockOperation, Script>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MockBackend {
    /// Create a new mock that answers every call at once with empty summaries.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_upload_summary(&self, rows: Vec<UploadSummaryRow>) {
        *self.upload_summary.write().await = rows;
    }

    pub async fn set_taxonomy_summary(&self, rows: Vec<TaxonomyRow>) {
        *self.taxonomy_summary.write().await = rows;
    }

    pub async fn set_gartner_summary(&self, rows: Vec<GartnerRow>) {
        *self.gartner_summary.write().await = rows;
    }

    pub async fn set_artifact(&self, kind: ArtifactKind, bytes: Vec<u8>) {
        self.artifacts.write().await.insert(kind, bytes);
    }

    /// Delay every answer of `operation` by `delay`.
    pub async fn set_delay(&self, operation: MockOperation, delay: Duration) {
        self.scripts.write().await.entry(operation).or_default().delay = Some(delay);
    }

    /// Make `operation` fail with a 500 carrying `message`.
    pub async fn fail(&self, operation: MockOperation, message: impl Into<String>) {
        self.scripts.write().await.entry(operation).or_default().failure = Some(message.into());
    }

    /// Make `operation` never return.
    pub async fn hang(&self, operation: MockOperation) {
        self.scripts.write().await.entry(operation).or_default().hang = true;
    }

    /// Restore the default immediate, successful behavior of `operation`.
    pub async fn reset(&self, operation: MockOperation) {
        self.scripts.write().await.remove(&operation);
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, operation: MockOperation) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Record `call` and play its operation's script.
    async fn enter(&self, call: RecordedCall) -> Result<(), BackendError> {
        let operation = call.operation();
        self.calls.write().await.push(call);

        let script = self
            .scripts
            .read()
            .await
            .get(&operation)
            .cloned()
            .unwrap_or_default();

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        if script.hang {
            std::future::pending::<()>().await;
        }
        match script.failure {
            Some(message) => Err(BackendError::Rejected {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MappingBackend for MockBackend {
    async fn upload(&self, file: &FileHandle) -> Result<Vec<UploadSummaryRow>, BackendError> {
        self.enter(RecordedCall::Upload {
            file_name: file.name().to_string(),
        })
        .await?;
        Ok(self.upload_summary.read().await.clone())
    }

    async fn map_taxonomy(&self, industry: Industry) -> Result<Vec<TaxonomyRow>, BackendError> {
        self.enter(RecordedCall::MapTaxonomy { industry }).await?;
        Ok(self.taxonomy_summary.read().await.clone())
    }

    async fn map_gartner(&self) -> Result<Vec<GartnerRow>, BackendError> {
        self.enter(RecordedCall::MapGartner).await?;
        Ok(self.gartner_summary.read().await.clone())
    }

    async fn download_artifact(&self, kind: ArtifactKind) -> Result<Vec<u8>, BackendError> {
        self.enter(RecordedCall::Download { kind }).await?;
        Ok(self
            .artifacts
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}
