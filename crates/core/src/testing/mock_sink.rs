//! Mock artifact sink for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::artifact::{ArtifactError, ArtifactSink};
use crate::backend::ArtifactKind;

/// A recorded save for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSave {
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
    pub path: PathBuf,
}

/// Mock implementation of the ArtifactSink trait.
///
/// Keeps saved artifacts in memory under `/mock/downloads`.
#[derive(Debug, Default)]
pub struct MockArtifactSink {
    saved: Arc<RwLock<Vec<RecordedSave>>>,
    /// If set, every save fails with this message.
    failure: Arc<RwLock<Option<String>>>,
}

impl MockArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded saves.
    pub async fn saved(&self) -> Vec<RecordedSave> {
        self.saved.read().await.clone()
    }

    /// Make subsequent saves fail.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }
}

#[async_trait]
impl ArtifactSink for MockArtifactSink {
    async fn save(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let path = PathBuf::from("/mock/downloads").join(format!("{}.bin", kind.as_str()));

        if let Some(message) = self.failure.read().await.clone() {
            return Err(ArtifactError::WriteFailed {
                path,
                source: std::io::Error::other(message),
            });
        }

        self.saved.write().await.push(RecordedSave {
            kind,
            bytes: bytes.to_vec(),
            path: path.clone(),
        });
        Ok(path)
    }
}
