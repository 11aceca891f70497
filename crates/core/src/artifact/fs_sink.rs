//! File system artifact sink.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use super::config::DownloadConfig;
use super::{ArtifactError, ArtifactSink};
use crate::backend::ArtifactKind;

/// Writes artifacts to `<output_dir>/<fixed filename>`, replacing older copies.
pub struct FsArtifactSink {
    config: DownloadConfig,
}

impl FsArtifactSink {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn save(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|source| ArtifactError::DirectoryCreationFailed {
                path: dir.clone(),
                source,
            })?;

        let destination = self.config.path_for(kind);
        // Readers never observe a partially written report.
        let partial = destination.with_extension("partial");
        fs::write(&partial, bytes)
            .await
            .map_err(|source| ArtifactError::WriteFailed {
                path: partial.clone(),
                source,
            })?;
        fs::rename(&partial, &destination)
            .await
            .map_err(|source| ArtifactError::WriteFailed {
                path: destination.clone(),
                source,
            })?;

        info!("Saved {} artifact to {:?} ({} bytes)", kind, destination, bytes.len());
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sink_in(dir: &TempDir) -> FsArtifactSink {
        FsArtifactSink::new(DownloadConfig {
            output_dir: dir.path().join("reports"),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_save_creates_dir_and_writes_fixed_name() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        let path = sink.save(ArtifactKind::Ppt, b"deck-bytes").await.unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("reports")
                .join("Application_Rationalization_Heatmap.pptx")
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"deck-bytes");
        assert!(!path.with_extension("partial").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_copy() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        sink.save(ArtifactKind::Excel, b"first").await.unwrap();
        let path = sink.save(ArtifactKind::Excel, b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
