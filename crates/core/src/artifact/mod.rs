//! Saving downloaded report artifacts.

mod config;
mod fs_sink;

pub use config::DownloadConfig;
pub use fs_sink::FsArtifactSink;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::backend::ArtifactKind;

/// Errors that can occur while saving an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Failed to create the output directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the artifact.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for downloaded artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store the bytes of `kind` under its fixed filename; returns where they went.
    async fn save(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf, ArtifactError>;
}
