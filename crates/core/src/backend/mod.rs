//! Remote mapping server contract.
//!
//! The server parses uploads, computes both mappings and renders the report
//! artifacts. This crate only calls it; the [`MappingBackend`] trait is the
//! seam the workflow depends on, with [`HttpBackend`] as the real client.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::input::{FileHandle, Industry};

/// Errors that can occur when calling the mapping server.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    /// Displays the server-provided message verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The server answered with a body we could not decode.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The upload file could not be read locally.
    #[error("Failed to read upload file: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Text for the status feed, falling back to `fallback` when the error
    /// carries no message.
    pub fn status_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// Client for the mapping server.
#[async_trait]
pub trait MappingBackend: Send + Sync {
    /// Upload an inventory file; returns spend grouped by application type.
    async fn upload(&self, file: &FileHandle) -> Result<Vec<UploadSummaryRow>, BackendError>;

    /// Map the most recently uploaded file onto the L1 taxonomy.
    async fn map_taxonomy(&self, industry: Industry) -> Result<Vec<TaxonomyRow>, BackendError>;

    /// Map the taxonomy output onto Gartner best-in-class vendors.
    async fn map_gartner(&self) -> Result<Vec<GartnerRow>, BackendError>;

    /// Fetch a generated report as raw bytes.
    async fn download_artifact(&self, kind: ArtifactKind) -> Result<Vec<u8>, BackendError>;
}
