//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits,
//! so the workflow can be exercised end to end without a mapping server.
//!
//! # Example
//!
//! ```rust,ignore
//! use rationalizer_core::testing::{fixtures, MockArtifactSink, MockBackend};
//!
//! let backend = Arc::new(MockBackend::new());
//! backend.set_taxonomy_summary(fixtures::taxonomy_summary()).await;
//!
//! let orchestrator = WorkflowOrchestrator::new(
//!     WorkflowConfig::default(),
//!     backend.clone(),
//!     Arc::new(MockArtifactSink::new()),
//! );
//! ```

mod mock_backend;
mod mock_sink;

pub use mock_backend::{MockBackend, MockOperation, RecordedCall};
pub use mock_sink::{MockArtifactSink, RecordedSave};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::backend::{GartnerRow, TaxonomyRow, UploadSummaryRow};

    /// Write a small inventory spreadsheet into `dir` and return its path.
    pub fn inventory_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        // Contents are opaque to the client; the server does the parsing.
        std::fs::write(&path, b"Application,Type,Spend\nLedger,COTS,120000\n")
            .unwrap_or_else(|e| panic!("failed to write fixture {:?}: {}", path, e));
        path
    }

    /// Upload summary with reasonable values.
    pub fn upload_summary() -> Vec<UploadSummaryRow> {
        vec![
            UploadSummaryRow {
                application_type: "COTS".to_string(),
                count: 42,
                total_spend: 1_250_000.0,
            },
            UploadSummaryRow {
                application_type: "Custom".to_string(),
                count: 17,
                total_spend: 480_500.75,
            },
        ]
    }

    /// Taxonomy mapping summary with reasonable values.
    pub fn taxonomy_summary() -> Vec<TaxonomyRow> {
        vec![
            TaxonomyRow {
                l1: "Clinical Operations".to_string(),
                applications_count: 23,
                spend: 910_000.0,
            },
            TaxonomyRow {
                l1: "Finance".to_string(),
                applications_count: 11,
                spend: 340_250.5,
            },
        ]
    }

    /// Gartner mapping summary with reasonable values.
    pub fn gartner_summary() -> Vec<GartnerRow> {
        vec![GartnerRow {
            l1: "Finance".to_string(),
            l2: "General Ledger".to_string(),
            top5_app_names: vec!["Ledger".to_string(), "PayHub".to_string()],
            recommended_gartner_apps: "Oracle Fusion".to_string(),
            market_leaders: "Oracle, SAP".to_string(),
        }]
    }
}
