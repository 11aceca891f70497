//! Payloads exchanged with the mapping server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One row of the upload summary: spend grouped by application type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummaryRow {
    pub application_type: String,
    pub count: u64,
    pub total_spend: f64,
}

/// One row of the taxonomy mapping output, per L1 category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyRow {
    pub l1: String,
    pub applications_count: u64,
    pub spend: f64,
}

/// One row of the Gartner best-in-class mapping, per L1/L2 pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GartnerRow {
    pub l1: String,
    pub l2: String,
    #[serde(rename = "top5AppNames", default)]
    pub top5_app_names: Vec<String>,
    #[serde(default)]
    pub recommended_gartner_apps: String,
    #[serde(default)]
    pub market_leaders: String,
}

/// Envelope of every mapping response.
#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse<T> {
    #[serde(default = "Vec::new")]
    pub summary: Vec<T>,
}

/// Envelope of every error response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Generated report that can be downloaded once its stage is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Application rationalization heatmap deck, available after taxonomy.
    Ppt,
    /// Full Gartner mapping workbook, available after Gartner mapping.
    Excel,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Ppt => "ppt",
            ArtifactKind::Excel => "excel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Ppt => "PPT",
            ArtifactKind::Excel => "Excel report",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ppt" | "pptx" => Ok(ArtifactKind::Ppt),
            "excel" | "xlsx" => Ok(ArtifactKind::Excel),
            other => Err(format!("unknown artifact kind: {}", other)),
        }
    }
}
