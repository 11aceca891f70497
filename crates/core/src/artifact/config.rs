//! Download configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backend::ArtifactKind;

/// Where downloaded reports are written and under which names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory receiving downloaded artifacts (created on first save).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fixed filename for the heatmap deck.
    #[serde(default = "default_ppt_filename")]
    pub ppt_filename: String,

    /// Fixed filename for the Gartner workbook.
    #[serde(default = "default_excel_filename")]
    pub excel_filename: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_ppt_filename() -> String {
    "Application_Rationalization_Heatmap.pptx".to_string()
}

fn default_excel_filename() -> String {
    "Gartner_Mapping_Full_Report.xlsx".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            ppt_filename: default_ppt_filename(),
            excel_filename: default_excel_filename(),
        }
    }
}

impl DownloadConfig {
    pub fn filename(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Ppt => &self.ppt_filename,
            ArtifactKind::Excel => &self.excel_filename,
        }
    }

    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.output_dir.join(self.filename(kind))
    }
}
