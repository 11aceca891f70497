//! Types for the workflow orchestrator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{ArtifactKind, GartnerRow, TaxonomyRow, UploadSummaryRow};
use crate::input::Industry;
use crate::stage::{StageKind, StagePhase, StageSnapshot};
use crate::status::StatusEntry;

/// Why an operator intent was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    NoFileSelected,
    NoIndustrySelected,
    UploadInFlight,
    StageRunning(StageKind),
    TaxonomyNotCompleted,
    GartnerNotCompleted,
    Unchanged,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoredReason::NoFileSelected => write!(f, "no inventory file selected"),
            IgnoredReason::NoIndustrySelected => write!(f, "no industry selected"),
            IgnoredReason::UploadInFlight => write!(f, "upload still in progress"),
            IgnoredReason::StageRunning(stage) => write!(f, "{} stage already running", stage),
            IgnoredReason::TaxonomyNotCompleted => write!(f, "taxonomy mapping not completed"),
            IgnoredReason::GartnerNotCompleted => write!(f, "Gartner mapping not completed"),
            IgnoredReason::Unchanged => write!(f, "nothing to change"),
        }
    }
}

/// Result of submitting an operator intent.
///
/// Intents never fail loudly: one whose precondition does not hold is a
/// no-op that reports why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    Accepted,
    Ignored(IgnoredReason),
}

impl IntentOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IntentOutcome::Accepted)
    }
}

impl From<Result<(), IgnoredReason>> for IntentOutcome {
    fn from(result: Result<(), IgnoredReason>) -> Self {
        match result {
            Ok(()) => IntentOutcome::Accepted,
            Err(reason) => IntentOutcome::Ignored(reason),
        }
    }
}

/// Selected inventory file, as shown in the upload zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: u64,
    pub display_size: String,
}

/// Upload slot state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSnapshot {
    pub in_flight: bool,
    pub summary: Option<Vec<UploadSummaryRow>>,
    /// Whether the summary table has been revealed to the operator.
    pub revealed: bool,
}

/// Which operator actions are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGates {
    pub can_run_taxonomy: bool,
    pub can_run_gartner: bool,
    pub can_download_ppt: bool,
    pub can_download_excel: bool,
}

/// Everything the presentation layer needs to render the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub session_id: Uuid,
    pub file: Option<FileInfo>,
    pub industry: Option<Industry>,
    pub upload: UploadSnapshot,
    pub taxonomy: StageSnapshot<Vec<TaxonomyRow>>,
    pub gartner: StageSnapshot<Vec<GartnerRow>>,
    pub gates: ActionGates,
    pub ppt_downloaded: bool,
    pub excel_downloaded: bool,
    pub status_log: Vec<StatusEntry>,
}

/// Incremental change pushed to subscribers as the workflow moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowUpdate {
    /// A status entry was appended.
    Status { entry: StatusEntry },
    /// A running stage's progress changed.
    Progress { stage: StageKind, progress: u8 },
    /// A stage run reached a terminal state.
    StageSettled {
        stage: StageKind,
        phase: StagePhase,
        completed: bool,
    },
    /// The upload summary is now visible.
    UploadRevealed,
    /// A report artifact was saved locally.
    ArtifactSaved { kind: ArtifactKind, path: PathBuf },
}
