//! Types for workflow stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The stages of the rationalization workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Upload,
    Taxonomy,
    Gartner,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Upload => "upload",
            StageKind::Taxonomy => "taxonomy",
            StageKind::Gartner => "gartner",
        }
    }

    /// Status line appended when a run starts.
    pub fn start_message(&self) -> &'static str {
        match self {
            StageKind::Upload => "Uploading file…",
            StageKind::Taxonomy => "Starting taxonomy mapping…",
            StageKind::Gartner => "Starting Gartner mapping…",
        }
    }

    /// Status line appended when a run completes.
    pub fn completed_message(&self) -> &'static str {
        match self {
            StageKind::Upload => "File uploaded successfully",
            StageKind::Taxonomy => "Taxonomy mapping completed (100%)",
            StageKind::Gartner => "Gartner mapping completed (100%)",
        }
    }

    /// Status line used when a failure carries no message of its own.
    pub fn failure_fallback(&self) -> &'static str {
        match self {
            StageKind::Upload => "Upload failed",
            StageKind::Taxonomy => "Map CMDB failed",
            StageKind::Gartner => "Gartner mapping failed",
        }
    }

    pub fn timeout_message(&self) -> &'static str {
        match self {
            StageKind::Upload => "Upload timed out waiting for the server",
            StageKind::Taxonomy => "Taxonomy mapping timed out waiting for the server",
            StageKind::Gartner => "Gartner mapping timed out waiting for the server",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one stage slot.
///
/// `Idle -> Running -> (AwaitingRendezvous) -> Done | Failed`; a failed or
/// finished stage goes back to `Running` when started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    Idle,
    /// Animation below 100%.
    Running,
    /// Animation at 100%, remote call still outstanding.
    AwaitingRendezvous,
    Done,
    Failed,
}

impl StagePhase {
    /// Whether a run is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, StagePhase::Running | StagePhase::AwaitingRendezvous)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StagePhase::Idle => "idle",
            StagePhase::Running => "running",
            StagePhase::AwaitingRendezvous => "awaiting_rendezvous",
            StagePhase::Done => "done",
            StagePhase::Failed => "failed",
        }
    }
}

/// Identifies one run of a stage slot.
///
/// Ticks and remote outcomes carry the token of the run that produced them;
/// anything carrying an older token is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunToken(u64);

impl RunToken {
    pub(crate) fn initial() -> Self {
        RunToken(0)
    }

    pub(crate) fn next(self) -> Self {
        RunToken(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of the real remote call, as seen by the stage.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    Success(T),
    /// Carries the status-feed text for the failure.
    Failure(String),
}

impl<T> From<Result<T, String>> for RemoteOutcome<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(payload) => RemoteOutcome::Success(payload),
            Err(message) => RemoteOutcome::Failure(message),
        }
    }
}

/// What feeding a tick or an outcome into a stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// The event belonged to a superseded or already settled run.
    Stale,
    /// The animation advanced; value is the current percentage (< 100).
    Progress(u8),
    /// The remote outcome was stored until the animation reaches 100%.
    Buffered,
    /// The animation reached 100% before the remote outcome arrived.
    Parked,
    /// Both sides finished and the call succeeded.
    Completed,
    /// The run failed; carries the status-feed text.
    Failed(String),
}

impl StageEvent {
    /// Whether the run reached a terminal state with this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageEvent::Completed | StageEvent::Failed(_))
    }
}

/// Presentation view of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot<T> {
    pub phase: StagePhase,
    pub progress: u8,
    pub completed: bool,
    pub table: Option<T>,
}
