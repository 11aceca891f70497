//! Synchronous workflow state and its transition rules.

use std::path::PathBuf;

use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{ArtifactKind, GartnerRow, TaxonomyRow, UploadSummaryRow};
use crate::input::{FileHandle, Industry, InputError};
use crate::metrics::{ARTIFACT_DOWNLOADS, STAGE_OUTCOMES, STAGE_RUNS_STARTED};
use crate::progress::ProgressAnimator;
use crate::stage::{RemoteOutcome, RunToken, StageEvent, StageKind, StagePhase, StageRunner};
use crate::status::StatusLog;

use super::config::WorkflowConfig;
use super::types::{ActionGates, FileInfo, IgnoredReason, UploadSnapshot, WorkflowSnapshot};

#[derive(Debug)]
struct UploadSlot {
    token: RunToken,
    in_flight: bool,
    summary: Option<Vec<UploadSummaryRow>>,
    revealed: bool,
}

impl UploadSlot {
    fn new() -> Self {
        Self {
            token: RunToken::initial(),
            in_flight: false,
            summary: None,
            revealed: false,
        }
    }

    /// Invalidate whatever upload is in flight and clear its results.
    fn reset(&mut self) -> RunToken {
        self.token = self.token.next();
        self.in_flight = false;
        self.summary = None;
        self.revealed = false;
        self.token
    }
}

/// One operator's pass through the upload, mapping and download steps.
///
/// Holds no timers or tasks; every transition takes the current time or the
/// result of a remote call as input. Transitions that change state append to
/// the status log; rejected intents leave both state and log untouched.
#[derive(Debug)]
pub struct WorkflowSession {
    id: Uuid,
    log: StatusLog,
    file: Option<FileHandle>,
    industry: Option<Industry>,
    upload: UploadSlot,
    taxonomy: StageRunner<Vec<TaxonomyRow>>,
    gartner: StageRunner<Vec<GartnerRow>>,
    ppt_downloaded: bool,
    excel_downloaded: bool,
}

impl WorkflowSession {
    pub fn new(config: &WorkflowConfig) -> Self {
        let timeout = config.rendezvous_timeout();
        Self {
            id: Uuid::new_v4(),
            log: StatusLog::new(),
            file: None,
            industry: None,
            upload: UploadSlot::new(),
            taxonomy: StageRunner::new(
                StageKind::Taxonomy,
                ProgressAnimator::new(config.taxonomy_duration()),
            )
            .with_rendezvous_timeout(timeout),
            gartner: StageRunner::new(
                StageKind::Gartner,
                ProgressAnimator::new(config.gartner_duration()),
            )
            .with_rendezvous_timeout(timeout),
            ppt_downloaded: false,
            excel_downloaded: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn log(&self) -> &StatusLog {
        &self.log
    }

    pub fn file(&self) -> Option<&FileHandle> {
        self.file.as_ref()
    }

    pub fn industry(&self) -> Option<Industry> {
        self.industry
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Select `file` and begin its upload, superseding any earlier one.
    pub fn select_file(&mut self, file: FileHandle) -> RunToken {
        self.log.info(format!("File selected: {}", file.name()));
        info!("Inventory file selected: {} ({} bytes)", file.name(), file.size_bytes());

        let token = self.upload.reset();
        self.upload.in_flight = true;
        self.file = Some(file);
        STAGE_RUNS_STARTED
            .with_label_values(&[StageKind::Upload.as_str()])
            .inc();
        token
    }

    /// Record a selection that failed validation. The previous file stays.
    pub fn reject_file(&mut self, error: &InputError) {
        debug!("Rejected file selection: {}", error);
        self.log.error(error.to_string());
    }

    /// Drop the selected file together with its upload.
    pub fn clear_file(&mut self) -> Result<(), IgnoredReason> {
        if self.file.is_none() {
            return Err(IgnoredReason::Unchanged);
        }
        self.file = None;
        self.upload.reset();
        self.log.info("File removed");
        Ok(())
    }

    pub fn resolve_upload(
        &mut self,
        token: RunToken,
        result: Result<Vec<UploadSummaryRow>, String>,
    ) -> StageEvent {
        if token != self.upload.token || !self.upload.in_flight {
            debug!(run = token.value(), "Ignoring stale upload result");
            return StageEvent::Stale;
        }
        self.upload.in_flight = false;

        match result {
            Ok(summary) => {
                info!("Upload accepted ({} summary rows)", summary.len());
                self.upload.summary = Some(summary);
                self.log.success(StageKind::Upload.completed_message());
                record_outcome(StageKind::Upload, "completed");
                StageEvent::Completed
            }
            Err(message) => {
                self.file = None;
                self.log.error(message.clone());
                record_outcome(StageKind::Upload, "failed");
                StageEvent::Failed(message)
            }
        }
    }

    /// Reveal the summary of upload `token`. Returns whether anything changed.
    pub fn reveal_upload(&mut self, token: RunToken) -> bool {
        if token != self.upload.token || self.upload.summary.is_none() || self.upload.revealed {
            return false;
        }
        self.upload.revealed = true;
        true
    }

    // =========================================================================
    // Industry
    // =========================================================================

    /// Set or clear the industry. Clearing is silent.
    pub fn select_industry(&mut self, industry: Option<Industry>) -> Result<(), IgnoredReason> {
        if self.industry == industry {
            return Err(IgnoredReason::Unchanged);
        }
        self.industry = industry;
        if let Some(industry) = industry {
            self.log.info(format!("Industry selected: {}", industry));
        }
        Ok(())
    }

    // =========================================================================
    // Mapping stages
    // =========================================================================

    fn taxonomy_precondition(&self) -> Result<Industry, IgnoredReason> {
        if self.file.is_none() {
            return Err(IgnoredReason::NoFileSelected);
        }
        let industry = self.industry.ok_or(IgnoredReason::NoIndustrySelected)?;
        if self.upload.in_flight {
            return Err(IgnoredReason::UploadInFlight);
        }
        // A run parked at 100% may be restarted; its late outcome goes stale.
        if self.taxonomy.phase() == StagePhase::Running {
            return Err(IgnoredReason::StageRunning(StageKind::Taxonomy));
        }
        Ok(industry)
    }

    fn gartner_precondition(&self) -> Result<(), IgnoredReason> {
        if !self.taxonomy.completed() {
            return Err(IgnoredReason::TaxonomyNotCompleted);
        }
        Ok(())
    }

    /// Start a taxonomy run; returns its token and the industry to map with.
    pub fn start_taxonomy(&mut self, now: Instant) -> Result<(RunToken, Industry), IgnoredReason> {
        let industry = self.taxonomy_precondition()?;
        let token = self.taxonomy.start(now, &mut self.log);
        Ok((token, industry))
    }

    /// Start a Gartner run. A run already in flight is replaced.
    pub fn start_gartner(&mut self, now: Instant) -> Result<RunToken, IgnoredReason> {
        self.gartner_precondition()?;
        Ok(self.gartner.start(now, &mut self.log))
    }

    pub fn tick(&mut self, stage: StageKind, token: RunToken, now: Instant) -> StageEvent {
        match stage {
            StageKind::Taxonomy => self.taxonomy.tick(token, now, &mut self.log),
            StageKind::Gartner => self.gartner.tick(token, now, &mut self.log),
            StageKind::Upload => StageEvent::Stale,
        }
    }

    pub fn resolve_taxonomy(
        &mut self,
        token: RunToken,
        result: Result<Vec<TaxonomyRow>, String>,
    ) -> StageEvent {
        self.taxonomy
            .resolve(token, RemoteOutcome::from(result), &mut self.log)
    }

    pub fn resolve_gartner(
        &mut self,
        token: RunToken,
        result: Result<Vec<GartnerRow>, String>,
    ) -> StageEvent {
        self.gartner
            .resolve(token, RemoteOutcome::from(result), &mut self.log)
    }

    /// Phase and completion flag of `stage`.
    pub fn stage_state(&self, stage: StageKind) -> (StagePhase, bool) {
        match stage {
            StageKind::Upload => {
                let phase = if self.upload.in_flight {
                    StagePhase::Running
                } else if self.upload.summary.is_some() {
                    StagePhase::Done
                } else {
                    StagePhase::Idle
                };
                (phase, self.upload.summary.is_some())
            }
            StageKind::Taxonomy => (self.taxonomy.phase(), self.taxonomy.completed()),
            StageKind::Gartner => (self.gartner.phase(), self.gartner.completed()),
        }
    }

    // =========================================================================
    // Downloads
    // =========================================================================

    pub fn download_precondition(&self, kind: ArtifactKind) -> Result<(), IgnoredReason> {
        match kind {
            ArtifactKind::Ppt if !self.taxonomy.completed() => {
                Err(IgnoredReason::TaxonomyNotCompleted)
            }
            ArtifactKind::Excel if !self.gartner.completed() => {
                Err(IgnoredReason::GartnerNotCompleted)
            }
            _ => Ok(()),
        }
    }

    pub fn record_download(&mut self, kind: ArtifactKind, result: Result<PathBuf, String>) {
        match result {
            Ok(path) => {
                match kind {
                    ArtifactKind::Ppt => self.ppt_downloaded = true,
                    ArtifactKind::Excel => self.excel_downloaded = true,
                }
                self.log.success(format!("{} downloaded", kind.label()));
                ARTIFACT_DOWNLOADS
                    .with_label_values(&[kind.as_str(), "success"])
                    .inc();
                info!("{} saved to {:?}", kind.label(), path);
            }
            Err(message) => {
                self.log.error(message);
                ARTIFACT_DOWNLOADS
                    .with_label_values(&[kind.as_str(), "failed"])
                    .inc();
            }
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn gates(&self) -> ActionGates {
        ActionGates {
            can_run_taxonomy: self.taxonomy_precondition().is_ok(),
            can_run_gartner: self.gartner_precondition().is_ok(),
            can_download_ppt: self.download_precondition(ArtifactKind::Ppt).is_ok(),
            can_download_excel: self.download_precondition(ArtifactKind::Excel).is_ok(),
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            session_id: self.id,
            file: self.file.as_ref().map(|f| FileInfo {
                name: f.name().to_string(),
                size_bytes: f.size_bytes(),
                display_size: f.display_size(),
            }),
            industry: self.industry,
            upload: UploadSnapshot {
                in_flight: self.upload.in_flight,
                summary: self.upload.summary.clone(),
                revealed: self.upload.revealed,
            },
            taxonomy: self.taxonomy.snapshot(),
            gartner: self.gartner.snapshot(),
            gates: self.gates(),
            ppt_downloaded: self.ppt_downloaded,
            excel_downloaded: self.excel_downloaded,
            status_log: self.log.entries().to_vec(),
        }
    }
}

fn record_outcome(stage: StageKind, result: &str) {
    STAGE_OUTCOMES
        .with_label_values(&[stage.as_str(), result])
        .inc();
}
