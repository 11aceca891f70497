//! Rendezvous state machine for one animated stage.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::{STAGE_OUTCOMES, STAGE_RUNS_STARTED};
use crate::progress::ProgressAnimator;
use crate::status::StatusLog;

use super::types::{RemoteOutcome, RunToken, StageEvent, StageKind, StagePhase, StageSnapshot};

/// Drives one stage slot: a synthetic progress animation racing a remote call.
///
/// The stage settles only once both sides are done: the animation has
/// reached 100% and the call's outcome is known. Whichever finishes first
/// waits for the other. Progress never decreases within a run, except for
/// the reset to 0 on failure.
///
/// The runner owns no timers. The caller feeds it ticks and the remote
/// outcome, each tagged with the [`RunToken`] returned by [`start`](Self::start).
#[derive(Debug)]
pub struct StageRunner<T> {
    kind: StageKind,
    animator: ProgressAnimator,
    rendezvous_timeout: Option<Duration>,
    token: RunToken,
    phase: StagePhase,
    progress: u8,
    completed: bool,
    result: Option<T>,
    pending: Option<RemoteOutcome<T>>,
    started_at: Option<Instant>,
    parked_at: Option<Instant>,
}

impl<T> StageRunner<T> {
    pub fn new(kind: StageKind, animator: ProgressAnimator) -> Self {
        Self {
            kind,
            animator,
            rendezvous_timeout: None,
            token: RunToken::initial(),
            phase: StagePhase::Idle,
            progress: 0,
            completed: false,
            result: None,
            pending: None,
            started_at: None,
            parked_at: None,
        }
    }

    /// Fail runs that sit at 100% longer than `timeout` without an outcome.
    pub fn with_rendezvous_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.rendezvous_timeout = timeout;
        self
    }

    /// Begin a new run, superseding any run in flight.
    ///
    /// Clears the previous result, logs the start message and returns the
    /// token that ticks and the outcome of this run must carry.
    pub fn start(&mut self, now: Instant, log: &mut StatusLog) -> RunToken {
        if self.phase.is_active() {
            debug!(stage = %self.kind, run = self.token.value(), "Superseding running stage");
        }

        self.token = self.token.next();
        self.phase = StagePhase::Running;
        self.progress = 0;
        self.completed = false;
        self.result = None;
        self.pending = None;
        self.started_at = Some(now);
        self.parked_at = None;

        log.info(self.kind.start_message());
        STAGE_RUNS_STARTED
            .with_label_values(&[self.kind.as_str()])
            .inc();
        info!(stage = %self.kind, run = self.token.value(), "Stage started");

        self.token
    }

    /// Record the remote call's outcome for run `token`.
    ///
    /// While the animation is below 100% the outcome is held until it gets
    /// there. If the animation is already parked at 100% the run settles now.
    pub fn resolve(
        &mut self,
        token: RunToken,
        outcome: RemoteOutcome<T>,
        log: &mut StatusLog,
    ) -> StageEvent {
        if !self.owns(token) || self.pending.is_some() {
            debug!(stage = %self.kind, run = token.value(), "Ignoring stale outcome");
            return StageEvent::Stale;
        }

        match self.phase {
            StagePhase::AwaitingRendezvous => self.settle(outcome, log),
            _ => {
                self.pending = Some(outcome);
                StageEvent::Buffered
            }
        }
    }

    /// Advance the animation of run `token` to time `now`.
    pub fn tick(&mut self, token: RunToken, now: Instant, log: &mut StatusLog) -> StageEvent {
        if !self.owns(token) {
            return StageEvent::Stale;
        }

        if self.phase == StagePhase::AwaitingRendezvous {
            return self.check_rendezvous(now, log);
        }

        let started_at = self.started_at.unwrap_or(now);
        let sampled = self.animator.sample(now.saturating_duration_since(started_at));
        self.progress = self.progress.max(sampled);

        if self.progress < 100 {
            return StageEvent::Progress(self.progress);
        }

        match self.pending.take() {
            Some(outcome) => self.settle(outcome, log),
            None => {
                debug!(
                    stage = %self.kind,
                    run = token.value(),
                    "Animation done, waiting for server"
                );
                self.phase = StagePhase::AwaitingRendezvous;
                self.parked_at = Some(now);
                StageEvent::Parked
            }
        }
    }

    fn check_rendezvous(&mut self, now: Instant, log: &mut StatusLog) -> StageEvent {
        let (Some(timeout), Some(parked_at)) = (self.rendezvous_timeout, self.parked_at) else {
            return StageEvent::Parked;
        };
        if now.saturating_duration_since(parked_at) < timeout {
            return StageEvent::Parked;
        }

        let message = self.kind.timeout_message().to_string();
        warn!(stage = %self.kind, run = self.token.value(), "{}", message);
        self.fail(message.clone(), "timed_out", log);
        StageEvent::Failed(message)
    }

    fn settle(&mut self, outcome: RemoteOutcome<T>, log: &mut StatusLog) -> StageEvent {
        self.parked_at = None;
        match outcome {
            RemoteOutcome::Success(payload) => {
                self.phase = StagePhase::Done;
                self.progress = 100;
                self.completed = true;
                self.result = Some(payload);
                log.success(self.kind.completed_message());
                STAGE_OUTCOMES
                    .with_label_values(&[self.kind.as_str(), "completed"])
                    .inc();
                info!(stage = %self.kind, run = self.token.value(), "Stage completed");
                StageEvent::Completed
            }
            RemoteOutcome::Failure(message) => {
                warn!(stage = %self.kind, run = self.token.value(), "Stage failed: {}", message);
                self.fail(message.clone(), "failed", log);
                StageEvent::Failed(message)
            }
        }
    }

    fn fail(&mut self, message: String, result: &str, log: &mut StatusLog) {
        self.phase = StagePhase::Failed;
        self.progress = 0;
        self.completed = false;
        self.result = None;
        self.pending = None;
        self.parked_at = None;
        log.error(message);
        STAGE_OUTCOMES
            .with_label_values(&[self.kind.as_str(), result])
            .inc();
    }

    fn owns(&self, token: RunToken) -> bool {
        token == self.token && self.phase.is_active()
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Token of the latest run.
    pub fn current_token(&self) -> RunToken {
        self.token
    }
}

impl<T: Clone> StageRunner<T> {
    pub fn snapshot(&self) -> StageSnapshot<T> {
        StageSnapshot {
            phase: self.phase,
            progress: self.progress,
            completed: self.completed,
            table: self.result.clone(),
        }
    }
}
