//! Workflow orchestrator implementation.
//!
//! Owns the session behind a lock and spawns the background work each
//! intent needs:
//! - Upload: one remote call, then a delayed summary reveal
//! - Taxonomy / Gartner: a remote call racing a progress ticker
//! - Downloads: fire-and-forget fetch and save

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::artifact::ArtifactSink;
use crate::backend::{ArtifactKind, MappingBackend};
use crate::input::{FileHandle, Industry};
use crate::stage::{RunToken, StageEvent, StageKind};
use crate::status::StatusEntry;

use super::config::WorkflowConfig;
use super::session::WorkflowSession;
use super::types::{IgnoredReason, IntentOutcome, WorkflowSnapshot, WorkflowUpdate};

/// Callback invoked for every workflow update (status entries, progress,
/// settled stages). Used to fan updates out to WebSocket clients.
pub type WorkflowUpdateCallback = Arc<dyn Fn(WorkflowUpdate) + Send + Sync>;

/// Session plus the background tasks working on it, guarded together so a
/// restart and the replacement of its tasks happen atomically.
struct SessionState {
    session: WorkflowSession,
    tasks: HashMap<StageKind, Vec<JoinHandle<()>>>,
    downloads: Vec<JoinHandle<()>>,
}

impl SessionState {
    /// Abort the tasks of `stage` and track `handles` in their place.
    fn replace_tasks(&mut self, stage: StageKind, handles: Vec<JoinHandle<()>>) {
        if let Some(previous) = self.tasks.insert(stage, handles) {
            for handle in previous {
                handle.abort();
            }
        }
    }
}

#[derive(Clone)]
struct Notifier {
    callback: Option<WorkflowUpdateCallback>,
}

impl Notifier {
    fn send(&self, update: WorkflowUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }

    /// Publish every status entry appended after `mark`.
    fn entries_since(&self, session: &WorkflowSession, mark: u64) {
        if self.callback.is_none() {
            return;
        }
        for entry in session.log().since(mark) {
            self.send(WorkflowUpdate::Status {
                entry: entry.clone(),
            });
        }
    }

    fn settled(&self, session: &WorkflowSession, stage: StageKind) {
        let (phase, completed) = session.stage_state(stage);
        self.send(WorkflowUpdate::StageSettled {
            stage,
            phase,
            completed,
        });
    }
}

/// Drives one workflow session against the mapping server.
///
/// Intent methods return as soon as the transition is applied; remote calls
/// and progress animation continue on spawned tasks. Intents whose
/// precondition does not hold return [`IntentOutcome::Ignored`] and change
/// nothing.
pub struct WorkflowOrchestrator {
    config: WorkflowConfig,
    backend: Arc<dyn MappingBackend>,
    sink: Arc<dyn ArtifactSink>,
    state: Arc<RwLock<SessionState>>,
    notifier: Notifier,
}

impl WorkflowOrchestrator {
    /// Create a new orchestrator with a fresh session.
    pub fn new(
        config: WorkflowConfig,
        backend: Arc<dyn MappingBackend>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        let session = WorkflowSession::new(&config);
        info!("Workflow session {} created", session.id());

        Self {
            config,
            backend,
            sink,
            state: Arc::new(RwLock::new(SessionState {
                session,
                tasks: HashMap::new(),
                downloads: Vec::new(),
            })),
            notifier: Notifier { callback: None },
        }
    }

    /// Set the update callback for real-time notifications.
    pub fn with_update_callback(mut self, callback: WorkflowUpdateCallback) -> Self {
        self.notifier.callback = Some(callback);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Current state of the session.
    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.state.read().await.session.snapshot()
    }

    /// Status entries appended after `since`, with the id of the newest entry.
    pub async fn status_since(&self, since: u64) -> (Vec<StatusEntry>, u64) {
        let state = self.state.read().await;
        let log = state.session.log();
        (log.since(since).to_vec(), log.last_id())
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Select the inventory file at `path`, or clear the selection with `None`.
    ///
    /// A valid file replaces the previous one and starts its upload at once.
    /// An invalid one is reported in the status log and the previous file stays.
    pub async fn select_file(&self, path: Option<PathBuf>) -> IntentOutcome {
        let mut state = self.state.write().await;
        let mark = state.session.log().last_id();

        let Some(path) = path else {
            let outcome = state.session.clear_file();
            if outcome.is_ok() {
                state.replace_tasks(StageKind::Upload, Vec::new());
            }
            self.notifier.entries_since(&state.session, mark);
            return outcome.into();
        };

        let file = match FileHandle::from_path(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Invalid inventory file {:?}: {}", path, e);
                state.session.reject_file(&e);
                self.notifier.entries_since(&state.session, mark);
                return IntentOutcome::Accepted;
            }
        };

        let token = state.session.select_file(file.clone());
        let handle = self.spawn_upload(file, token);
        state.replace_tasks(StageKind::Upload, vec![handle]);
        self.notifier.entries_since(&state.session, mark);
        IntentOutcome::Accepted
    }

    /// Select the industry lens, or clear it with `None`.
    pub async fn select_industry(&self, industry: Option<Industry>) -> IntentOutcome {
        let mut state = self.state.write().await;
        let mark = state.session.log().last_id();
        let outcome = state.session.select_industry(industry);
        self.notifier.entries_since(&state.session, mark);
        outcome.into()
    }

    /// Start the taxonomy mapping.
    pub async fn run_taxonomy(&self) -> IntentOutcome {
        let mut state = self.state.write().await;
        let mark = state.session.log().last_id();

        let (token, industry) = match state.session.start_taxonomy(Instant::now()) {
            Ok(started) => started,
            Err(reason) => return self.ignored(StageKind::Taxonomy, reason),
        };

        let backend = Arc::clone(&self.backend);
        let call = async move {
            let result = backend
                .map_taxonomy(industry)
                .await
                .map_err(|e| e.status_message(StageKind::Taxonomy.failure_fallback()));
            move |session: &mut WorkflowSession| session.resolve_taxonomy(token, result)
        };

        let handles = vec![
            self.spawn_remote(StageKind::Taxonomy, call),
            self.spawn_ticker(StageKind::Taxonomy, token),
        ];
        state.replace_tasks(StageKind::Taxonomy, handles);
        self.notifier.entries_since(&state.session, mark);
        IntentOutcome::Accepted
    }

    /// Start the Gartner mapping, replacing a run already in flight.
    pub async fn run_gartner(&self) -> IntentOutcome {
        let mut state = self.state.write().await;
        let mark = state.session.log().last_id();

        let token = match state.session.start_gartner(Instant::now()) {
            Ok(token) => token,
            Err(reason) => return self.ignored(StageKind::Gartner, reason),
        };

        let backend = Arc::clone(&self.backend);
        let call = async move {
            let result = backend
                .map_gartner()
                .await
                .map_err(|e| e.status_message(StageKind::Gartner.failure_fallback()));
            move |session: &mut WorkflowSession| session.resolve_gartner(token, result)
        };

        let handles = vec![
            self.spawn_remote(StageKind::Gartner, call),
            self.spawn_ticker(StageKind::Gartner, token),
        ];
        state.replace_tasks(StageKind::Gartner, handles);
        self.notifier.entries_since(&state.session, mark);
        IntentOutcome::Accepted
    }

    /// Fetch a report artifact and save it locally.
    ///
    /// Returns once the download is under way; its result lands in the
    /// status log. Repeated downloads are allowed.
    pub async fn download(&self, kind: ArtifactKind) -> IntentOutcome {
        let mut state = self.state.write().await;
        if let Err(reason) = state.session.download_precondition(kind) {
            debug!("Ignoring {} download: {}", kind, reason);
            return IntentOutcome::Ignored(reason);
        }

        let handle = self.spawn_download(kind);
        state.downloads.retain(|h| !h.is_finished());
        state.downloads.push(handle);
        IntentOutcome::Accepted
    }

    /// Abort every background task. The session keeps its last state.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        let mut aborted = 0;
        for (_, handles) in state.tasks.drain() {
            for handle in handles {
                if !handle.is_finished() {
                    aborted += 1;
                }
                handle.abort();
            }
        }
        for handle in state.downloads.drain(..) {
            handle.abort();
        }
        info!("Workflow orchestrator stopped ({} stage tasks aborted)", aborted);
    }

    fn ignored(&self, stage: StageKind, reason: IgnoredReason) -> IntentOutcome {
        debug!("Ignoring {} request: {}", stage, reason);
        IntentOutcome::Ignored(reason)
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Spawn the upload call and, on success, the delayed summary reveal.
    fn spawn_upload(&self, file: FileHandle, token: RunToken) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let backend = Arc::clone(&self.backend);
        let notifier = self.notifier.clone();
        let reveal_delay = self.config.upload_reveal_delay();

        tokio::spawn(async move {
            let result = backend
                .upload(&file)
                .await
                .map_err(|e| e.status_message(StageKind::Upload.failure_fallback()));

            {
                let mut state = state.write().await;
                let mark = state.session.log().last_id();
                let event = state.session.resolve_upload(token, result);
                notifier.entries_since(&state.session, mark);
                if event.is_terminal() {
                    notifier.settled(&state.session, StageKind::Upload);
                }
                if event != StageEvent::Completed {
                    return;
                }
            }

            tokio::time::sleep(reveal_delay).await;

            let mut state = state.write().await;
            if state.session.reveal_upload(token) {
                debug!("Upload summary revealed");
                notifier.send(WorkflowUpdate::UploadRevealed);
            }
        })
    }

    /// Spawn a stage's remote call.
    ///
    /// `call` resolves to the transition that applies its result to the
    /// session.
    fn spawn_remote<F, R>(&self, stage: StageKind, call: F) -> JoinHandle<()>
    where
        F: Future<Output = R> + Send + 'static,
        R: FnOnce(&mut WorkflowSession) -> StageEvent + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let apply = call.await;

            let mut state = state.write().await;
            let mark = state.session.log().last_id();
            let event = apply(&mut state.session);
            notifier.entries_since(&state.session, mark);
            match event {
                StageEvent::Buffered => debug!("{} outcome held until progress completes", stage),
                StageEvent::Stale => debug!("Discarded stale {} outcome", stage),
                _ => {}
            }
            if event.is_terminal() {
                notifier.settled(&state.session, stage);
            }
        })
    }

    /// Spawn the progress ticker for run `token` of `stage`.
    ///
    /// Stops on settling or once superseded. While parked at 100% it keeps
    /// ticking only if a rendezvous timeout is configured.
    fn spawn_ticker(&self, stage: StageKind, token: RunToken) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let notifier = self.notifier.clone();
        let period = self.config.tick_interval();
        let keep_parked = self.config.rendezvous_timeout().is_some();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            let mut last_progress = 0u8;
            loop {
                interval.tick().await;

                let mut state = state.write().await;
                let mark = state.session.log().last_id();
                let event = state.session.tick(stage, token, Instant::now());
                notifier.entries_since(&state.session, mark);

                match event {
                    StageEvent::Progress(progress) => {
                        if progress != last_progress {
                            last_progress = progress;
                            notifier.send(WorkflowUpdate::Progress { stage, progress });
                        }
                    }
                    StageEvent::Parked => {
                        if last_progress != 100 {
                            last_progress = 100;
                            notifier.send(WorkflowUpdate::Progress {
                                stage,
                                progress: 100,
                            });
                        }
                        if !keep_parked {
                            debug!("{} parked at 100%, waiting for server", stage);
                            break;
                        }
                    }
                    StageEvent::Completed | StageEvent::Failed(_) => {
                        notifier.settled(&state.session, stage);
                        break;
                    }
                    StageEvent::Stale | StageEvent::Buffered => break,
                }
            }
        })
    }

    fn spawn_download(&self, kind: ArtifactKind) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let backend = Arc::clone(&self.backend);
        let sink = Arc::clone(&self.sink);
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let result = match backend.download_artifact(kind).await {
                Ok(bytes) => sink.save(kind, &bytes).await.map_err(|e| {
                    warn!("Failed to save {} artifact: {}", kind, e);
                    e.to_string()
                }),
                Err(e) => {
                    warn!("Failed to download {} artifact: {}", kind, e);
                    Err(e.status_message("Download failed"))
                }
            };

            let mut state = state.write().await;
            let mark = state.session.log().last_id();
            let saved = result.as_ref().ok().cloned();
            state.session.record_download(kind, result);
            notifier.entries_since(&state.session, mark);
            if let Some(path) = saved {
                notifier.send(WorkflowUpdate::ArtifactSaved { kind, path });
            }
        })
    }
}
