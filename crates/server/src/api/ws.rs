//! WebSocket support for live workflow updates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use rationalizer_core::{ArtifactKind, StageKind, StagePhase, StatusEntry, WorkflowUpdate};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A status entry was appended to the session log.
    Status { entry: StatusEntry },
    /// A running stage's progress bar moved.
    Progress { stage: StageKind, progress: u8 },
    /// A stage run finished, successfully or not.
    StageSettled {
        stage: StageKind,
        phase: StagePhase,
        completed: bool,
    },
    /// The upload summary table may now be shown.
    UploadRevealed,
    /// A report was written to the downloads directory.
    ArtifactSaved { kind: ArtifactKind, path: PathBuf },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    /// Metric label for this message type.
    pub fn kind(&self) -> &'static str {
        match self {
            WsMessage::Status { .. } => "status",
            WsMessage::Progress { .. } => "progress",
            WsMessage::StageSettled { .. } => "stage_settled",
            WsMessage::UploadRevealed => "upload_revealed",
            WsMessage::ArtifactSaved { .. } => "artifact_saved",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

impl From<WorkflowUpdate> for WsMessage {
    fn from(update: WorkflowUpdate) -> Self {
        match update {
            WorkflowUpdate::Status { entry } => WsMessage::Status { entry },
            WorkflowUpdate::Progress { stage, progress } => WsMessage::Progress { stage, progress },
            WorkflowUpdate::StageSettled {
                stage,
                phase,
                completed,
            } => WsMessage::StageSettled {
                stage,
                phase,
                completed,
            },
            WorkflowUpdate::UploadRevealed => WsMessage::UploadRevealed,
            WorkflowUpdate::ArtifactSaved { kind, path } => WsMessage::ArtifactSaved { kind, path },
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Forward a workflow update to all clients.
    pub fn workflow_update(&self, update: WorkflowUpdate) {
        self.broadcast(update.into());
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // First tick fires immediately
        heartbeat.tick().await;

        loop {
            let msg = tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(msg) => msg,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket client lagged, skipped {} messages", n);
                            WS_LAG_EVENTS.inc();
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Broadcast channel closed");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => WsMessage::Heartbeat {
                    timestamp: chrono::Utc::now().timestamp(),
                },
            };

            WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize WsMessage: {}", e);
                }
            }
        }
    });

    // Client messages are not part of the protocol; only close matters.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization_tags() {
        let msg = WsMessage::Progress {
            stage: StageKind::Taxonomy,
            progress: 42,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["stage"], "taxonomy");
        assert_eq!(json["progress"], 42);

        let json = serde_json::to_value(WsMessage::UploadRevealed).unwrap();
        assert_eq!(json["type"], "upload_revealed");

        let json = serde_json::to_value(WsMessage::Heartbeat { timestamp: 7 }).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert_eq!(json["timestamp"], 7);
    }

    #[test]
    fn test_from_workflow_update() {
        let msg: WsMessage = WorkflowUpdate::StageSettled {
            stage: StageKind::Gartner,
            phase: StagePhase::Done,
            completed: true,
        }
        .into();
        assert_eq!(
            msg,
            WsMessage::StageSettled {
                stage: StageKind::Gartner,
                phase: StagePhase::Done,
                completed: true,
            }
        );
        assert_eq!(msg.kind(), "stage_settled");
    }

    #[tokio::test]
    async fn test_broadcaster_fans_out() {
        let broadcaster = WsBroadcaster::new(8);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.workflow_update(WorkflowUpdate::UploadRevealed);

        assert_eq!(a.recv().await.unwrap(), WsMessage::UploadRevealed);
        assert_eq!(b.recv().await.unwrap(), WsMessage::UploadRevealed);
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let broadcaster = WsBroadcaster::default();
        broadcaster.broadcast(WsMessage::Heartbeat { timestamp: 0 });
    }
}
