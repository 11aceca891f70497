use std::sync::Arc;

use rationalizer_core::{Config, WorkflowOrchestrator};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<WorkflowOrchestrator>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<WorkflowOrchestrator>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            orchestrator,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &WorkflowOrchestrator {
        self.orchestrator.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
