//! Workflow timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of the stage animations and the upload summary reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How often running stages sample their progress curve (milliseconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Length of the taxonomy progress animation (milliseconds).
    #[serde(default = "default_taxonomy_duration")]
    pub taxonomy_duration_ms: u64,

    /// Length of the Gartner progress animation (milliseconds).
    #[serde(default = "default_gartner_duration")]
    pub gartner_duration_ms: u64,

    /// Delay between a successful upload and revealing its summary (milliseconds).
    #[serde(default = "default_reveal_delay")]
    pub upload_reveal_delay_ms: u64,

    /// How long a stage may sit at 100% waiting for the server before it
    /// fails (milliseconds). Unset waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendezvous_timeout_ms: Option<u64>,
}

fn default_tick_interval() -> u64 {
    200
}

fn default_taxonomy_duration() -> u64 {
    40_000 // 40 seconds
}

fn default_gartner_duration() -> u64 {
    25_000 // 25 seconds
}

fn default_reveal_delay() -> u64 {
    5_000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            taxonomy_duration_ms: default_taxonomy_duration(),
            gartner_duration_ms: default_gartner_duration(),
            upload_reveal_delay_ms: default_reveal_delay(),
            rendezvous_timeout_ms: None,
        }
    }
}

impl WorkflowConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn taxonomy_duration(&self) -> Duration {
        Duration::from_millis(self.taxonomy_duration_ms)
    }

    pub fn gartner_duration(&self) -> Duration {
        Duration::from_millis(self.gartner_duration_ms)
    }

    pub fn upload_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.upload_reveal_delay_ms)
    }

    pub fn rendezvous_timeout(&self) -> Option<Duration> {
        self.rendezvous_timeout_ms.map(Duration::from_millis)
    }
}
