pub mod artifact;
pub mod backend;
pub mod config;
pub mod input;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod stage;
pub mod status;
pub mod testing;
pub mod workflow;

pub use artifact::{ArtifactError, ArtifactSink, DownloadConfig, FsArtifactSink};
pub use backend::{
    ArtifactKind, BackendError, GartnerRow, HttpBackend, MappingBackend, TaxonomyRow,
    UploadSummaryRow,
};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendConfig, Config, ConfigError,
    ServerConfig,
};
pub use input::{FileHandle, Industry, InputError};
pub use report::{result_tables, ResultTable};
pub use stage::{StageKind, StagePhase, StageSnapshot};
pub use status::{Severity, StatusEntry, StatusLog};
pub use workflow::{
    IgnoredReason, IntentOutcome, WorkflowConfig, WorkflowOrchestrator, WorkflowSnapshot,
    WorkflowUpdate, WorkflowUpdateCallback,
};
