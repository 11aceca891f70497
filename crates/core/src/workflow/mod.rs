//! Workflow orchestration for the rationalization session.
//!
//! The operator moves through four steps, each gated on the previous one:
//! - **Upload**: selecting a file uploads it at once
//! - **Taxonomy**: needs an uploaded file and an industry
//! - **Gartner**: needs a completed taxonomy mapping
//! - **Download**: deck after taxonomy, workbook after Gartner

mod config;
mod runner;
mod session;
mod types;

pub use config::WorkflowConfig;
pub use runner::{WorkflowOrchestrator, WorkflowUpdateCallback};
pub use session::WorkflowSession;
pub use types::{
    ActionGates, FileInfo, IgnoredReason, IntentOutcome, UploadSnapshot, WorkflowSnapshot,
    WorkflowUpdate,
};
