//! Animated workflow stages.
//!
//! Each long-running stage pairs a synthetic progress animation with a real
//! remote call and completes only when both are done.

mod runner;
mod types;

pub use runner::StageRunner;
pub use types::*;
