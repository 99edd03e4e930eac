//! Batch conversion over a directory with per-item failure isolation.

mod error;
mod runner;
mod types;

pub use error::BatchError;
pub use runner::BatchOrchestrator;
pub use types::{BatchItem, BatchMode, BatchOptions, BatchResult, CancelFlag};
