//! Conversion orchestration for the `swissknife` command line tool.
//!
//! Requests are routed through a static format table to one of four
//! external-tool backends, executed in scoped staging directories and
//! recorded in an append-only operation log. Batch conversion, PDF merge and
//! split, summarization and file inspection are built on the same pieces.

pub mod backend;
pub mod batch;
pub mod config;
pub mod engine;
pub mod executor;
pub mod format;
pub mod inspect;
pub mod oplog;
pub mod outcome;
pub mod pdf;
pub mod router;
pub mod summarize;
pub mod testing;

pub use batch::{BatchError, BatchMode, BatchOptions, BatchResult, CancelFlag};
pub use config::{
    load_config, load_config_from_str, load_effective_config, validate_config, Config,
    ConfigError,
};
pub use engine::{Engine, EngineError, EngineParts};
pub use format::{BackendId, Category, FormatRegistry, RoutingError};
pub use oplog::{LogEntry, LogFilter, LogHandle, LogOutcome, LogStoreKind, Operation};
pub use outcome::{ConversionOutcome, Failure, FailureKind};
pub use router::{ConversionRequest, ConversionRouter, RoutingDecision};
pub use summarize::{SummaryLength, SummaryResult};
