use std::path::PathBuf;
use thiserror::Error;

use crate::outcome::{Failure, FailureKind};

/// Structural batch failures. These abort before any item runs; per-item
/// failures are reported in the [`BatchResult`](super::BatchResult) instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("cannot create target directory {path}: {source}")]
    TargetNotCreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extension: {extension:?}")]
    InvalidExtension { extension: String },

    #[error("cannot read source directory: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidExtension { .. } => FailureKind::UnknownFormat,
            _ => FailureKind::IoError,
        }
    }
}

impl From<BatchError> for Failure {
    fn from(err: BatchError) -> Self {
        Failure::new(err.kind(), err.to_string())
    }
}
