use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;
use crate::outcome::{Failure, FailureKind};

use super::ranges::PageRangeError;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("merge needs at least two input files, got {count}")]
    NotEnoughInputs { count: usize },

    #[error("not a PDF file: {path}")]
    NotPdf { path: PathBuf },

    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{path} already exists")]
    TargetExists { path: PathBuf },

    #[error(transparent)]
    PageRange(#[from] PageRangeError),

    #[error("expected {expected} pages in {path}, found {actual}")]
    PageCountMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },

    #[error("unreadable page count: {output:?}")]
    BadPageCount { output: String },

    #[error("{path} is empty")]
    EmptyOutput { path: PathBuf },

    #[error("pdf tool timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error(transparent)]
    Tool(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotEnoughInputs { .. } | Self::PageRange(_) => FailureKind::UnsupportedConversion,
            Self::NotPdf { .. } => FailureKind::UnknownFormat,
            Self::NotFound { .. } | Self::TargetExists { .. } | Self::Io(_) => FailureKind::IoError,
            Self::PageCountMismatch { .. } | Self::BadPageCount { .. } => FailureKind::BackendError,
            Self::EmptyOutput { .. } => FailureKind::EmptyOutput,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Tool(e) => e.kind(),
        }
    }
}

impl From<PdfError> for Failure {
    fn from(err: PdfError) -> Self {
        let message = match &err {
            PdfError::Tool(e) => e.detailed_message(),
            other => other.to_string(),
        };
        Failure::new(err.kind(), message)
    }
}
