use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;
use crate::format::RoutingError;
use crate::outcome::{Failure, FailureKind};

use super::llm::LlmError;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("cannot summarize {category} files")]
    Unsupported { category: String },

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("text extraction failed: {0}")]
    Extraction(#[from] BackendError),

    #[error("no text could be extracted from {path}")]
    NoText { path: PathBuf },

    #[error("summarizer error: {0}")]
    Llm(#[from] LlmError),

    #[error("summary is empty or too short ({chars} characters)")]
    EmptySummary { chars: usize },

    #[error("{stage} timed out after {timeout_secs}s")]
    Timeout {
        stage: &'static str,
        timeout_secs: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SummarizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } | Self::Io(_) => FailureKind::IoError,
            Self::TooLarge { .. } | Self::Unsupported { .. } => FailureKind::UnsupportedConversion,
            Self::Routing(e) => e.kind(),
            Self::Extraction(e) => e.kind(),
            Self::NoText { .. } | Self::EmptySummary { .. } => FailureKind::EmptyOutput,
            Self::Llm(LlmError::Timeout(_)) | Self::Timeout { .. } => FailureKind::Timeout,
            Self::Llm(_) => FailureKind::BackendError,
        }
    }
}

impl From<SummarizeError> for Failure {
    fn from(err: SummarizeError) -> Self {
        let message = match &err {
            SummarizeError::Extraction(e) => format!("text extraction failed: {}", e.detailed_message()),
            other => other.to_string(),
        };
        Failure::new(err.kind(), message)
    }
}
