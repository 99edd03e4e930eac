//! Operation outcome types shared by the executor, batch runner and log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Classification of a failed operation.
///
/// Routing kinds (`UnknownFormat`, `NoOpConversion`, `UnsupportedConversion`)
/// are produced before any file is touched. The rest are execution-time kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownFormat,
    NoOpConversion,
    UnsupportedConversion,
    PasswordRequired,
    EmptyOutput,
    BackendError,
    Timeout,
    IoError,
    /// A worker panicked while running the operation.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownFormat => "unknown_format",
            Self::NoOpConversion => "no_op_conversion",
            Self::UnsupportedConversion => "unsupported_conversion",
            Self::PasswordRequired => "password_required",
            Self::EmptyOutput => "empty_output",
            Self::BackendError => "backend_error",
            Self::Timeout => "timeout",
            Self::IoError => "io_error",
            Self::Internal => "internal",
        }
    }

    /// Whether this failure was decided at routing time, before any side effect.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            Self::UnknownFormat | Self::NoOpConversion | Self::UnsupportedConversion
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure: the kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(context: impl fmt::Display, err: &std::io::Error) -> Self {
        Self::new(FailureKind::IoError, format!("{}: {}", context, err))
    }
}

/// Result of one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Success {
        output_path: PathBuf,
        bytes_written: u64,
        duration_ms: u64,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success { output_path, .. } => Some(output_path),
            Self::Failure { .. } => None,
        }
    }
}

impl From<Failure> for ConversionOutcome {
    fn from(failure: Failure) -> Self {
        Self::Failure {
            kind: failure.kind,
            message: failure.message,
        }
    }
}
