//! Error types for the backend module.

use std::path::PathBuf;
use thiserror::Error;

use crate::outcome::{Failure, FailureKind};

/// Errors reported by an external transform.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Tool binary not found.
    #[error("{tool} not found at path: {path}")]
    ToolNotFound { tool: String, path: PathBuf },

    /// Input is encrypted and no password was supplied.
    #[error("Input is password protected: {path}")]
    PasswordRequired { path: PathBuf },

    /// A password was supplied but the tool rejected it.
    #[error("Incorrect password for {path}")]
    InvalidPassword { path: PathBuf },

    /// Tool ran and reported failure.
    #[error("{reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Failed to probe a file.
    #[error("Failed to probe file: {reason}")]
    ProbeFailed { reason: String },

    /// Input cannot be handled by this backend.
    #[error("Unsupported input: {reason}")]
    Unsupported { reason: String },

    /// I/O error while preparing or collecting files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Creates a failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Failure kind this error is reported as.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::PasswordRequired { .. } | Self::InvalidPassword { .. } => {
                FailureKind::PasswordRequired
            }
            Self::Io(_) => FailureKind::IoError,
            Self::Unsupported { .. } => FailureKind::UnsupportedConversion,
            Self::ToolNotFound { .. } | Self::Failed { .. } | Self::ProbeFailed { .. } => {
                FailureKind::BackendError
            }
        }
    }

    /// Message including the last stderr lines, if any.
    pub fn detailed_message(&self) -> String {
        match self {
            Self::Failed {
                reason,
                stderr: Some(stderr),
            } if !stderr.trim().is_empty() => format!("{}: {}", reason, stderr_tail(stderr, 5)),
            other => other.to_string(),
        }
    }
}

impl From<BackendError> for Failure {
    fn from(err: BackendError) -> Self {
        Failure::new(err.kind(), err.detailed_message())
    }
}

/// Last `lines` non-empty lines of tool stderr, joined with " | ".
pub(crate) fn stderr_tail(stderr: &str, lines: usize) -> String {
    let kept: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let path = PathBuf::from("a.zip");
        assert_eq!(
            BackendError::PasswordRequired { path: path.clone() }.kind(),
            FailureKind::PasswordRequired
        );
        assert_eq!(
            BackendError::InvalidPassword { path }.kind(),
            FailureKind::PasswordRequired
        );
        assert_eq!(
            BackendError::failed("exit 1", None).kind(),
            FailureKind::BackendError
        );
        assert_eq!(
            BackendError::Io(std::io::Error::other("disk")).kind(),
            FailureKind::IoError
        );
    }

    #[test]
    fn test_detailed_message_includes_stderr_tail() {
        let err = BackendError::failed(
            "ffmpeg exited with code 1",
            Some("line1\n\nline2\nInvalid data found\n".to_string()),
        );
        let failure: Failure = err.into();
        assert_eq!(failure.kind, FailureKind::BackendError);
        assert!(failure.message.starts_with("ffmpeg exited with code 1: "));
        assert!(failure.message.contains("Invalid data found"));
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail("a\nb\nc\nd", 2), "c | d");
        assert_eq!(stderr_tail("", 3), "");
    }
}
