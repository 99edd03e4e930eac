//! Log entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::outcome::{ConversionOutcome, Failure, FailureKind};

/// Kind of operation a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Convert,
    BatchItem,
    Summarize,
    Merge,
    Split,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::BatchItem => "batch_item",
            Self::Summarize => "summarize",
            Self::Merge => "merge",
            Self::Split => "split",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "convert" => Ok(Self::Convert),
            "batch_item" | "batch" => Ok(Self::BatchItem),
            "summarize" => Ok(Self::Summarize),
            "merge" => Ok(Self::Merge),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown operation: {}", other)),
        }
    }
}

/// How a logged operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogOutcome {
    Success,
    Failure { kind: FailureKind, message: String },
}

impl LogOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<&Failure> for LogOutcome {
    fn from(failure: &Failure) -> Self {
        Self::Failure {
            kind: failure.kind,
            message: failure.message.clone(),
        }
    }
}

/// One record in the operation log.
///
/// Created when an operation concludes. The writer may move `timestamp`
/// forward so that storage order and timestamp order agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub input: PathBuf,
    /// Further inputs, for operations with several (merge).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_inputs: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Further outputs, for operations with several (split).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_outputs: Vec<PathBuf>,
    pub outcome: LogOutcome,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
}

impl LogEntry {
    /// A successful entry stamped now. Use the `with_*` methods to fill in the rest.
    pub fn new(operation: Operation, input: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation,
            input: input.into(),
            extra_inputs: Vec::new(),
            output: None,
            extra_outputs: Vec::new(),
            outcome: LogOutcome::Success,
            duration_ms: 0,
            backend: None,
            batch_id: None,
            bytes_written: None,
        }
    }

    /// Entry for one conversion, taking output, size and duration from the outcome.
    pub fn for_conversion(
        operation: Operation,
        input: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        outcome: &ConversionOutcome,
        duration_ms: u64,
    ) -> Self {
        let entry = Self::new(operation, input)
            .with_output(target)
            .with_duration_ms(duration_ms);
        match outcome {
            ConversionOutcome::Success { bytes_written, .. } => {
                entry.with_bytes_written(*bytes_written)
            }
            ConversionOutcome::Failure { kind, message } => {
                entry.with_failure(&Failure::new(*kind, message.clone()))
            }
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_extra_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.extra_inputs = inputs;
        self
    }

    pub fn with_extra_outputs(mut self, outputs: Vec<PathBuf>) -> Self {
        self.extra_outputs = outputs;
        self
    }

    pub fn with_failure(mut self, failure: &Failure) -> Self {
        self.outcome = failure.into();
        self.bytes_written = None;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_batch_id(mut self, batch_id: Option<Uuid>) -> Self {
        self.batch_id = batch_id;
        self
    }

    pub fn with_bytes_written(mut self, bytes: u64) -> Self {
        self.bytes_written = Some(bytes);
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            LogOutcome::Success => None,
            LogOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}
