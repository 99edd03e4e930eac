//! Storage trait and filters for the operation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::entry::{LogEntry, Operation};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer task is gone; nothing more can be appended.
    #[error("Operation log is closed")]
    Closed,
}

/// Lazy sequence of entries in timestamp order.
pub type LogIter = Box<dyn Iterator<Item = Result<LogEntry, LogError>> + Send>;

/// Which storage backs the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStoreKind {
    /// One JSON object per line.
    #[default]
    Jsonl,
    Sqlite,
}

/// Filter for listing log entries. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub operation: Option<Operation>,
    pub failures_only: bool,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub batch_id: Option<Uuid>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn failures_only(mut self) -> Self {
        self.failures_only = true;
        self
    }

    pub fn with_time_range(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn with_batch_id(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(op) = self.operation {
            if entry.operation != op {
                return false;
            }
        }
        if self.failures_only && entry.is_success() {
            return false;
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        if let Some(batch_id) = self.batch_id {
            if entry.batch_id != Some(batch_id) {
                return false;
            }
        }
        true
    }
}

/// Append-only storage for log entries.
///
/// Implementations must make an entry durable before `append` returns.
/// The log writer is the only caller of `append`, so implementations only
/// need to be safe for concurrent readers.
pub trait LogStore: Send + Sync {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError>;

    /// Entries matching `filter`, oldest first. Each call starts a fresh pass.
    fn list(&self, filter: &LogFilter) -> Result<LogIter, LogError>;

    /// Timestamp of the newest stored entry.
    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>, LogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Failure, FailureKind};
    use chrono::Duration;

    #[test]
    fn test_filter_operation_and_failures() {
        let ok = LogEntry::new(Operation::Convert, "/a.txt");
        let failed = LogEntry::new(Operation::Convert, "/b.txt")
            .with_failure(&Failure::new(FailureKind::BackendError, "boom"));
        let split = LogEntry::new(Operation::Split, "/c.pdf");

        let filter = LogFilter::new().with_operation(Operation::Convert);
        assert!(filter.matches(&ok));
        assert!(filter.matches(&failed));
        assert!(!filter.matches(&split));

        let filter = LogFilter::new().failures_only();
        assert!(!filter.matches(&ok));
        assert!(filter.matches(&failed));
    }

    #[test]
    fn test_filter_time_range_and_batch() {
        let batch = Uuid::new_v4();
        let entry = LogEntry::new(Operation::BatchItem, "/a.png").with_batch_id(Some(batch));
        let ts = entry.timestamp;

        assert!(LogFilter::new()
            .with_time_range(Some(ts - Duration::seconds(1)), Some(ts + Duration::seconds(1)))
            .matches(&entry));
        assert!(!LogFilter::new()
            .with_time_range(Some(ts + Duration::seconds(1)), None)
            .matches(&entry));
        assert!(LogFilter::new().with_batch_id(batch).matches(&entry));
        assert!(!LogFilter::new().with_batch_id(Uuid::new_v4()).matches(&entry));
    }
}
