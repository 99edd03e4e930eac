//! In-memory operation log store for testing.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::oplog::{LogEntry, LogError, LogFilter, LogIter, LogStore};

/// Log store that keeps entries in a vector.
///
/// Listing snapshots the current entries, so iterators are not affected by
/// later appends.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Mutex<Vec<LogEntry>>,
    should_fail: bool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose appends always fail.
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every stored entry, in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        if self.should_fail {
            return Err(LogError::Database("Mock failure".to_string()));
        }
        self.guard().push(entry.clone());
        Ok(())
    }

    fn list(&self, filter: &LogFilter) -> Result<LogIter, LogError> {
        let matching: Vec<LogEntry> = self
            .guard()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>, LogError> {
        Ok(self.guard().last().map(|e| e.timestamp))
    }
}
