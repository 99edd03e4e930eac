use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::entry::LogEntry;
use super::store::{LogError, LogFilter, LogIter, LogStore};

/// An append request with its durability acknowledgement.
pub struct AppendRequest {
    pub entry: LogEntry,
    pub ack: oneshot::Sender<Result<LogEntry, LogError>>,
}

/// Handle for appending to and reading the operation log
///
/// This is cheaply cloneable and can be shared across tasks. Appends go
/// through a channel to the single [`LogWriter`](super::LogWriter); reads
/// go straight to the store.
#[derive(Clone)]
pub struct LogHandle {
    tx: mpsc::Sender<AppendRequest>,
    store: Arc<dyn LogStore>,
}

impl LogHandle {
    pub fn new(tx: mpsc::Sender<AppendRequest>, store: Arc<dyn LogStore>) -> Self {
        Self { tx, store }
    }

    /// Appends an entry and waits until it is durable.
    ///
    /// Returns the entry as stored (the writer may adjust its timestamp).
    pub async fn append(&self, entry: LogEntry) -> Result<LogEntry, LogError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(AppendRequest { entry, ack })
            .await
            .map_err(|_| LogError::Closed)?;
        done.await.map_err(|_| LogError::Closed)?
    }

    /// Appends an entry, logging instead of returning a storage failure.
    ///
    /// Used at the end of operations whose own outcome must not be replaced
    /// by a log failure.
    pub async fn record(&self, entry: LogEntry) {
        let id = entry.id;
        if let Err(e) = self.append(entry).await {
            tracing::error!(entry_id = %id, error = %e, "Failed to append to operation log");
        }
    }

    /// Lists entries oldest first.
    pub fn list(&self, filter: &LogFilter) -> Result<LogIter, LogError> {
        self.store.list(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::Operation;
    use crate::testing::MemoryLogStore;

    #[tokio::test]
    async fn test_append_sends_request() {
        let (tx, mut rx) = mpsc::channel(10);
        let handle = LogHandle::new(tx, Arc::new(MemoryLogStore::new()));

        let responder = tokio::spawn(async move {
            let req = rx.recv().await.expect("Should receive request");
            let entry = req.entry.clone();
            let _ = req.ack.send(Ok(req.entry));
            entry
        });

        let stored = handle
            .append(LogEntry::new(Operation::Convert, "/a.txt"))
            .await
            .unwrap();
        let seen = responder.await.unwrap();
        assert_eq!(stored.id, seen.id);
    }

    #[tokio::test]
    async fn test_append_closed_channel() {
        let (tx, rx) = mpsc::channel::<AppendRequest>(10);
        let handle = LogHandle::new(tx, Arc::new(MemoryLogStore::new()));
        drop(rx);

        let result = handle.append(LogEntry::new(Operation::Convert, "/a.txt")).await;
        assert!(matches!(result, Err(LogError::Closed)));

        // record() must not panic either
        handle.record(LogEntry::new(Operation::Convert, "/b.txt")).await;
    }
}
