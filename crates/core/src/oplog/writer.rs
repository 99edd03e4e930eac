use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::entry::LogEntry;
use super::handle::{AppendRequest, LogHandle};
use super::store::{LogError, LogStore};

/// Background task that owns all appends to the store
///
/// Requests are handled one at a time, so appends never interleave. Each
/// entry's timestamp is moved forward if needed so that it is strictly after
/// the previous one; storage order is therefore timestamp order.
pub struct LogWriter {
    rx: mpsc::Receiver<AppendRequest>,
    store: Arc<dyn LogStore>,
    last: Option<DateTime<Utc>>,
}

impl LogWriter {
    pub fn new(rx: mpsc::Receiver<AppendRequest>, store: Arc<dyn LogStore>) -> Self {
        Self {
            rx,
            store,
            last: None,
        }
    }

    fn stamp(&mut self, mut entry: LogEntry) -> LogEntry {
        if let Some(last) = self.last {
            if entry.timestamp <= last {
                entry.timestamp = last + Duration::microseconds(1);
            }
        }
        self.last = Some(entry.timestamp);
        entry
    }

    /// Run the writer until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::debug!("Operation log writer started");

        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.last_timestamp()).await {
            Ok(Ok(last)) => self.last = last,
            Ok(Err(e)) => tracing::warn!(error = %e, "Could not read newest log timestamp"),
            Err(e) => tracing::warn!(error = %e, "Log timestamp lookup panicked"),
        }

        while let Some(AppendRequest { entry, ack }) = self.rx.recv().await {
            let entry = self.stamp(entry);
            let store = Arc::clone(&self.store);

            let result = tokio::task::spawn_blocking(move || store.append(&entry).map(|_| entry))
                .await
                .unwrap_or_else(|e| {
                    Err(LogError::Io(std::io::Error::other(format!(
                        "log append panicked: {}",
                        e
                    ))))
                });

            if let Err(ref e) = result {
                tracing::error!(error = %e, "Failed to write operation log entry");
            }
            // The caller may have given up waiting; the entry is stored regardless.
            let _ = ack.send(result);
        }

        tracing::debug!("Operation log writer shutting down");
    }
}

/// Create a complete operation log
///
/// Returns:
/// - `LogHandle` - for appending and listing (clone this to share across tasks)
/// - `LogWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
///
/// The writer exits after the last handle is dropped and every queued entry
/// has been written.
pub fn create_log_system(store: Arc<dyn LogStore>, buffer_size: usize) -> (LogHandle, LogWriter) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    let handle = LogHandle::new(tx, Arc::clone(&store));
    let writer = LogWriter::new(rx, store);
    (handle, writer)
}
