//! The operation log: an append-only record of every attempted operation.
//!
//! One [`LogWriter`] task owns the store and serializes appends; any number
//! of cloned [`LogHandle`]s send entries to it and wait for the durability
//! acknowledgement. Listing reads the store directly and is lazy.
//!
//! This is separate from `tracing` diagnostics: the log is the durable,
//! queryable history shown by `swissknife logs`.

mod entry;
mod handle;
mod jsonl;
mod sqlite;
mod store;
mod writer;

pub use entry::{LogEntry, LogOutcome, Operation};
pub use handle::{AppendRequest, LogHandle};
pub use jsonl::JsonlLogStore;
pub use sqlite::SqliteLogStore;
pub use store::{LogError, LogFilter, LogIter, LogStore, LogStoreKind};
pub use writer::{create_log_system, LogWriter};

use std::path::Path;
use std::sync::Arc;

/// Opens the configured store at `path`.
pub fn open_store(kind: LogStoreKind, path: &Path) -> Result<Arc<dyn LogStore>, LogError> {
    let store: Arc<dyn LogStore> = match kind {
        LogStoreKind::Jsonl => Arc::new(JsonlLogStore::open(path)?),
        LogStoreKind::Sqlite => Arc::new(SqliteLogStore::new(path)?),
    };
    Ok(store)
}
