//! SQLite log store.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::entry::LogEntry;
use super::store::{LogError, LogFilter, LogIter, LogStore};

/// Rows fetched per page while listing.
const PAGE_SIZE: i64 = 256;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS operations (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        timestamp TEXT NOT NULL,
        operation TEXT NOT NULL,
        status TEXT NOT NULL,
        batch_id TEXT,
        data TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_operations_timestamp ON operations(timestamp, seq);
    CREATE INDEX IF NOT EXISTS idx_operations_operation ON operations(operation);
"#;

/// Fixed-width UTC form, so text order is time order.
fn sortable(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn db_err(e: rusqlite::Error) -> LogError {
    LogError::Database(e.to_string())
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, LogError> {
    conn.lock()
        .map_err(|_| LogError::Database("connection lock poisoned".to_string()))
}

/// SQLite-backed log store
pub struct SqliteLogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLogStore {
    /// Opens the database file, creating it and the table if needed.
    pub fn new(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::init(conn)
    }

    /// In-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, LogError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, LogError> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn build_where_clause(filter: &LogFilter) -> (Vec<&'static str>, Vec<Box<dyn rusqlite::ToSql + Send>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql + Send>> = Vec::new();

        if let Some(op) = filter.operation {
            conditions.push("operation = ?");
            params.push(Box::new(op.as_str().to_string()));
        }

        if filter.failures_only {
            conditions.push("status = 'failure'");
        }

        if let Some(ref since) = filter.since {
            conditions.push("timestamp >= ?");
            params.push(Box::new(sortable(since)));
        }

        if let Some(ref until) = filter.until {
            conditions.push("timestamp <= ?");
            params.push(Box::new(sortable(until)));
        }

        if let Some(batch_id) = filter.batch_id {
            conditions.push("batch_id = ?");
            params.push(Box::new(batch_id.to_string()));
        }

        (conditions, params)
    }
}

impl LogStore for SqliteLogStore {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let data =
            serde_json::to_string(entry).map_err(|e| LogError::Serialization(e.to_string()))?;
        let status = if entry.is_success() { "success" } else { "failure" };

        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO operations (id, timestamp, operation, status, batch_id, data) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.id.to_string(),
                sortable(&entry.timestamp),
                entry.operation.as_str(),
                status,
                entry.batch_id.map(|b| b.to_string()),
                data,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn list(&self, filter: &LogFilter) -> Result<LogIter, LogError> {
        Ok(Box::new(SqliteIter {
            conn: Arc::clone(&self.conn),
            filter: filter.clone(),
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }

    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>, LogError> {
        let conn = lock(&self.conn)?;
        let ts: Option<String> = conn
            .query_row(
                "SELECT timestamp FROM operations ORDER BY timestamp DESC, seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        ts.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| LogError::Database(format!("Invalid timestamp: {}", e)))
        })
        .transpose()
    }
}

/// Keyset-paginated cursor over `(timestamp, seq)`.
struct SqliteIter {
    conn: Arc<Mutex<Connection>>,
    filter: LogFilter,
    cursor: Option<(String, i64)>,
    buffer: VecDeque<LogEntry>,
    exhausted: bool,
}

impl SqliteIter {
    fn fetch_page(&mut self) -> Result<(), LogError> {
        let (mut conditions, mut params) = SqliteLogStore::build_where_clause(&self.filter);

        if let Some((ref ts, seq)) = self.cursor {
            conditions.push("(timestamp > ? OR (timestamp = ? AND seq > ?))");
            params.push(Box::new(ts.clone()));
            params.push(Box::new(ts.clone()));
            params.push(Box::new(seq));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT seq, timestamp, data FROM operations {} ORDER BY timestamp ASC, seq ASC LIMIT ?",
            where_clause
        );
        params.push(Box::new(PAGE_SIZE));

        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p.as_ref() as &dyn rusqlite::ToSql).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let seq: i64 = row.get(0)?;
                let timestamp: String = row.get(1)?;
                let data: String = row.get(2)?;
                Ok((seq, timestamp, data))
            })
            .map_err(db_err)?;

        let mut fetched = 0;
        for row in rows {
            let (seq, timestamp, data) = row.map_err(db_err)?;
            fetched += 1;
            let entry: LogEntry = serde_json::from_str(&data)
                .map_err(|e| LogError::Serialization(e.to_string()))?;
            self.cursor = Some((timestamp, seq));
            if self.filter.matches(&entry) {
                self.buffer.push_back(entry);
            }
        }

        if fetched < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Iterator for SqliteIter {
    type Item = Result<LogEntry, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(Ok(entry));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::Operation;
    use crate::outcome::{Failure, FailureKind};
    use chrono::Duration;
    use uuid::Uuid;

    fn collect(store: &SqliteLogStore, filter: &LogFilter) -> Vec<LogEntry> {
        store
            .list(filter)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_append_and_list() {
        let store = SqliteLogStore::in_memory().unwrap();
        let entry = LogEntry::new(Operation::Convert, "/in/a.docx").with_output("/out/a.pdf");
        store.append(&entry).unwrap();

        let entries = collect(&store, &LogFilter::new());
        assert_eq!(entries, vec![entry]);
    }

    #[test]
    fn test_list_pages_in_timestamp_order() {
        let store = SqliteLogStore::in_memory().unwrap();
        let base = Utc::now();
        let total = PAGE_SIZE as usize * 2 + 7;

        // Insert out of order; listing must come back sorted.
        for i in (0..total).rev() {
            let mut entry = LogEntry::new(Operation::BatchItem, format!("/in/{}.png", i));
            entry.timestamp = base + Duration::milliseconds(i as i64);
            store.append(&entry).unwrap();
        }

        let entries = collect(&store, &LogFilter::new());
        assert_eq!(entries.len(), total);
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(entries[0].input, std::path::PathBuf::from("/in/0.png"));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let store = SqliteLogStore::in_memory().unwrap();
        let ts = Utc::now();
        for i in 0..3 {
            let mut entry = LogEntry::new(Operation::Convert, format!("/{}.txt", i));
            entry.timestamp = ts;
            store.append(&entry).unwrap();
        }

        let inputs: Vec<_> = collect(&store, &LogFilter::new())
            .into_iter()
            .map(|e| e.input)
            .collect();
        assert_eq!(
            inputs,
            vec![
                std::path::PathBuf::from("/0.txt"),
                std::path::PathBuf::from("/1.txt"),
                std::path::PathBuf::from("/2.txt")
            ]
        );
    }

    #[test]
    fn test_filters() {
        let store = SqliteLogStore::in_memory().unwrap();
        let batch = Uuid::new_v4();

        store.append(&LogEntry::new(Operation::Convert, "/a.txt")).unwrap();
        store
            .append(
                &LogEntry::new(Operation::BatchItem, "/b.txt")
                    .with_batch_id(Some(batch))
                    .with_failure(&Failure::new(FailureKind::Timeout, "slow")),
            )
            .unwrap();
        store.append(&LogEntry::new(Operation::Merge, "/c.pdf")).unwrap();

        assert_eq!(collect(&store, &LogFilter::new().failures_only()).len(), 1);
        assert_eq!(
            collect(&store, &LogFilter::new().with_operation(Operation::Merge)).len(),
            1
        );
        assert_eq!(collect(&store, &LogFilter::new().with_batch_id(batch)).len(), 1);
    }

    #[test]
    fn test_last_timestamp() {
        let store = SqliteLogStore::in_memory().unwrap();
        assert_eq!(store.last_timestamp().unwrap(), None);

        let entry = LogEntry::new(Operation::Split, "/x.pdf");
        store.append(&entry).unwrap();
        assert_eq!(store.last_timestamp().unwrap(), Some(entry.timestamp));
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ops.db");
        {
            let store = SqliteLogStore::new(&path).unwrap();
            store.append(&LogEntry::new(Operation::Convert, "/a.txt")).unwrap();
        }
        let store = SqliteLogStore::new(&path).unwrap();
        assert_eq!(collect(&store, &LogFilter::new()).len(), 1);
    }
}
