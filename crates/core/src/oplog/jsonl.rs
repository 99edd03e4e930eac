//! JSON-lines log store.

use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::entry::LogEntry;
use super::store::{LogError, LogFilter, LogIter, LogStore};

/// Bytes read from the end of the file when looking for the newest entry.
const TAIL_WINDOW: u64 = 64 * 1024;

/// Append-only file with one JSON object per line.
///
/// Human readable with `cat`/`tail`, machine readable with any JSON tool.
pub struct JsonlLogStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlLogStore {
    /// Opens the log file for appending, creating it and its directory if needed.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let dropped = drop_torn_tail(path)?;
        if dropped > 0 {
            warn!(
                path = %path.display(),
                bytes = dropped,
                "Dropped incomplete last line of operation log"
            );
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn newest_in_tail(&self) -> Result<Option<Option<DateTime<Utc>>>, LogError> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Some(None)),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        let start = len.saturating_sub(TAIL_WINDOW);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let text = String::from_utf8_lossy(&buf);
        for line in text.lines().rev() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<LogEntry>(line) {
                return Ok(Some(Some(entry.timestamp)));
            }
        }

        // Nothing parseable in the window; only conclusive if it covered the file.
        Ok((start == 0).then_some(None))
    }
}

/// Cuts the file back to its last newline, so an entry interrupted by a
/// crash cannot swallow the next one. Returns how many bytes were removed.
fn drop_torn_tail(path: &Path) -> Result<u64, LogError> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata()?.len();
    let mut end = len;
    let mut buf = Vec::new();
    while end > 0 {
        let start = end.saturating_sub(TAIL_WINDOW);
        buf.resize((end - start) as usize, 0);
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf)?;

        if end == len && buf.last() == Some(&b'\n') {
            return Ok(0);
        }
        if let Some(pos) = buf.iter().rposition(|b| *b == b'\n') {
            end = start + pos as u64 + 1;
            break;
        }
        end = start;
    }

    if end < len {
        file.set_len(end)?;
        file.sync_data()?;
    }
    Ok(len - end)
}

impl LogStore for JsonlLogStore {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut line =
            serde_json::to_string(entry).map_err(|e| LogError::Serialization(e.to_string()))?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| LogError::Io(std::io::Error::other("log file lock poisoned")))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    fn list(&self, filter: &LogFilter) -> Result<LogIter, LogError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Box::new(std::iter::empty())),
            Err(e) => return Err(e.into()),
        };

        Ok(Box::new(JsonlIter {
            reader: BufReader::new(file),
            filter: filter.clone(),
            line_no: 0,
            done: false,
        }))
    }

    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>, LogError> {
        if let Some(found) = self.newest_in_tail()? {
            return Ok(found);
        }

        let mut newest = None;
        for entry in self.list(&LogFilter::new())? {
            newest = Some(entry?.timestamp);
        }
        Ok(newest)
    }
}

struct JsonlIter {
    reader: BufReader<File>,
    filter: LogFilter,
    line_no: usize,
    done: bool,
}

impl Iterator for JsonlIter {
    type Item = Result<LogEntry, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        while !self.done {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.done = true,
                // A line without its newline is still being written.
                Ok(_) if !line.ends_with('\n') => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<LogEntry>(trimmed) {
                        Ok(entry) if self.filter.matches(&entry) => return Some(Ok(entry)),
                        Ok(_) => continue,
                        Err(e) => {
                            return Some(Err(LogError::Serialization(format!(
                                "line {}: {}",
                                self.line_no, e
                            ))))
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::Operation;
    use crate::outcome::{Failure, FailureKind};
    use tempfile::TempDir;

    fn collect(store: &JsonlLogStore, filter: &LogFilter) -> Vec<LogEntry> {
        store
            .list(filter)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_append_and_list_in_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonlLogStore::open(&dir.path().join("logs/ops.jsonl")).unwrap();

        for i in 0..3 {
            store
                .append(&LogEntry::new(Operation::Convert, format!("/in/{}.txt", i)))
                .unwrap();
        }

        let entries = collect(&store, &LogFilter::new());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].input, PathBuf::from("/in/0.txt"));
        assert_eq!(entries[2].input, PathBuf::from("/in/2.txt"));
    }

    #[test]
    fn test_one_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.jsonl");
        let store = JsonlLogStore::open(&path).unwrap();
        store.append(&LogEntry::new(Operation::Merge, "/a.pdf")).unwrap();
        store.append(&LogEntry::new(Operation::Split, "/b.pdf")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("operation").is_some());
        }
    }

    #[test]
    fn test_list_is_restartable_and_filtered() {
        let dir = TempDir::new().unwrap();
        let store = JsonlLogStore::open(&dir.path().join("ops.jsonl")).unwrap();
        store.append(&LogEntry::new(Operation::Convert, "/ok.txt")).unwrap();
        store
            .append(
                &LogEntry::new(Operation::Convert, "/bad.txt")
                    .with_failure(&Failure::new(FailureKind::BackendError, "exit 1")),
            )
            .unwrap();

        let filter = LogFilter::new().failures_only();
        let first = collect(&store, &filter);
        let second = collect(&store, &filter);
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_trailing_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.jsonl");
        let store = JsonlLogStore::open(&path).unwrap();
        store.append(&LogEntry::new(Operation::Convert, "/a.txt")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":\"incompl").unwrap();

        assert_eq!(collect(&store, &LogFilter::new()).len(), 1);
    }

    #[test]
    fn test_append_after_torn_tail_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.jsonl");
        {
            let store = JsonlLogStore::open(&path).unwrap();
            store.append(&LogEntry::new(Operation::Convert, "/a.txt")).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":\"incompl").unwrap();
        drop(file);

        let store = JsonlLogStore::open(&path).unwrap();
        store.append(&LogEntry::new(Operation::Convert, "/b.txt")).unwrap();

        let inputs: Vec<PathBuf> = collect(&store, &LogFilter::new())
            .into_iter()
            .map(|e| e.input)
            .collect();
        assert_eq!(inputs, vec![PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_torn_only_line_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.jsonl");
        std::fs::write(&path, "{\"id\":").unwrap();

        let store = JsonlLogStore::open(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        store.append(&LogEntry::new(Operation::Split, "/c.pdf")).unwrap();
        assert_eq!(collect(&store, &LogFilter::new()).len(), 1);
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.jsonl");
        std::fs::write(&path, "not json\n").unwrap();
        let store = JsonlLogStore::open(&path).unwrap();

        let results: Vec<_> = store.list(&LogFilter::new()).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(LogError::Serialization(_))));
    }

    #[test]
    fn test_last_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = JsonlLogStore::open(&dir.path().join("ops.jsonl")).unwrap();
        assert_eq!(store.last_timestamp().unwrap(), None);

        let entry = LogEntry::new(Operation::Convert, "/a.txt");
        store.append(&entry).unwrap();
        assert_eq!(store.last_timestamp().unwrap(), Some(entry.timestamp));
    }
}
