//! Shared harness for the engine integration tests: an [`Engine`] over mock
//! backends and a real JSONL operation log in a temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::task::JoinHandle;

use swissknife_core::backend::BackendSet;
use swissknife_core::oplog::{open_store, LogStore};
use swissknife_core::testing::{MockBackend, MockLlm, MockPdfTool, MockTextSource};
use swissknife_core::{Config, Engine, EngineParts, LogEntry, LogFilter, LogStoreKind};

pub struct TestHarness {
    pub engine: Engine,
    pub backend: Arc<MockBackend>,
    pub pdf: Arc<MockPdfTool>,
    pub text: Arc<MockTextSource>,
    pub llm: Arc<MockLlm>,
    pub log_path: PathBuf,
    pub temp_dir: TempDir,
    writer: JoinHandle<()>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log_path = temp_dir.path().join("log").join("operations.jsonl");
        config.staging.root = temp_dir.path().join("staging");
        config.log.store = LogStoreKind::Jsonl;
        config.log.path = Some(log_path.clone());

        let store = open_store(LogStoreKind::Jsonl, &log_path).expect("Failed to open log");
        let backend = Arc::new(MockBackend::new());
        let pdf = Arc::new(MockPdfTool::new());
        let text = Arc::new(MockTextSource::new());
        let llm = Arc::new(MockLlm::with_response(
            "The document describes a quarterly plan in some detail.",
        ));

        let parts = EngineParts {
            backends: BackendSet::uniform(backend.clone()),
            pdf_tool: pdf.clone(),
            text_source: text.clone(),
            llm: Some(llm.clone()),
            ffmpeg: None,
        };
        let (engine, writer) =
            Engine::with_parts(config, store, parts).expect("Failed to build engine");
        let writer = tokio::spawn(writer.run());

        Self {
            engine,
            backend,
            pdf,
            text,
            llm,
            log_path,
            temp_dir,
            writer,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create dir");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Whether every staging directory has been released.
    pub fn staging_is_empty(&self) -> bool {
        match std::fs::read_dir(self.path("staging")) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    /// Log entries as currently stored.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.engine
            .logs(&LogFilter::new())
            .expect("Failed to list log")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to read log entry")
    }

    /// Drops the engine, waits for the writer to drain and reopens the log
    /// file from disk.
    pub async fn shutdown(self) -> Vec<LogEntry> {
        let Self {
            engine,
            writer,
            log_path,
            temp_dir,
            ..
        } = self;
        drop(engine);
        writer.await.expect("Log writer panicked");

        let store = open_store(LogStoreKind::Jsonl, &log_path).expect("Failed to reopen log");
        let entries = store
            .list(&LogFilter::new())
            .expect("Failed to list log")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to read log entry");
        drop(temp_dir);
        entries
    }
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| name(p)).collect()
}

pub fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
