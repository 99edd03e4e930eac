//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external seams (backends,
//! the PDF page tool, the LLM client, text extraction and log storage), so the
//! engine can be exercised end to end without any external tool installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use swissknife_core::testing::{MockBackend, MockBehavior};
//!
//! let backend = Arc::new(MockBackend::new());
//! backend.set_behavior("corrupt.txt", MockBehavior::Fail("bad input".into())).await;
//! let backends = BackendSet::uniform(backend.clone());
//! ```

mod memory_log;
mod mock_backend;
mod mock_llm;
mod mock_pdf;

pub use memory_log::MemoryLogStore;
pub use mock_backend::{MockBackend, MockBehavior, RecordedTransform};
pub use mock_llm::{MockLlm, MockTextSource};
pub use mock_pdf::{read_fake_pdf, write_fake_pdf, MockPdfTool};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Writes each `(name, contents)` pair under `dir`, returning the paths.
    pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        files
            .iter()
            .map(|(name, contents)| {
                let path = dir.join(name);
                std::fs::write(&path, contents)?;
                Ok(path)
            })
            .collect()
    }

    /// A fake PDF (see [`MockPdfTool`](super::MockPdfTool)) with pages `1..=pages`.
    pub fn numbered_pdf(path: &Path, pages: u32) -> std::io::Result<()> {
        let labels: Vec<String> = (1..=pages).map(|p| p.to_string()).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        super::write_fake_pdf(path, &labels)
    }
}
