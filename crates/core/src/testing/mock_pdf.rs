//! Mock PDF tool for testing.
//!
//! Fake PDFs are text files with one `page <label>` line per page, so
//! merges and splits can be checked by reading the lines back.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::pdf::{PageRange, PdfError, PdfTool};

/// Writes a fake PDF with one page per label.
pub fn write_fake_pdf(path: &Path, labels: &[&str]) -> std::io::Result<()> {
    let body: String = labels.iter().map(|l| format!("page {}\n", l)).collect();
    std::fs::write(path, body)
}

/// Page labels of a fake PDF, in order.
pub fn read_fake_pdf(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .filter_map(|l| l.strip_prefix("page ").map(str::to_string))
        .collect())
}

async fn read_pages(path: &Path) -> Result<Vec<String>, PdfError> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .filter(|l| l.starts_with("page "))
        .map(str::to_string)
        .collect())
}

async fn write_pages(path: &Path, pages: &[String]) -> Result<(), PdfError> {
    let mut body = pages.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// Mock implementation of the PdfTool trait.
#[derive(Debug, Default)]
pub struct MockPdfTool {
    /// Extractions performed, as (input, range).
    extractions: Arc<RwLock<Vec<(PathBuf, PageRange)>>>,
    /// Drop the last page of every merge, to exercise verification.
    lose_page_on_merge: Arc<RwLock<bool>>,
    /// If set, the next extraction fails with this error.
    next_error: Arc<RwLock<Option<PdfError>>>,
}

impl MockPdfTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_lose_page_on_merge(&self, lose: bool) {
        *self.lose_page_on_merge.write().await = lose;
    }

    pub async fn set_next_error(&self, error: PdfError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn extractions(&self) -> Vec<(PathBuf, PageRange)> {
        self.extractions.read().await.clone()
    }
}

#[async_trait]
impl PdfTool for MockPdfTool {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError> {
        Ok(read_pages(pdf).await?.len() as u32)
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), PdfError> {
        let mut pages = Vec::new();
        for input in inputs {
            pages.extend(read_pages(input).await?);
        }
        if *self.lose_page_on_merge.read().await {
            pages.pop();
        }
        write_pages(output, &pages).await
    }

    async fn extract(
        &self,
        input: &Path,
        range: PageRange,
        output: &Path,
    ) -> Result<(), PdfError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.extractions
            .write()
            .await
            .push((input.to_path_buf(), range));

        let pages = read_pages(input).await?;
        let start = range.start as usize - 1;
        let end = (range.end as usize).min(pages.len());
        write_pages(output, pages.get(start..end).unwrap_or_default()).await
    }
}
