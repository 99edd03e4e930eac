//! File inspection for the `info` command.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

use crate::backend::{FfmpegBackend, MediaInfo};
use crate::format::{extension_of, Category, FormatRegistry};
use crate::pdf::PdfTool;

const HASH_BUFFER: usize = 64 * 1024;

/// Everything `info` reports about a file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Canonical format, when the extension is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub may_be_encrypted: bool,
    /// Formats this file can be converted to.
    pub targets: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaInfo>,
}

/// Gathers [`FileInfo`]. Page counts and media details are best effort:
/// a missing or failing tool leaves the field empty.
#[derive(Clone, Default)]
pub struct Inspector {
    pdf: Option<Arc<dyn PdfTool>>,
    ffmpeg: Option<Arc<FfmpegBackend>>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdf_tool(mut self, tool: Arc<dyn PdfTool>) -> Self {
        self.pdf = Some(tool);
        self
    }

    pub fn with_ffmpeg(mut self, ffmpeg: Arc<FfmpegBackend>) -> Self {
        self.ffmpeg = Some(ffmpeg);
        self
    }

    pub async fn inspect(&self, path: &Path) -> std::io::Result<FileInfo> {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let registry = FormatRegistry::global();
        let extension = extension_of(path);
        let descriptor = extension
            .as_deref()
            .and_then(|ext| registry.descriptor(ext).ok());

        let mut info = FileInfo {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            sha256: sha256_file(path).await?,
            extension: extension.clone(),
            format: descriptor.map(|d| d.extension),
            category: descriptor.map(|d| d.category),
            may_be_encrypted: descriptor.is_some_and(|d| d.may_be_encrypted),
            targets: extension
                .as_deref()
                .and_then(|ext| registry.targets_for(ext).ok())
                .unwrap_or_default(),
            page_count: None,
            media: None,
        };

        match (info.format, info.category) {
            (Some("pdf"), _) => {
                if let Some(tool) = &self.pdf {
                    match tool.page_count(path).await {
                        Ok(pages) => info.page_count = Some(pages),
                        Err(e) => debug!(error = %e, "Page count unavailable"),
                    }
                }
            }
            (_, Some(Category::Audio | Category::Video)) => {
                if let Some(ffmpeg) = &self.ffmpeg {
                    match ffmpeg.probe(path).await {
                        Ok(media) => info.media = Some(media),
                        Err(e) => debug!(error = %e, "Media probe unavailable"),
                    }
                }
            }
            _ => {}
        }

        Ok(info)
    }
}

/// Hex SHA-256 of a file, read in chunks.
pub async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER];

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures::numbered_pdf, MockPdfTool};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sha256_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_inspect_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Report.DOCX");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let info = Inspector::new().inspect(&path).await.unwrap();

        assert_eq!(info.size_bytes, 4);
        assert_eq!(info.format, Some("docx"));
        assert_eq!(info.category, Some(Category::Document));
        assert!(info.may_be_encrypted);
        assert!(info.targets.contains(&"pdf"));
        assert!(!info.targets.contains(&"docx"));
        assert!(info.modified.is_some());
    }

    #[tokio::test]
    async fn test_inspect_pdf_page_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.pdf");
        numbered_pdf(&path, 7).unwrap();

        let info = Inspector::new()
            .with_pdf_tool(Arc::new(MockPdfTool::new()))
            .inspect(&path)
            .await
            .unwrap();

        assert_eq!(info.page_count, Some(7));
    }

    #[tokio::test]
    async fn test_inspect_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.xyz");
        std::fs::write(&path, b"??").unwrap();

        let info = Inspector::new().inspect(&path).await.unwrap();

        assert_eq!(info.extension.as_deref(), Some("xyz"));
        assert!(info.category.is_none());
        assert!(info.targets.is_empty());
    }

    #[tokio::test]
    async fn test_inspect_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Inspector::new().inspect(dir.path()).await.is_err());
    }
}
