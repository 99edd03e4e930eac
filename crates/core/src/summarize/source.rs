//! Getting text out of a file for summarization.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::{arg, run_tool, BackendConfig, BackendError, PandocBackend, TransformOptions};
use crate::format::{Category, FormatDescriptor};

use super::error::SummarizeError;

/// Produces plain text from a document or a recording.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// `work_dir` is scratch space that the caller removes afterwards.
    async fn extract_text(
        &self,
        input: &Path,
        format: &FormatDescriptor,
        work_dir: &Path,
    ) -> Result<String, SummarizeError>;
}

/// [`TextSource`] backed by the external tools: pandoc and pdftotext for
/// documents, the `whisper` CLI for audio and video.
pub struct ToolTextSource {
    pandoc: PandocBackend,
    whisper_path: PathBuf,
    whisper_model: String,
}

impl ToolTextSource {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            pandoc: PandocBackend::new(config.clone()),
            whisper_path: config.whisper_path.clone(),
            whisper_model: config.whisper_model.clone(),
        }
    }

    async fn transcribe(&self, input: &Path, work_dir: &Path) -> Result<String, BackendError> {
        let args = [
            arg(input),
            arg("--model"),
            arg(&self.whisper_model),
            arg("--output_format"),
            arg("txt"),
            arg("--output_dir"),
            arg(work_dir),
        ];
        debug!(input = %input.display(), model = %self.whisper_model, "Transcribing");
        run_tool("whisper", &self.whisper_path, &args)
            .await?
            .require_success("whisper")?;

        let stem = input.file_stem().unwrap_or_default();
        let mut name = stem.to_os_string();
        name.push(".txt");
        Ok(tokio::fs::read_to_string(work_dir.join(name)).await?)
    }
}

#[async_trait]
impl TextSource for ToolTextSource {
    async fn extract_text(
        &self,
        input: &Path,
        format: &FormatDescriptor,
        work_dir: &Path,
    ) -> Result<String, SummarizeError> {
        match format.category {
            Category::Document => match format.extension {
                "txt" | "md" => {
                    let bytes = tokio::fs::read(input).await?;
                    Ok(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Ok(self
                    .pandoc
                    .extract_text(input, &TransformOptions::new(work_dir))
                    .await?),
            },
            Category::Audio | Category::Video => Ok(self.transcribe(input, work_dir).await?),
            Category::Image | Category::Archive => Err(SummarizeError::Unsupported {
                category: format.category.to_string(),
            }),
        }
    }
}
