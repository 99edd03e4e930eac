//! The summarize operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::executor::{move_into_place, StagingArea};
use crate::format::{extension_of, Category, FormatRegistry, RoutingError};
use crate::oplog::{LogEntry, LogHandle, Operation};
use crate::outcome::Failure;

use super::error::SummarizeError;
use super::llm::{CompletionRequest, LlmClient};
use super::prompt::{render_prompt, truncate_chars, FileDetails, DEFAULT_TEMPLATE};
use super::source::TextSource;
use super::types::{SummaryLength, SummaryResult};

/// Summaries shorter than this many non-whitespace characters are rejected.
const MIN_SUMMARY_CHARS: usize = 10;

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub max_input_bytes: u64,
    /// Extracted text beyond this many characters is cut off.
    pub max_input_chars: usize,
    pub template: String,
    pub staging_root: PathBuf,
    /// Bound on text extraction. The LLM client has its own timeout.
    pub timeout: Duration,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            max_input_bytes: 100 * 1024 * 1024,
            max_input_chars: 400_000,
            template: DEFAULT_TEMPLATE.to_string(),
            staging_root: std::env::temp_dir().join("swissknife"),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Extracts text from a file, asks the model for a summary and writes it to
/// `<stem>_summary.txt` next to the input.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    source: Arc<dyn TextSource>,
    log: LogHandle,
    settings: SummarizerSettings,
}

impl Summarizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        source: Arc<dyn TextSource>,
        log: LogHandle,
        settings: SummarizerSettings,
    ) -> Self {
        Self {
            llm,
            source,
            log,
            settings,
        }
    }

    /// Where the summary for `input` is written.
    pub fn summary_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{}_summary.txt", stem))
    }

    pub async fn summarize(
        &self,
        input: &Path,
        length: SummaryLength,
    ) -> Result<SummaryResult, Failure> {
        let started = Instant::now();
        let result = self.run(input, length, started).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut entry = LogEntry::new(Operation::Summarize, input)
            .with_output(Self::summary_path(input))
            .with_duration_ms(duration_ms)
            .with_backend(self.llm.provider());

        let result = result.map_err(Failure::from);
        match &result {
            Ok(summary) => {
                info!(
                    input = %input.display(),
                    length = %length,
                    chars = summary.summary.len(),
                    "Summary written"
                );
                entry = entry.with_bytes_written(summary.summary.len() as u64);
            }
            Err(failure) => {
                warn!(input = %input.display(), error = %failure, "Summarization failed");
                entry = entry.with_failure(failure);
            }
        }
        self.log.record(entry).await;
        result
    }

    async fn run(
        &self,
        input: &Path,
        length: SummaryLength,
        started: Instant,
    ) -> Result<SummaryResult, SummarizeError> {
        let size = match tokio::fs::metadata(input).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(SummarizeError::NotFound {
                    path: input.to_path_buf(),
                })
            }
        };
        if size > self.settings.max_input_bytes {
            return Err(SummarizeError::TooLarge {
                path: input.to_path_buf(),
                size,
                limit: self.settings.max_input_bytes,
            });
        }

        let ext = extension_of(input).ok_or_else(|| RoutingError::MissingExtension {
            path: input.to_path_buf(),
        })?;
        let format = FormatRegistry::global().descriptor(&ext)?;
        if matches!(format.category, Category::Image | Category::Archive) {
            return Err(SummarizeError::Unsupported {
                category: format.category.to_string(),
            });
        }

        let staging = StagingArea::acquire(&self.settings.staging_root)?;
        let text = tokio::time::timeout(
            self.settings.timeout,
            self.source.extract_text(input, format, &staging.work_dir()),
        )
        .await
        .map_err(|_| SummarizeError::Timeout {
            stage: "text extraction",
            timeout_secs: self.settings.timeout.as_secs(),
        })??;

        if text.chars().all(char::is_whitespace) {
            return Err(SummarizeError::NoText {
                path: input.to_path_buf(),
            });
        }
        let (text, truncated) = truncate_chars(&text, self.settings.max_input_chars);
        if truncated {
            debug!(limit = self.settings.max_input_chars, "Input text truncated");
        }

        let preset = length.preset();
        let details = FileDetails {
            name: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: format.extension.to_string(),
            category: format.category.to_string(),
            size_bytes: size,
            text_chars: text.chars().count(),
            truncated,
        };
        let prompt = render_prompt(&self.settings.template, preset.description, &details, text);
        let request = CompletionRequest::new(prompt)
            .with_max_tokens(preset.max_tokens)
            .with_temperature(preset.temperature);

        debug!(
            provider = self.llm.provider(),
            model = self.llm.model(),
            chars = details.text_chars,
            "Requesting summary"
        );
        let response = self.llm.complete(request).await?;

        let summary = response.text.trim().to_string();
        let meaningful = summary.chars().filter(|c| !c.is_whitespace()).count();
        if meaningful < MIN_SUMMARY_CHARS {
            return Err(SummarizeError::EmptySummary { chars: meaningful });
        }

        let summary_path = Self::summary_path(input);
        let staged = staging.path().join("summary.txt");
        tokio::fs::write(&staged, format!("{}\n", summary)).await?;
        move_into_place(&staged, &summary_path).await?;
        staging.release();

        Ok(SummaryResult {
            summary_path,
            summary,
            length,
            input_chars: details.text_chars,
            model: response.model,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
