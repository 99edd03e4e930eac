//! Merge and split with staging, verification and logging.

use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::executor::{move_into_place, StagingArea};
use crate::format::extension_of;
use crate::oplog::{LogEntry, LogHandle, Operation};
use crate::outcome::Failure;

use super::error::PdfError;
use super::ranges::parse_page_ranges;
use super::tool::PdfTool;

/// A finished merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub output_path: PathBuf,
    pub page_count: u32,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// A finished split. Parts are listed in the order the ranges were given.
#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    pub parts: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// Runs PDF merges and splits.
///
/// Like the conversion executor, every call appends exactly one log entry
/// and nothing is written to its final location until all outputs check out.
#[derive(Clone)]
pub struct PdfOperations {
    tool: Arc<dyn PdfTool>,
    log: LogHandle,
    staging_root: PathBuf,
    timeout: Duration,
}

impl PdfOperations {
    pub fn new(
        tool: Arc<dyn PdfTool>,
        log: LogHandle,
        staging_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            tool,
            log,
            staging_root: staging_root.into(),
            timeout,
        }
    }

    pub async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        overwrite: bool,
    ) -> Result<MergeResult, Failure> {
        let started = Instant::now();
        let result = self.run_merge(inputs, output, overwrite, started).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let first = inputs.first().cloned().unwrap_or_default();
        let mut entry = LogEntry::new(Operation::Merge, first)
            .with_extra_inputs(inputs.iter().skip(1).cloned().collect())
            .with_output(output)
            .with_duration_ms(duration_ms);

        let result = result.map_err(Failure::from);
        match &result {
            Ok(merged) => {
                info!(
                    output = %merged.output_path.display(),
                    inputs = inputs.len(),
                    pages = merged.page_count,
                    "Merged PDFs"
                );
                entry = entry.with_bytes_written(merged.bytes_written);
            }
            Err(failure) => {
                warn!(output = %output.display(), error = %failure, "PDF merge failed");
                entry = entry.with_failure(failure);
            }
        }
        self.log.record(entry).await;
        result
    }

    /// Splits `input` into one file per range in `ranges`, written to
    /// `output_dir` (default: next to the input).
    pub async fn split(
        &self,
        input: &Path,
        ranges: &str,
        output_dir: Option<&Path>,
        overwrite: bool,
    ) -> Result<SplitResult, Failure> {
        let started = Instant::now();
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        let result = self
            .run_split(input, ranges, &output_dir, overwrite, started)
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut entry = LogEntry::new(Operation::Split, input)
            .with_output(&output_dir)
            .with_duration_ms(duration_ms);

        let result = result.map_err(Failure::from);
        match &result {
            Ok(split) => {
                info!(
                    input = %input.display(),
                    parts = split.parts.len(),
                    "Split PDF"
                );
                entry = entry.with_extra_outputs(split.parts.clone());
            }
            Err(failure) => {
                warn!(input = %input.display(), error = %failure, "PDF split failed");
                entry = entry.with_failure(failure);
            }
        }
        self.log.record(entry).await;
        result
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, PdfError>>,
    ) -> Result<T, PdfError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| PdfError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })?
    }

    async fn run_merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        overwrite: bool,
        started: Instant,
    ) -> Result<MergeResult, PdfError> {
        if inputs.len() < 2 {
            return Err(PdfError::NotEnoughInputs {
                count: inputs.len(),
            });
        }
        for input in inputs {
            check_pdf_input(input).await?;
        }
        check_pdf_name(output)?;
        check_target(output, overwrite).await?;

        let mut expected = 0;
        for input in inputs {
            expected += self.bounded(self.tool.page_count(input)).await?;
        }

        let staging = StagingArea::acquire(&self.staging_root)?;
        let staged = staging.output_path("pdf");
        self.bounded(self.tool.merge(inputs, &staged)).await?;
        self.verify(&staged, expected).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes_written = move_into_place(&staged, output).await?;
        staging.release();

        Ok(MergeResult {
            output_path: output.to_path_buf(),
            page_count: expected,
            bytes_written,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn run_split(
        &self,
        input: &Path,
        ranges: &str,
        output_dir: &Path,
        overwrite: bool,
        started: Instant,
    ) -> Result<SplitResult, PdfError> {
        check_pdf_input(input).await?;
        let page_count = self.bounded(self.tool.page_count(input)).await?;
        let ranges = parse_page_ranges(ranges, page_count)?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let names: Vec<String> = ranges
            .iter()
            .map(|r| format!("{}_{}.pdf", stem, r.suffix()))
            .collect();
        for name in &names {
            check_target(&output_dir.join(name), overwrite).await?;
        }

        let staging = StagingArea::acquire(&self.staging_root)?;
        for (range, name) in ranges.iter().zip(&names) {
            let staged = staging.path().join(name);
            self.bounded(self.tool.extract(input, *range, &staged))
                .await?;
            self.verify(&staged, range.page_count()).await?;
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let mut parts = Vec::with_capacity(names.len());
        for name in &names {
            let target = output_dir.join(name);
            move_into_place(&staging.path().join(name), &target).await?;
            parts.push(target);
        }
        staging.release();

        Ok(SplitResult {
            parts,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Checks a staged file is non-empty and has the expected page count.
    async fn verify(&self, staged: &Path, expected: u32) -> Result<(), PdfError> {
        let len = tokio::fs::metadata(staged)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if len == 0 {
            return Err(PdfError::EmptyOutput {
                path: staged.to_path_buf(),
            });
        }
        let actual = self.bounded(self.tool.page_count(staged)).await?;
        if actual != expected {
            return Err(PdfError::PageCountMismatch {
                path: staged.to_path_buf(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

fn check_pdf_name(path: &Path) -> Result<(), PdfError> {
    if extension_of(path).as_deref() != Some("pdf") {
        return Err(PdfError::NotPdf {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

async fn check_pdf_input(path: &Path) -> Result<(), PdfError> {
    check_pdf_name(path)?;
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(PdfError::NotFound {
            path: path.to_path_buf(),
        }),
    }
}

async fn check_target(path: &Path, overwrite: bool) -> Result<(), PdfError> {
    if !overwrite && tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(PdfError::TargetExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
