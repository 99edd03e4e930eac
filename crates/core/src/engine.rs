//! The engine: every operation the command surface exposes, wired from a
//! [`Config`].
//!
//! Building an engine returns the [`LogWriter`] alongside it. The caller
//! spawns the writer, and once the engine (and every clone) is dropped the
//! writer drains pending appends and exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{detect_tools, BackendSet, FfmpegBackend, ToolStatus};
use crate::batch::{BatchError, BatchOptions, BatchOrchestrator, BatchResult, CancelFlag};
use crate::config::{validate_config, Config, ConfigError};
use crate::executor::{ConversionExecutor, ExecutorConfig};
use crate::inspect::{cleanup_staging, CleanupReport, FileInfo, Inspector};
use crate::oplog::{
    create_log_system, open_store, LogEntry, LogError, LogFilter, LogHandle, LogIter, LogStore,
    LogWriter, Operation,
};
use crate::outcome::{ConversionOutcome, Failure};
use crate::pdf::{MergeResult, PdfOperations, PdfTool, QpdfTool, SplitResult};
use crate::router::{ConversionRequest, ConversionRouter};
use crate::summarize::{
    create_llm_client, LlmClient, SummarizeError, Summarizer, SummarizerSettings, SummaryLength,
    SummaryResult, TextSource, ToolTextSource, DEFAULT_TEMPLATE,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot open operation log: {0}")]
    Log(#[from] LogError),

    #[error("Cannot read prompt template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The replaceable collaborators of an [`Engine`].
pub struct EngineParts {
    pub backends: BackendSet,
    pub pdf_tool: Arc<dyn PdfTool>,
    pub text_source: Arc<dyn TextSource>,
    /// `None` builds the configured client on first use, so a missing API
    /// key only fails `summarize`.
    pub llm: Option<Arc<dyn LlmClient>>,
    /// Media details for `info`.
    pub ffmpeg: Option<Arc<FfmpegBackend>>,
}

impl EngineParts {
    /// The external-tool implementations.
    pub fn from_config(config: &Config) -> Self {
        Self {
            backends: BackendSet::from_config(&config.backends),
            pdf_tool: Arc::new(QpdfTool::new(&config.backends)),
            text_source: Arc::new(ToolTextSource::new(&config.backends)),
            llm: None,
            ffmpeg: Some(Arc::new(FfmpegBackend::new(config.backends.clone()))),
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    config: Arc<Config>,
    router: ConversionRouter,
    log: LogHandle,
    executor: ConversionExecutor,
    batch: BatchOrchestrator,
    pdf: PdfOperations,
    inspector: Inspector,
    text_source: Arc<dyn TextSource>,
    llm: Option<Arc<dyn LlmClient>>,
    summarizer_settings: SummarizerSettings,
}

impl Engine {
    /// Validates `config`, opens the configured log store and builds the
    /// external-tool backends.
    pub fn open(config: Config) -> Result<(Self, LogWriter), EngineError> {
        validate_config(&config)?;
        let log_path = config.log.resolved_path();
        let store = open_store(config.log.store, &log_path)?;
        debug!(store = ?config.log.store, path = %log_path.display(), "Operation log opened");
        let parts = EngineParts::from_config(&config);
        Self::with_parts(config, store, parts)
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn LogStore>,
        parts: EngineParts,
    ) -> Result<(Self, LogWriter), EngineError> {
        let template = match &config.summarizer.prompt_template {
            Some(path) => std::fs::read_to_string(path).map_err(|source| EngineError::Template {
                path: path.clone(),
                source,
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let (log, writer) = create_log_system(store, config.log.channel_capacity);
        let timeout = Duration::from_secs(config.backends.timeout_secs);
        let staging_root = config.staging.root.clone();
        let router = ConversionRouter::default();

        let executor = ConversionExecutor::new(
            parts.backends,
            log.clone(),
            ExecutorConfig::new(&staging_root).with_timeout(timeout),
        );
        let batch = BatchOrchestrator::new(executor.clone(), router);
        let pdf = PdfOperations::new(parts.pdf_tool.clone(), log.clone(), &staging_root, timeout);

        let mut inspector = Inspector::new().with_pdf_tool(parts.pdf_tool);
        if let Some(ffmpeg) = parts.ffmpeg {
            inspector = inspector.with_ffmpeg(ffmpeg);
        }

        let summarizer_settings = SummarizerSettings {
            max_input_bytes: config.summarizer.max_input_bytes,
            max_input_chars: config.summarizer.max_input_chars,
            template,
            staging_root,
            timeout,
        };

        let engine = Self {
            config: Arc::new(config),
            router,
            log,
            executor,
            batch,
            pdf,
            inspector,
            text_source: parts.text_source,
            llm: parts.llm,
            summarizer_settings,
        };
        Ok((engine, writer))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &ConversionRouter {
        &self.router
    }

    /// Set by an interrupt handler to stop launching batch items.
    pub fn cancel_flag(&self) -> &CancelFlag {
        self.batch.cancel_flag()
    }

    /// A request with the configured defaults applied.
    pub fn request(&self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> ConversionRequest {
        ConversionRequest::new(source, target)
            .with_preserve_original(self.config.defaults.preserve_originals)
    }

    /// Batch options from the `[batch]` section.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            mode: self.config.batch.mode,
            workers: self.config.batch.workers,
            overwrite: self.config.batch.overwrite,
            ..BatchOptions::default()
        }
    }

    /// Routes and runs one conversion. Always appends exactly one log entry.
    pub async fn convert(&self, request: ConversionRequest) -> ConversionOutcome {
        self.executor
            .submit(&self.router, &request, Operation::Convert, None)
            .await
    }

    pub async fn batch_convert(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        source_ext: &str,
        target_ext: &str,
        options: &BatchOptions,
    ) -> Result<BatchResult, BatchError> {
        self.batch
            .run_batch(source_dir, target_dir, source_ext, target_ext, options)
            .await
    }

    pub async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        overwrite: bool,
    ) -> Result<MergeResult, Failure> {
        self.pdf.merge(inputs, output, overwrite).await
    }

    pub async fn split(
        &self,
        input: &Path,
        ranges: &str,
        output_dir: Option<&Path>,
        overwrite: bool,
    ) -> Result<SplitResult, Failure> {
        self.pdf.split(input, ranges, output_dir, overwrite).await
    }

    pub async fn summarize(
        &self,
        input: &Path,
        length: SummaryLength,
    ) -> Result<SummaryResult, Failure> {
        let llm = match &self.llm {
            Some(llm) => llm.clone(),
            None => match create_llm_client(&self.config.summarizer) {
                Ok(llm) => llm,
                Err(e) => {
                    let failure = Failure::from(SummarizeError::Llm(e));
                    warn!(input = %input.display(), error = %failure, "Summarizer unavailable");
                    let entry = LogEntry::new(Operation::Summarize, input)
                        .with_output(Summarizer::summary_path(input))
                        .with_failure(&failure);
                    self.log.record(entry).await;
                    return Err(failure);
                }
            },
        };

        Summarizer::new(
            llm,
            self.text_source.clone(),
            self.log.clone(),
            self.summarizer_settings.clone(),
        )
        .summarize(input, length)
        .await
    }

    pub async fn inspect(&self, path: &Path) -> std::io::Result<FileInfo> {
        self.inspector.inspect(path).await
    }

    /// Entries matching `filter`, oldest first.
    pub fn logs(&self, filter: &LogFilter) -> Result<LogIter, LogError> {
        self.log.list(filter)
    }

    /// Removes staging directories older than `older_than`, or the
    /// configured `stale_after_hours`.
    pub async fn cleanup(&self, older_than: Option<Duration>) -> std::io::Result<CleanupReport> {
        let older_than = older_than.unwrap_or_else(|| {
            Duration::from_secs(self.config.staging.stale_after_hours.saturating_mul(3600))
        });
        let started = Instant::now();
        let report = cleanup_staging(&self.config.staging.root, older_than).await?;
        info!(
            removed = report.removed.len(),
            bytes = report.bytes_reclaimed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Staging cleanup finished"
        );
        Ok(report)
    }

    /// Availability of every configured external tool.
    pub async fn tools(&self) -> Vec<ToolStatus> {
        detect_tools(&self.config.backends).await
    }
}
