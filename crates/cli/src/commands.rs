//! One function per subcommand. Each returns the process exit code.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use swissknife_core::oplog::LogError;
use swissknife_core::{BatchMode, Engine, LogEntry, LogFilter, Operation, SummaryLength};

use crate::output;

/// Exit code for a batch stopped by an interrupt.
const EXIT_INTERRUPTED: u8 = 130;

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub async fn convert(
    engine: &Engine,
    source: PathBuf,
    target: PathBuf,
    preserve_original: bool,
    password: Option<String>,
    force: bool,
) -> Result<ExitCode> {
    let request = engine
        .request(&source, &target)
        .with_password(password)
        .with_overwrite(force);
    let request = if preserve_original {
        request.with_preserve_original(true)
    } else {
        request
    };

    let outcome = engine.convert(request).await;
    output::conversion(&source, &outcome);
    Ok(exit_for(outcome.is_success()))
}

#[allow(clippy::too_many_arguments)]
pub async fn batch_convert(
    engine: &Engine,
    source_dir: &Path,
    target_dir: &Path,
    source_ext: &str,
    target_ext: &str,
    parallel: bool,
    workers: Option<usize>,
    delete_originals: bool,
    password: Option<String>,
    force: bool,
) -> Result<ExitCode> {
    let mut options = engine
        .batch_options()
        .with_preserve_originals(!delete_originals)
        .with_password(password);
    if parallel {
        options.mode = BatchMode::Parallel;
    }
    if let Some(workers) = workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        options.workers = workers;
    }
    if force {
        options = options.with_overwrite(true);
    }

    let result = engine
        .batch_convert(source_dir, target_dir, source_ext, target_ext, &options)
        .await
        .context("Batch conversion aborted")?;

    output::batch(&result);
    if result.cancelled {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(exit_for(result.failed == 0))
}

pub async fn summarize(engine: &Engine, file: &Path, length: SummaryLength) -> Result<ExitCode> {
    match engine.summarize(file, length).await {
        Ok(result) => {
            output::summary(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            output::failure(&failure);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn merge(
    engine: &Engine,
    inputs: &[PathBuf],
    output_path: &Path,
    force: bool,
) -> Result<ExitCode> {
    match engine.merge(inputs, output_path, force).await {
        Ok(result) => {
            output::merge(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            output::failure(&failure);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn split(
    engine: &Engine,
    input: &Path,
    ranges: &str,
    output_dir: Option<&Path>,
    force: bool,
) -> Result<ExitCode> {
    match engine.split(input, ranges, output_dir, force).await {
        Ok(result) => {
            output::split(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            output::failure(&failure);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn info(engine: &Engine, file: &Path, json: bool) -> Result<ExitCode> {
    let info = engine
        .inspect(file)
        .await
        .with_context(|| format!("Cannot inspect {}", file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        output::info(&info);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn logs(
    engine: &Engine,
    operation: Option<Operation>,
    failures: bool,
    since: Option<chrono::DateTime<chrono::Utc>>,
    limit: usize,
    json: bool,
) -> Result<ExitCode> {
    let mut filter = LogFilter::new().with_time_range(since, None);
    if let Some(operation) = operation {
        filter = filter.with_operation(operation);
    }
    if failures {
        filter = filter.failures_only();
    }

    let (entries, skipped) = newest_entries(
        engine.logs(&filter).context("Cannot read operation log")?,
        limit,
    )?;
    if skipped > 0 {
        output::warning(format!("{} unreadable log line(s) skipped", skipped));
    }

    if json {
        for entry in &entries {
            println!("{}", serde_json::to_string(entry)?);
        }
    } else {
        output::logs(&entries);
    }
    Ok(ExitCode::SUCCESS)
}

/// Keeps the newest `limit` entries of an oldest-first listing. Lines that
/// do not parse are counted and skipped.
fn newest_entries(
    entries: impl Iterator<Item = Result<LogEntry, LogError>>,
    limit: usize,
) -> Result<(Vec<LogEntry>, usize)> {
    let mut tail = VecDeque::with_capacity(limit.min(1024));
    let mut skipped = 0usize;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e @ LogError::Serialization(_)) => {
                warn!(error = %e, "Skipping unreadable log entry");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e).context("Cannot read operation log"),
        };
        if tail.len() == limit {
            tail.pop_front();
        }
        if limit > 0 {
            tail.push_back(entry);
        }
    }
    Ok((tail.into_iter().collect(), skipped))
}

pub async fn cleanup(engine: &Engine, older_than_hours: Option<u64>) -> Result<ExitCode> {
    let older_than = older_than_hours.map(|h| Duration::from_secs(h.saturating_mul(3600)));
    let report = engine
        .cleanup(older_than)
        .await
        .context("Staging cleanup failed")?;
    output::cleanup(&report);
    Ok(exit_for(report.failed.is_empty()))
}

pub async fn version(engine: &Engine) -> Result<ExitCode> {
    let tools = engine.tools().await;
    info!(
        available = tools.iter().filter(|t| t.available).count(),
        total = tools.len(),
        "Probed external tools"
    );
    output::tools(env!("CARGO_PKG_VERSION"), &tools);
    Ok(ExitCode::SUCCESS)
}
