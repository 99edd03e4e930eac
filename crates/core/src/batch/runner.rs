//! Batch orchestration over a directory snapshot.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::executor::ConversionExecutor;
use crate::format::{extension_of, normalize_extension, FormatRegistry};
use crate::oplog::Operation;
use crate::router::{ConversionRequest, ConversionRouter};

use super::error::BatchError;
use super::types::{BatchItem, BatchMode, BatchOptions, BatchResult, CancelFlag};

/// A file picked up by the snapshot, with its computed target.
#[derive(Debug, Clone)]
struct Job {
    source: PathBuf,
    target: PathBuf,
}

/// Runs the executor over every matching file in a directory.
///
/// The directory is listed once, up front. Files added or removed while the
/// batch runs are not noticed. A failing item never stops the batch; only
/// the structural checks in [`run_batch`](Self::run_batch) return an error.
#[derive(Clone)]
pub struct BatchOrchestrator {
    executor: ConversionExecutor,
    router: ConversionRouter,
    cancel: CancelFlag,
}

impl BatchOrchestrator {
    pub fn new(executor: ConversionExecutor, router: ConversionRouter) -> Self {
        Self {
            executor,
            router,
            cancel: CancelFlag::new(),
        }
    }

    /// Uses an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Converts every `source_ext` file in `source_dir` into `target_dir`.
    ///
    /// A cancel raised before or during the run stops it; the flag is
    /// cleared once the run returns so the next batch starts normally.
    pub async fn run_batch(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        source_ext: &str,
        target_ext: &str,
        options: &BatchOptions,
    ) -> Result<BatchResult, BatchError> {
        let result = self
            .execute_batch(source_dir, target_dir, source_ext, target_ext, options)
            .await;
        self.cancel.reset();
        result
    }

    async fn execute_batch(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        source_ext: &str,
        target_ext: &str,
        options: &BatchOptions,
    ) -> Result<BatchResult, BatchError> {
        let source_ext = checked_extension(source_ext)?;
        let target_ext = checked_extension(target_ext)?;

        match tokio::fs::metadata(source_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(BatchError::NotADirectory {
                    path: source_dir.to_path_buf(),
                })
            }
            Err(_) => {
                return Err(BatchError::SourceNotFound {
                    path: source_dir.to_path_buf(),
                })
            }
        }
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|source| BatchError::TargetNotCreatable {
                path: target_dir.to_path_buf(),
                source,
            })?;

        let sources = snapshot(self.router.registry(), source_dir, &source_ext).await?;
        let jobs: Vec<Job> = sources
            .into_iter()
            .map(|source| {
                let target = target_path(target_dir, &source, &target_ext);
                Job { source, target }
            })
            .collect();

        let batch_id = Uuid::new_v4();
        let total = jobs.len();
        info!(
            batch_id = %batch_id,
            source_dir = %source_dir.display(),
            files = total,
            mode = ?options.mode,
            "Starting batch"
        );

        let mut result = BatchResult::empty(batch_id);
        if total == 0 {
            return Ok(result);
        }

        match options.mode {
            BatchMode::Sequential => {
                for job in jobs {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    result.push(self.process(job, options, batch_id).await);
                }
            }
            BatchMode::Parallel => {
                for item in self.run_parallel(jobs, options, batch_id).await {
                    result.push(item);
                }
            }
        }

        result.cancelled = result.attempted < total;
        info!(
            batch_id = %batch_id,
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed,
            cancelled = result.cancelled,
            "Batch finished"
        );
        Ok(result)
    }

    /// Fixed pool of workers pulling from a shared queue. Items come back in
    /// completion order.
    async fn run_parallel(
        &self,
        jobs: Vec<Job>,
        options: &BatchOptions,
        batch_id: Uuid,
    ) -> Vec<BatchItem> {
        let workers = options.workers.max(1).min(jobs.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (tx, mut rx) = mpsc::channel(workers * 2);

        for worker in 0..workers {
            let queue = queue.clone();
            let tx = tx.clone();
            let this = self.clone();
            let options = options.clone();

            tokio::spawn(async move {
                loop {
                    if this.cancel.is_cancelled() {
                        debug!(worker, "Worker stopping on cancel");
                        break;
                    }
                    let Some(job) = queue.lock().await.pop_front() else {
                        break;
                    };
                    let item = this.process(job, &options, batch_id).await;
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    async fn process(&self, job: Job, options: &BatchOptions, batch_id: Uuid) -> BatchItem {
        let request = ConversionRequest::new(&job.source, &job.target)
            .with_preserve_original(options.preserve_originals)
            .with_overwrite(options.overwrite)
            .with_password(options.password.clone());

        let outcome = self
            .executor
            .submit(&self.router, &request, Operation::BatchItem, Some(batch_id))
            .await;

        BatchItem {
            source: job.source,
            target: job.target,
            outcome,
        }
    }
}

fn checked_extension(ext: &str) -> Result<String, BatchError> {
    let normalized = normalize_extension(ext);
    if normalized.is_empty() || normalized.contains(['/', '\\']) {
        return Err(BatchError::InvalidExtension {
            extension: ext.to_string(),
        });
    }
    Ok(normalized)
}

/// Canonical form used for matching, so `jpeg` files are picked up by `jpg`.
fn canonical(registry: &FormatRegistry, ext: &str) -> String {
    registry
        .descriptor(ext)
        .map(|d| d.extension.to_string())
        .unwrap_or_else(|_| ext.to_string())
}

/// Regular files in `dir` whose extension matches, sorted by name.
async fn snapshot(
    registry: &FormatRegistry,
    dir: &Path,
    source_ext: &str,
) -> Result<Vec<PathBuf>, BatchError> {
    let wanted = canonical(registry, source_ext);
    let mut files = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(ext) = extension_of(&path) {
            if canonical(registry, &ext) == wanted {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn target_path(target_dir: &Path, source: &Path, target_ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push(".");
    name.push(target_ext);
    target_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_replaces_extension() {
        assert_eq!(
            target_path(Path::new("/out"), Path::new("/in/Report.final.DOCX"), "pdf"),
            PathBuf::from("/out/Report.final.pdf")
        );
    }

    #[test]
    fn test_checked_extension() {
        assert_eq!(checked_extension(".PNG").unwrap(), "png");
        assert!(checked_extension("").is_err());
        assert!(checked_extension(".").is_err());
        assert!(checked_extension("a/b").is_err());
    }

    #[tokio::test]
    async fn test_snapshot_filters_case_insensitively_and_sorts() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["b.JPG", "a.jpg", "c.jpeg", "d.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let files = snapshot(FormatRegistry::global(), dir.path(), "jpg")
            .await
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.JPG", "c.jpeg"]);
    }
}
