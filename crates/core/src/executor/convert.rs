//! Single-conversion execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{BackendSet, TransformOptions};
use crate::oplog::{LogEntry, LogHandle, Operation};
use crate::outcome::{ConversionOutcome, Failure, FailureKind};
use crate::router::{ConversionRequest, ConversionRouter, RoutingDecision};

use super::config::ExecutorConfig;
use super::place::move_into_place;
use super::staging::StagingArea;

/// Runs routed conversions.
///
/// Every call to [`execute`](Self::execute) produces exactly one
/// [`ConversionOutcome`] and one log entry. Backend errors, timeouts and
/// panics are all turned into typed failures.
#[derive(Clone)]
pub struct ConversionExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    backends: BackendSet,
    log: LogHandle,
    config: ExecutorConfig,
}

impl ConversionExecutor {
    pub fn new(backends: BackendSet, log: LogHandle, config: ExecutorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                backends,
                log,
                config,
            }),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    pub fn log(&self) -> &LogHandle {
        &self.inner.log
    }

    /// Runs one conversion and logs it as a `convert` operation.
    pub async fn execute(
        &self,
        request: &ConversionRequest,
        decision: &RoutingDecision,
    ) -> ConversionOutcome {
        self.execute_as(request, decision, Operation::Convert, None)
            .await
    }

    /// Runs one conversion and logs it under `operation`, tagged with `batch_id`.
    pub async fn execute_as(
        &self,
        request: &ConversionRequest,
        decision: &RoutingDecision,
        operation: Operation,
        batch_id: Option<Uuid>,
    ) -> ConversionOutcome {
        let started = Instant::now();

        // The conversion runs on its own task so a panicking backend becomes
        // a failure here. The staging directory is dropped during the unwind.
        let this = self.clone();
        let owned_request = request.clone();
        let owned_decision = *decision;
        let handle =
            tokio::spawn(async move { this.run(&owned_request, &owned_decision).await });

        let result = match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(Failure::new(
                FailureKind::Internal,
                "conversion panicked",
            )),
            Err(e) => Err(Failure::new(FailureKind::Internal, e.to_string())),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok((output_path, bytes_written)) => {
                info!(
                    source = %request.source().display(),
                    target = %output_path.display(),
                    backend = %decision.backend,
                    bytes = bytes_written,
                    duration_ms,
                    "Conversion succeeded"
                );
                ConversionOutcome::Success {
                    output_path,
                    bytes_written,
                    duration_ms,
                }
            }
            Err(failure) => {
                warn!(
                    source = %request.source().display(),
                    backend = %decision.backend,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Conversion failed"
                );
                failure.into()
            }
        };

        let entry = LogEntry::for_conversion(
            operation,
            request.source(),
            request.target(),
            &outcome,
            duration_ms,
        )
        .with_backend(decision.backend.as_str())
        .with_batch_id(batch_id);
        self.inner.log.record(entry).await;

        outcome
    }

    /// Logs a request that never reached a backend, typically a routing failure.
    /// Checks that the source is a readable file, routes the request and
    /// runs it. A missing source is an `IoError` whatever the extensions say.
    pub async fn submit(
        &self,
        router: &ConversionRouter,
        request: &ConversionRequest,
        operation: Operation,
        batch_id: Option<Uuid>,
    ) -> ConversionOutcome {
        let decision = match check_source(request.source()).await {
            Ok(()) => router.route(request).map_err(Failure::from),
            Err(failure) => Err(failure),
        };
        match decision {
            Ok(decision) => {
                self.execute_as(request, &decision, operation, batch_id)
                    .await
            }
            Err(failure) => {
                self.record_failure(request, failure, operation, batch_id)
                    .await
            }
        }
    }

    pub async fn record_failure(
        &self,
        request: &ConversionRequest,
        failure: Failure,
        operation: Operation,
        batch_id: Option<Uuid>,
    ) -> ConversionOutcome {
        warn!(
            source = %request.source().display(),
            kind = %failure.kind,
            error = %failure.message,
            "Conversion rejected"
        );
        let outcome = ConversionOutcome::from(failure);
        let entry =
            LogEntry::for_conversion(operation, request.source(), request.target(), &outcome, 0)
                .with_batch_id(batch_id);
        self.inner.log.record(entry).await;
        outcome
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        decision: &RoutingDecision,
    ) -> Result<(PathBuf, u64), Failure> {
        let source = request.source();
        let target = request.target();

        check_source(source).await?;
        prepare_target(target, request.overwrite).await?;

        let staging = StagingArea::acquire(&self.inner.config.staging_root)
            .map_err(|e| Failure::io("cannot create staging directory", &e))?;

        let result = self.convert_in(&staging, request, decision).await;
        staging.release();
        let bytes = result?;

        if !request.preserve_original {
            // Only reached once the target has been verified.
            if let Err(e) = tokio::fs::remove_file(source).await {
                warn!(source = %source.display(), error = %e, "Failed to remove original");
            }
        }

        Ok((target.to_path_buf(), bytes))
    }

    async fn convert_in(
        &self,
        staging: &StagingArea,
        request: &ConversionRequest,
        decision: &RoutingDecision,
    ) -> Result<u64, Failure> {
        let backend = self.inner.backends.get(decision.backend);
        let timeout = self.inner.config.timeout;
        let source = request.source();
        let target = request.target();

        if decision.source_may_be_encrypted && request.password.is_none() {
            match tokio::time::timeout(timeout, backend.requires_password(source)).await {
                Ok(Ok(true)) => {
                    return Err(Failure::new(
                        FailureKind::PasswordRequired,
                        format!("{} is encrypted; supply a password", source.display()),
                    ))
                }
                Ok(Ok(false)) => {}
                // The transform reports encryption itself if the probe could not tell.
                Ok(Err(e)) => {
                    warn!(source = %source.display(), error = %e, "Encryption probe failed")
                }
                Err(_) => return Err(timeout_failure(timeout)),
            }
        }

        let staged = staging.output_path(decision.target_format);
        let options =
            TransformOptions::new(staging.work_dir()).with_password(request.password.clone());

        debug!(
            backend = %decision.backend,
            staged = %staged.display(),
            "Invoking backend"
        );
        match tokio::time::timeout(timeout, backend.transform(source, &staged, &options)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(timeout_failure(timeout)),
        }

        let staged_len = match tokio::fs::metadata(&staged).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if staged_len == 0 {
            return Err(empty_output(decision));
        }

        move_into_place(&staged, target)
            .await
            .map_err(|e| Failure::io(format!("cannot write {}", target.display()), &e))?;

        let written = match tokio::fs::metadata(target).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };
        if written == 0 {
            let _ = tokio::fs::remove_file(target).await;
            return Err(empty_output(decision));
        }

        Ok(written)
    }
}

async fn check_source(source: &Path) -> Result<(), Failure> {
    match tokio::fs::metadata(source).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(Failure::new(
            FailureKind::IoError,
            format!("{} is not a regular file", source.display()),
        )),
        Err(e) => Err(Failure::io(format!("cannot read {}", source.display()), &e)),
    }
}

async fn prepare_target(target: &Path, overwrite: bool) -> Result<(), Failure> {
    if !overwrite && tokio::fs::try_exists(target).await.unwrap_or(false) {
        return Err(Failure::new(
            FailureKind::IoError,
            format!("{} already exists", target.display()),
        ));
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Failure::io(format!("cannot create {}", parent.display()), &e))?;
    }
    Ok(())
}

fn timeout_failure(limit: Duration) -> Failure {
    Failure::new(
        FailureKind::Timeout,
        format!("backend did not finish within {:?}", limit),
    )
}

fn empty_output(decision: &RoutingDecision) -> Failure {
    Failure::new(
        FailureKind::EmptyOutput,
        format!("{} produced no output", decision.backend),
    )
}
