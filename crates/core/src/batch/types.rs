use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::outcome::ConversionOutcome;

/// How batch items are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    #[default]
    Sequential,
    Parallel,
}

/// Options for one batch run.
#[derive(Clone)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Worker count in parallel mode.
    pub workers: usize,
    pub overwrite: bool,
    pub preserve_originals: bool,
    pub password: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: BatchMode::Sequential,
            workers: 4,
            overwrite: false,
            preserve_originals: true,
            password: None,
        }
    }
}

impl BatchOptions {
    pub fn parallel(workers: usize) -> Self {
        Self {
            mode: BatchMode::Parallel,
            workers,
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_preserve_originals(mut self, preserve: bool) -> Self {
        self.preserve_originals = preserve;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }
}

impl std::fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOptions")
            .field("mode", &self.mode)
            .field("workers", &self.workers)
            .field("overwrite", &self.overwrite)
            .field("preserve_originals", &self.preserve_originals)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Cooperative cancellation shared between a batch and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One processed file.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub source: PathBuf,
    pub target: PathBuf,
    pub outcome: ConversionOutcome,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the batch stopped before every file was attempted.
    pub cancelled: bool,
    pub items: Vec<BatchItem>,
}

impl BatchResult {
    pub(crate) fn empty(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            cancelled: false,
            items: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, item: BatchItem) {
        self.attempted += 1;
        if item.outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(item);
    }

    /// Only a batch with no failed item is a success.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|i| !i.outcome.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Failure, FailureKind};

    fn item(ok: bool) -> BatchItem {
        let outcome = if ok {
            ConversionOutcome::Success {
                output_path: "/out/a.md".into(),
                bytes_written: 1,
                duration_ms: 1,
            }
        } else {
            Failure::new(FailureKind::BackendError, "bad").into()
        };
        BatchItem {
            source: "/in/a.txt".into(),
            target: "/out/a.md".into(),
            outcome,
        }
    }

    #[test]
    fn test_counts() {
        let mut result = BatchResult::empty(Uuid::new_v4());
        assert!(result.is_success());

        result.push(item(true));
        result.push(item(false));
        result.push(item(true));

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.is_success());
        assert_eq!(result.failures().count(), 1);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_options_redact_password() {
        let opts = BatchOptions::default().with_password(Some("hunter2".into()));
        assert!(!format!("{:?}", opts).contains("hunter2"));
        assert!(opts.preserve_originals);
    }
}
