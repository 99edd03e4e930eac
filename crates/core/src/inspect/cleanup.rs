//! Removal of staging directories left behind by killed processes.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use crate::executor::STAGING_PREFIX;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub bytes_reclaimed: u64,
    /// Directories that matched but could not be removed.
    pub failed: Vec<PathBuf>,
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(t) if t.is_dir() => dir_size(&entry.path()),
            Ok(_) => entry.metadata().map(|m| m.len()).unwrap_or(0),
            Err(_) => 0,
        })
        .sum()
}

fn cleanup_blocking(root: &Path, older_than: Duration) -> std::io::Result<CleanupReport> {
    let mut report = CleanupReport::default();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(STAGING_PREFIX) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_dir() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age < older_than {
            continue;
        }

        let path = entry.path();
        let size = dir_size(&path);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                report.bytes_reclaimed += size;
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove stale staging directory");
                report.failed.push(path);
            }
        }
    }

    Ok(report)
}

/// Removes staging directories under `root` last modified at least
/// `older_than` ago. Other entries in `root` are left alone.
pub async fn cleanup_staging(root: &Path, older_than: Duration) -> std::io::Result<CleanupReport> {
    let root = root.to_path_buf();
    let report = tokio::task::spawn_blocking(move || cleanup_blocking(&root, older_than))
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))??;

    info!(
        removed = report.removed.len(),
        bytes = report.bytes_reclaimed,
        "Staging cleanup finished"
    );
    Ok(report)
}
