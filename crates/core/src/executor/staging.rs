//! Scoped staging directories.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

/// Name prefix of every staging directory, used by cleanup to recognise them.
pub const STAGING_PREFIX: &str = "swissknife-";

/// A private working area for one operation.
///
/// The directory is removed when the value is dropped, including during a
/// panic unwind. [`release`](Self::release) does the same but reports errors.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Creates a fresh directory under `root`, creating `root` if needed.
    pub fn acquire(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)?;
        std::fs::create_dir(dir.path().join("work"))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Scratch directory handed to backends.
    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Where a backend writes its result before it is moved into place.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("output.{}", extension))
    }

    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_work_dir() {
        let root = tempfile::TempDir::new().unwrap();
        let staging = StagingArea::acquire(&root.path().join("nested")).unwrap();

        assert!(staging.work_dir().is_dir());
        assert!(staging
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));
        assert_eq!(
            staging.output_path("mp3").file_name().unwrap(),
            "output.mp3"
        );
    }

    #[test]
    fn test_release_and_drop_remove_directory() {
        let root = tempfile::TempDir::new().unwrap();

        let staging = StagingArea::acquire(root.path()).unwrap();
        let released = staging.path().to_path_buf();
        std::fs::write(staging.work_dir().join("scratch"), b"x").unwrap();
        staging.release();
        assert!(!released.exists());

        let dropped = {
            let staging = StagingArea::acquire(root.path()).unwrap();
            staging.path().to_path_buf()
        };
        assert!(!dropped.exists());
    }

    #[test]
    fn test_removed_on_panic() {
        let root = tempfile::TempDir::new().unwrap();
        let root_path = root.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _staging = StagingArea::acquire(&root_path).unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
