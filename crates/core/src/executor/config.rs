use std::path::PathBuf;
use std::time::Duration;

/// Settings for [`ConversionExecutor`](super::ConversionExecutor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Parent of every staging directory.
    pub staging_root: PathBuf,
    /// Upper bound on one backend invocation.
    pub timeout: Duration,
}

impl ExecutorConfig {
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("swissknife"))
    }
}
