//! Trait definitions for the backend module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::format::BackendId;

use super::error::BackendError;

/// Per-call options handed to a backend.
#[derive(Clone)]
pub struct TransformOptions {
    /// Password for encrypted input.
    pub password: Option<String>,
    /// Scratch directory owned by the caller; removed after the call.
    pub work_dir: PathBuf,
}

impl TransformOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            password: None,
            work_dir: work_dir.into(),
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

/// An external transform that turns one file into another.
///
/// Backends are invoked by path. They must write `output` completely or
/// return an error; the caller verifies the result independently.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which registry backend this implements.
    fn id(&self) -> BackendId;

    /// Human readable name, used in logs.
    fn name(&self) -> &str {
        self.id().as_str()
    }

    /// Whether `input` is encrypted and needs a password to be read.
    ///
    /// Only called for formats flagged as potentially encrypted.
    async fn requires_password(&self, _input: &Path) -> Result<bool, BackendError> {
        Ok(false)
    }

    /// Transforms `input` into `output`.
    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError>;
}
