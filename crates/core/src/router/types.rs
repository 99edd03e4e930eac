//! Request and decision types for routing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::{BackendId, Category};

/// A single conversion request.
///
/// Built once by the caller and never modified afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    /// Leave the source in place after a successful conversion.
    pub preserve_original: bool,
    /// Password for encrypted inputs.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Replace an existing target instead of failing.
    #[serde(default)]
    pub overwrite: bool,
}

impl ConversionRequest {
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            preserve_original: false,
            password: None,
            overwrite: false,
        }
    }

    pub fn with_preserve_original(mut self, preserve: bool) -> Self {
        self.preserve_original = preserve;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source_path
    }

    pub fn target(&self) -> &Path {
        &self.target_path
    }
}

// Keep passwords out of debug output and tracing fields.
impl std::fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("source_path", &self.source_path)
            .field("target_path", &self.target_path)
            .field("preserve_original", &self.preserve_original)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub backend: BackendId,
    pub source_category: Category,
    pub target_category: Category,
    /// Canonical source extension.
    pub source_format: &'static str,
    /// Canonical target extension.
    pub target_format: &'static str,
    /// Whether the source format can carry a password.
    pub source_may_be_encrypted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ConversionRequest::new("/in/a.docx", "/out/a.pdf")
            .with_preserve_original(true)
            .with_password(Some("secret".to_string()))
            .with_overwrite(true);

        assert_eq!(req.source(), Path::new("/in/a.docx"));
        assert!(req.preserve_original);
        assert!(req.overwrite);
        assert_eq!(req.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_password_is_none() {
        let req = ConversionRequest::new("a.zip", "a.7z").with_password(Some(String::new()));
        assert!(req.password.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let req = ConversionRequest::new("a.zip", "a.7z").with_password(Some("hunter2".into()));
        let debug = format!("{:?}", req);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }
}
