//! Error types for routing.

use std::path::PathBuf;
use thiserror::Error;

use crate::outcome::{Failure, FailureKind};

use super::types::Category;

/// Errors produced while resolving formats or routing a request.
///
/// None of these have side effects: they are raised before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Extension is not in the registry.
    #[error("Unknown format: .{extension}")]
    UnknownFormat { extension: String },

    /// Extension is claimed by more than one category; refused rather than guessed.
    #[error("Ambiguous format: .{extension} maps to {categories:?}")]
    AmbiguousFormat {
        extension: String,
        categories: Vec<Category>,
    },

    /// Path has no extension to route on.
    #[error("Cannot determine format of {path}: no file extension")]
    MissingExtension { path: PathBuf },

    /// Source and target are the same format.
    #[error("Source and target are both .{extension}; nothing to convert")]
    NoOpConversion { extension: String },

    /// No capability entry covers the pair.
    #[error("Cannot convert {source_category} .{source_ext} to {target_category} .{target_ext}")]
    UnsupportedConversion {
        source_ext: String,
        target_ext: String,
        source_category: Category,
        target_category: Category,
    },
}

impl RoutingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownFormat { .. }
            | Self::AmbiguousFormat { .. }
            | Self::MissingExtension { .. } => FailureKind::UnknownFormat,
            Self::NoOpConversion { .. } => FailureKind::NoOpConversion,
            Self::UnsupportedConversion { .. } => FailureKind::UnsupportedConversion,
        }
    }
}

impl From<RoutingError> for Failure {
    fn from(err: RoutingError) -> Self {
        Failure::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_fails_as_unknown() {
        let err = RoutingError::AmbiguousFormat {
            extension: "gif".to_string(),
            categories: vec![Category::Image, Category::Video],
        };
        assert_eq!(err.kind(), FailureKind::UnknownFormat);
    }

    #[test]
    fn test_into_failure_keeps_message() {
        let failure: Failure = RoutingError::NoOpConversion {
            extension: "png".to_string(),
        }
        .into();
        assert_eq!(failure.kind, FailureKind::NoOpConversion);
        assert!(failure.message.contains(".png"));
    }
}
