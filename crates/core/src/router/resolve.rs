//! Request routing against the format registry.

use std::path::Path;

use crate::format::{extension_of, FormatRegistry, RoutingError};

use super::types::{ConversionRequest, RoutingDecision};

/// Resolves requests to backends. Holds no state beyond the registry.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRouter {
    registry: &'static FormatRegistry,
}

impl Default for ConversionRouter {
    fn default() -> Self {
        Self::new(FormatRegistry::global())
    }
}

impl ConversionRouter {
    pub fn new(registry: &'static FormatRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'static FormatRegistry {
        self.registry
    }

    /// Routes a request by the extensions of its source and target paths.
    pub fn route(&self, request: &ConversionRequest) -> Result<RoutingDecision, RoutingError> {
        self.route_paths(&request.source_path, &request.target_path)
    }

    pub fn route_paths(&self, source: &Path, target: &Path) -> Result<RoutingDecision, RoutingError> {
        let source_ext = extension_of(source).ok_or_else(|| RoutingError::MissingExtension {
            path: source.to_path_buf(),
        })?;
        let target_ext = extension_of(target).ok_or_else(|| RoutingError::MissingExtension {
            path: target.to_path_buf(),
        })?;
        self.route_extensions(&source_ext, &target_ext)
    }

    /// Routes a bare extension pair. Extensions are normalized first.
    pub fn route_extensions(
        &self,
        source_ext: &str,
        target_ext: &str,
    ) -> Result<RoutingDecision, RoutingError> {
        let capability = self.registry.capability(source_ext, target_ext)?;
        let source = self.registry.descriptor(source_ext)?;
        let target = self.registry.descriptor(target_ext)?;

        Ok(RoutingDecision {
            backend: capability.backend,
            source_category: source.category,
            target_category: target.category,
            source_format: source.extension,
            target_format: target.extension,
            source_may_be_encrypted: source.may_be_encrypted,
        })
    }

    /// Speculative check with no side effects.
    pub fn can_convert(&self, source_ext: &str, target_ext: &str) -> bool {
        self.route_extensions(source_ext, target_ext).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{BackendId, Category};

    #[test]
    fn test_route_request() {
        let router = ConversionRouter::default();
        let req = ConversionRequest::new("/data/Report.DOCX", "/out/report.pdf");
        let decision = router.route(&req).unwrap();

        assert_eq!(decision.backend, BackendId::Pandoc);
        assert_eq!(decision.source_category, Category::Document);
        assert_eq!(decision.target_category, Category::Document);
        assert_eq!(decision.source_format, "docx");
        assert!(decision.source_may_be_encrypted);
    }

    #[test]
    fn test_route_normalizes_aliases() {
        let router = ConversionRouter::default();
        let decision = router.route_extensions(".JPEG", "PNG").unwrap();
        assert_eq!(decision.source_format, "jpg");
        assert_eq!(decision.target_format, "png");
        assert_eq!(decision.backend, BackendId::ImageMagick);
    }

    #[test]
    fn test_route_cross_category() {
        let router = ConversionRouter::default();
        let decision = router.route_extensions("mp4", "gif").unwrap();
        assert_eq!(decision.source_category, Category::Video);
        assert_eq!(decision.target_category, Category::Image);
        assert_eq!(decision.backend, BackendId::Ffmpeg);
    }

    #[test]
    fn test_route_missing_extension() {
        let router = ConversionRouter::default();
        let req = ConversionRequest::new("/data/README", "/out/readme.pdf");
        assert!(matches!(
            router.route(&req),
            Err(RoutingError::MissingExtension { .. })
        ));
    }

    #[test]
    fn test_route_noop_and_unsupported() {
        let router = ConversionRouter::default();
        assert!(matches!(
            router.route_extensions("mp3", "MP3"),
            Err(RoutingError::NoOpConversion { .. })
        ));
        assert!(matches!(
            router.route_extensions("docx", "mp4"),
            Err(RoutingError::UnsupportedConversion { .. })
        ));
        assert!(!router.can_convert("txt", "wav"));
        assert!(router.can_convert("wav", "flac"));
    }

    #[test]
    fn test_route_does_not_touch_filesystem() {
        let router = ConversionRouter::default();
        let req = ConversionRequest::new("/definitely/not/here.flac", "/nowhere/out.ogg");
        assert!(router.route(&req).is_ok());
        assert!(!Path::new("/nowhere").exists());
    }
}
