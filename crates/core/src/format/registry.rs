//! The format registry: category resolution and backend lookup.

use once_cell::sync::Lazy;

use super::error::RoutingError;
use super::table::{CAPABILITIES, FORMATS};
use super::types::{normalize_extension, BackendId, CapabilityEntry, Category, FormatDescriptor};

static GLOBAL: Lazy<FormatRegistry> =
    Lazy::new(|| FormatRegistry::new(FORMATS.to_vec(), CAPABILITIES.to_vec()));

/// Read-only capability matrix.
///
/// Built once from a static table and shared by reference. Every method is
/// pure; lookups return the same answer for the same inputs.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: Vec<FormatDescriptor>,
    capabilities: Vec<CapabilityEntry>,
}

impl FormatRegistry {
    /// Creates a registry over an explicit table.
    pub fn new(formats: Vec<FormatDescriptor>, capabilities: Vec<CapabilityEntry>) -> Self {
        Self {
            formats,
            capabilities,
        }
    }

    /// The process-wide registry built from the built-in table.
    pub fn global() -> &'static FormatRegistry {
        &GLOBAL
    }

    /// All known formats in table order.
    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    /// Looks up the descriptor for an extension (any case, dot optional).
    ///
    /// An extension claimed by descriptors of more than one category is
    /// refused rather than resolved to the first match.
    pub fn descriptor(&self, ext: &str) -> Result<&FormatDescriptor, RoutingError> {
        let ext = normalize_extension(ext);
        let mut matches = self.formats.iter().filter(|f| f.matches(&ext));

        let first = matches.next().ok_or_else(|| RoutingError::UnknownFormat {
            extension: ext.clone(),
        })?;

        let mut categories = vec![first.category];
        for other in matches {
            if !categories.contains(&other.category) {
                categories.push(other.category);
            }
        }

        if categories.len() > 1 {
            categories.sort();
            return Err(RoutingError::AmbiguousFormat {
                extension: ext,
                categories,
            });
        }

        Ok(first)
    }

    pub fn resolve_category(&self, ext: &str) -> Result<Category, RoutingError> {
        self.descriptor(ext).map(|d| d.category)
    }

    /// Finds the backend for a `(source, target)` extension pair.
    pub fn find_backend(&self, source_ext: &str, target_ext: &str) -> Result<BackendId, RoutingError> {
        self.capability(source_ext, target_ext).map(|c| c.backend)
    }

    /// Like [`find_backend`](Self::find_backend) but returns the matching entry.
    pub fn capability(
        &self,
        source_ext: &str,
        target_ext: &str,
    ) -> Result<&CapabilityEntry, RoutingError> {
        let source = self.descriptor(source_ext)?;
        let target = self.descriptor(target_ext)?;

        if source.extension == target.extension {
            return Err(RoutingError::NoOpConversion {
                extension: source.extension.to_string(),
            });
        }

        let unsupported = || RoutingError::UnsupportedConversion {
            source_ext: source.extension.to_string(),
            target_ext: target.extension.to_string(),
            source_category: source.category,
            target_category: target.category,
        };

        if !source.readable || !target.writable {
            return Err(unsupported());
        }

        self.capabilities
            .iter()
            .find(|c| {
                c.source == source.category && c.target == target.category && c.targets.admits(target)
            })
            .ok_or_else(unsupported)
    }

    /// Every canonical extension `source_ext` can be converted to, in table order.
    pub fn targets_for(&self, source_ext: &str) -> Result<Vec<&'static str>, RoutingError> {
        let source = self.descriptor(source_ext)?;
        Ok(self
            .formats
            .iter()
            .filter(|t| self.capability(source.extension, t.extension).is_ok())
            .map(|t| t.extension)
            .collect())
    }
}
