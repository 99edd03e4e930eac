//! Types for the format module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Coarse class of a file format, used to pick a backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Document,
    Image,
    Audio,
    Video,
    Archive,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Document,
        Self::Image,
        Self::Audio,
        Self::Video,
        Self::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an external transform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Document conversion via pandoc.
    Pandoc,
    /// Image re-encoding via ImageMagick.
    ImageMagick,
    /// Audio/video transcoding via ffmpeg.
    Ffmpeg,
    /// Archive repacking via 7-Zip.
    SevenZip,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pandoc => "pandoc",
            Self::ImageMagick => "imagemagick",
            Self::Ffmpeg => "ffmpeg",
            Self::SevenZip => "7z",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Canonical extension, lowercase, without the leading dot.
    pub extension: &'static str,
    pub category: Category,
    /// Alternative spellings that normalize to `extension`.
    pub aliases: &'static [&'static str],
    /// Whether the format can be a conversion source.
    pub readable: bool,
    /// Whether the format can be a conversion target.
    pub writable: bool,
    /// Whether content in this format can be password protected.
    pub may_be_encrypted: bool,
}

impl FormatDescriptor {
    /// Returns true if `ext` (already normalized) names this format.
    pub fn matches(&self, ext: &str) -> bool {
        self.extension == ext || self.aliases.contains(&ext)
    }

    /// Extension with a leading dot, for display.
    pub fn dotted(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Which target extensions a capability entry admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    /// Every writable format of the target category.
    AnyWritable,
    /// Only the listed canonical extensions.
    Only(&'static [&'static str]),
}

impl TargetFilter {
    pub fn admits(&self, target: &FormatDescriptor) -> bool {
        match self {
            Self::AnyWritable => target.writable,
            Self::Only(exts) => target.writable && exts.contains(&target.extension),
        }
    }
}

/// One row of the capability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityEntry {
    pub source: Category,
    pub target: Category,
    pub backend: BackendId,
    pub targets: TargetFilter,
}

/// Normalizes a user-supplied extension: trims, strips one leading dot, lowercases.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// Returns the normalized extension of a path, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".PDF"), "pdf");
        assert_eq!(normalize_extension("docx"), "docx");
        assert_eq!(normalize_extension("  .Mp3 "), "mp3");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("/a/b/Report.DOCX")), Some("docx".into()));
        assert_eq!(extension_of(Path::new("backup.tar.gz")), Some("gz".into()));
        assert_eq!(extension_of(Path::new("Makefile")), None);
    }

    #[test]
    fn test_target_filter() {
        let gif = FormatDescriptor {
            extension: "gif",
            category: Category::Image,
            aliases: &[],
            readable: true,
            writable: true,
            may_be_encrypted: false,
        };
        assert!(TargetFilter::AnyWritable.admits(&gif));
        assert!(TargetFilter::Only(&["gif"]).admits(&gif));
        assert!(!TargetFilter::Only(&["png"]).admits(&gif));
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(BackendId::SevenZip.to_string(), "7z");
        assert_eq!(Category::Video.to_string(), "video");
    }
}
