//! Configuration for the external tools.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tool paths and limits for every backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: PathBuf,

    /// ImageMagick 7 entry point.
    #[serde(default = "default_magick_path")]
    pub magick_path: PathBuf,

    #[serde(default = "default_sevenzip_path")]
    pub sevenzip_path: PathBuf,

    #[serde(default = "default_qpdf_path")]
    pub qpdf_path: PathBuf,

    #[serde(default = "default_pdftotext_path")]
    pub pdftotext_path: PathBuf,

    /// Speech-to-text CLI used for summarizing audio and video.
    #[serde(default = "default_whisper_path")]
    pub whisper_path: PathBuf,

    /// Decrypts password-protected Office documents.
    #[serde(default = "default_office_decrypt_path")]
    pub office_decrypt_path: PathBuf,

    /// Timeout for a single backend invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_ffmpeg_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments placed before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// LaTeX engine pandoc uses for PDF output.
    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,

    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_pandoc_path() -> PathBuf {
    PathBuf::from("pandoc")
}

fn default_magick_path() -> PathBuf {
    PathBuf::from("magick")
}

fn default_sevenzip_path() -> PathBuf {
    PathBuf::from("7z")
}

fn default_qpdf_path() -> PathBuf {
    PathBuf::from("qpdf")
}

fn default_pdftotext_path() -> PathBuf {
    PathBuf::from("pdftotext")
}

fn default_whisper_path() -> PathBuf {
    PathBuf::from("whisper")
}

fn default_office_decrypt_path() -> PathBuf {
    PathBuf::from("msoffcrypto-tool")
}

fn default_timeout() -> u64 {
    300
}

fn default_ffmpeg_log_level() -> String {
    "error".to_string()
}

fn default_pdf_engine() -> String {
    "xelatex".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            pandoc_path: default_pandoc_path(),
            magick_path: default_magick_path(),
            sevenzip_path: default_sevenzip_path(),
            qpdf_path: default_qpdf_path(),
            pdftotext_path: default_pdftotext_path(),
            whisper_path: default_whisper_path(),
            office_decrypt_path: default_office_decrypt_path(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_ffmpeg_log_level(),
            extra_ffmpeg_args: Vec::new(),
            pdf_engine: default_pdf_engine(),
            whisper_model: default_whisper_model(),
        }
    }
}

impl BackendConfig {
    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the PDF engine.
    pub fn with_pdf_engine(mut self, engine: impl Into<String>) -> Self {
        self.pdf_engine = engine.into();
        self
    }

    /// Every configured tool as `(name, path)`, in a stable order.
    pub fn tools(&self) -> Vec<(&'static str, &PathBuf)> {
        vec![
            ("pandoc", &self.pandoc_path),
            ("magick", &self.magick_path),
            ("ffmpeg", &self.ffmpeg_path),
            ("ffprobe", &self.ffprobe_path),
            ("7z", &self.sevenzip_path),
            ("qpdf", &self.qpdf_path),
            ("pdftotext", &self.pdftotext_path),
            ("whisper", &self.whisper_path),
            ("msoffcrypto-tool", &self.office_decrypt_path),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.sevenzip_path, PathBuf::from("7z"));
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.pdf_engine, "xelatex");
    }

    #[test]
    fn test_config_builder() {
        let config = BackendConfig::default()
            .with_timeout(30)
            .with_pdf_engine("lualatex");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pdf_engine, "lualatex");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BackendConfig = toml::from_str(
            r#"
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.pandoc_path, PathBuf::from("pandoc"));
    }

    #[test]
    fn test_tools_listing() {
        let config = BackendConfig::default();
        let names: Vec<&str> = config.tools().into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"pandoc"));
        assert!(names.contains(&"7z"));
        assert_eq!(names.len(), 9);
    }
}
