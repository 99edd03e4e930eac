//! Pandoc-based document backend.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::format::{extension_of, BackendId};

use super::command::{arg, run_tool};
use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::{Backend, TransformOptions};

/// Compound File Binary signature. Encrypted OOXML files are stored in a CFB
/// container instead of a zip.
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const OOXML: &[&str] = &["docx", "pptx", "xlsx"];

/// Converts documents with pandoc.
///
/// PDF input has no pandoc reader, so it is extracted to text with
/// `pdftotext` first. Encrypted PDFs are decrypted with `qpdf` and encrypted
/// Office files with `msoffcrypto-tool` when a password is supplied.
pub struct PandocBackend {
    config: BackendConfig,
}

impl PandocBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BackendConfig::default())
    }

    /// Pandoc reader name for a canonical source extension.
    fn reader(ext: &str) -> &str {
        match ext {
            "md" | "txt" => "markdown",
            other => other,
        }
    }

    /// Pandoc writer name for a canonical target extension.
    ///
    /// `None` for PDF, where pandoc picks the writer from `--pdf-engine`.
    fn writer(ext: &str) -> Option<&str> {
        let writer = match ext {
            "pdf" => return None,
            "txt" => "plain",
            "md" => "markdown",
            "tex" => "latex",
            "texi" => "texinfo",
            "1" => "man",
            "adoc" => "asciidoc",
            "dj" => "djot",
            "hs" => "native",
            "typ" => "typst",
            "bib" => "biblatex",
            other => other,
        };
        Some(writer)
    }

    fn build_args(&self, input: &Path, reader: &str, output: &Path, target_ext: &str) -> Vec<OsString> {
        let mut args = vec![arg("-f"), arg(reader)];

        match Self::writer(target_ext) {
            Some(writer) => args.extend([arg("-t"), arg(writer)]),
            None => args.push(arg(format!("--pdf-engine={}", self.config.pdf_engine))),
        }

        args.extend([arg("--standalone"), arg("-o"), arg(output), arg(input)]);
        args
    }

    async fn is_cfb(path: &Path) -> Result<bool, BackendError> {
        use tokio::io::AsyncReadExt;

        let mut file = tokio::fs::File::open(path).await?;
        let mut magic = [0u8; 8];
        match file.read_exact(&mut magic).await {
            Ok(_) => Ok(magic == CFB_MAGIC),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// `qpdf --requires-password` exits 0 when a password is needed, 2 when
    /// the file is not encrypted and 3 when it is encrypted without a user password.
    async fn pdf_requires_password(&self, input: &Path) -> Result<bool, BackendError> {
        let output = run_tool(
            "qpdf",
            &self.config.qpdf_path,
            &[arg("--requires-password"), arg(input)],
        )
        .await?;

        match output.code() {
            Some(0) => Ok(true),
            Some(2) | Some(3) => Ok(false),
            _ => Err(BackendError::failed(
                "qpdf could not inspect the PDF",
                Some(output.stderr),
            )),
        }
    }

    async fn decrypt_pdf(
        &self,
        input: &Path,
        password: &str,
        work_dir: &Path,
    ) -> Result<PathBuf, BackendError> {
        let decrypted = work_dir.join("decrypted.pdf");
        let output = run_tool(
            "qpdf",
            &self.config.qpdf_path,
            &[
                arg(format!("--password={}", password)),
                arg("--decrypt"),
                arg(input),
                arg(&decrypted),
            ],
        )
        .await?;

        // Exit code 3 means success with warnings.
        if output.success() || output.code() == Some(3) {
            return Ok(decrypted);
        }
        if output.reports_bad_password() {
            return Err(BackendError::InvalidPassword {
                path: input.to_path_buf(),
            });
        }
        output.require_success("qpdf")?;
        Ok(decrypted)
    }

    async fn decrypt_office(
        &self,
        input: &Path,
        ext: &str,
        password: &str,
        work_dir: &Path,
    ) -> Result<PathBuf, BackendError> {
        let decrypted = work_dir.join(format!("decrypted.{}", ext));
        let output = run_tool(
            "msoffcrypto-tool",
            &self.config.office_decrypt_path,
            &[arg(input), arg(&decrypted), arg("-p"), arg(password)],
        )
        .await?;

        if !output.success() && output.reports_bad_password() {
            return Err(BackendError::InvalidPassword {
                path: input.to_path_buf(),
            });
        }
        output.require_success("msoffcrypto-tool")?;
        Ok(decrypted)
    }

    async fn extract_pdf_text(&self, input: &Path, work_dir: &Path) -> Result<PathBuf, BackendError> {
        let text = work_dir.join("extracted.txt");
        run_tool(
            "pdftotext",
            &self.config.pdftotext_path,
            &[arg("-layout"), arg("-enc"), arg("UTF-8"), arg(input), arg(&text)],
        )
        .await?
        .require_success("pdftotext")?;
        Ok(text)
    }

    /// Extracts plain text from any readable document. Used by summarization.
    pub async fn extract_text(
        &self,
        input: &Path,
        options: &TransformOptions,
    ) -> Result<String, BackendError> {
        let output = options.work_dir.join("document.txt");
        self.transform(input, &output, options).await?;
        Ok(tokio::fs::read_to_string(&output).await?)
    }
}

#[async_trait]
impl Backend for PandocBackend {
    fn id(&self) -> BackendId {
        BackendId::Pandoc
    }

    async fn requires_password(&self, input: &Path) -> Result<bool, BackendError> {
        match extension_of(input).as_deref() {
            Some("pdf") => self.pdf_requires_password(input).await,
            Some(ext) if OOXML.contains(&ext) => Self::is_cfb(input).await,
            _ => Ok(false),
        }
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError> {
        let source_ext = extension_of(input)
            .ok_or_else(|| BackendError::unsupported("input has no extension"))?;
        let target_ext = extension_of(output)
            .ok_or_else(|| BackendError::unsupported("output has no extension"))?;

        let mut source = input.to_path_buf();
        let mut reader = Self::reader(&source_ext).to_string();

        if let Some(password) = options.password.as_deref() {
            if source_ext == "pdf" {
                if self.pdf_requires_password(&source).await? {
                    source = self.decrypt_pdf(&source, password, &options.work_dir).await?;
                }
            } else if OOXML.contains(&source_ext.as_str()) && Self::is_cfb(&source).await? {
                source = self
                    .decrypt_office(&source, &source_ext, password, &options.work_dir)
                    .await?;
            }
        }

        if source_ext == "pdf" {
            source = self.extract_pdf_text(&source, &options.work_dir).await?;
            reader = "markdown".to_string();
        }

        let args = self.build_args(&source, &reader, output, &target_ext);
        debug!(reader = %reader, target = %target_ext, "Running pandoc");

        let result = run_tool("pandoc", &self.config.pandoc_path, &args).await?;
        if !result.success() && result.stderr.contains("password") {
            return Err(BackendError::PasswordRequired {
                path: input.to_path_buf(),
            });
        }
        result.require_success("pandoc")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn has(args: &[OsString], value: &str) -> bool {
        args.iter().any(|a| a == value)
    }

    #[test]
    fn test_reader_and_writer_names() {
        assert_eq!(PandocBackend::reader("txt"), "markdown");
        assert_eq!(PandocBackend::reader("docx"), "docx");
        assert_eq!(PandocBackend::writer("txt"), Some("plain"));
        assert_eq!(PandocBackend::writer("tex"), Some("latex"));
        assert_eq!(PandocBackend::writer("html"), Some("html"));
        assert_eq!(PandocBackend::writer("pdf"), None);
    }

    #[test]
    fn test_build_args_pdf_uses_engine() {
        let backend = PandocBackend::new(BackendConfig::default().with_pdf_engine("lualatex"));
        let args = backend.build_args(
            Path::new("/in/notes.md"),
            "markdown",
            Path::new("/out/notes.pdf"),
            "pdf",
        );
        assert!(has(&args, "--pdf-engine=lualatex"));
        assert!(!has(&args, "-t"));
        assert_eq!(args.last().unwrap(), "/in/notes.md");
    }

    #[test]
    fn test_build_args_text_target() {
        let backend = PandocBackend::with_defaults();
        let args = backend.build_args(
            Path::new("/in/report.docx"),
            "docx",
            Path::new("/out/report.txt"),
            "txt",
        );
        assert!(has(&args, "plain"));
        assert!(has(&args, "docx"));
        assert!(has(&args, "/out/report.txt"));
    }

    #[tokio::test]
    async fn test_office_encryption_detected_by_signature() {
        let dir = TempDir::new().unwrap();
        let encrypted = dir.path().join("secret.docx");
        let mut bytes = CFB_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 504]);
        std::fs::write(&encrypted, bytes).unwrap();

        let plain = dir.path().join("plain.docx");
        std::fs::write(&plain, b"PK\x03\x04rest-of-zip").unwrap();

        let tiny = dir.path().join("tiny.xlsx");
        std::fs::write(&tiny, b"PK").unwrap();

        let backend = PandocBackend::with_defaults();
        assert!(backend.requires_password(&encrypted).await.unwrap());
        assert!(!backend.requires_password(&plain).await.unwrap());
        assert!(!backend.requires_password(&tiny).await.unwrap());
    }

    #[tokio::test]
    async fn test_plain_formats_never_require_password() {
        let backend = PandocBackend::with_defaults();
        assert!(!backend
            .requires_password(Path::new("/does/not/matter.md"))
            .await
            .unwrap());
    }
}
