//! 7-Zip-based archive backend.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

use crate::format::{extension_of, BackendId};

use super::command::{arg, run_tool};
use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::{Backend, TransformOptions};

/// Passed when the caller has no password, so 7z fails instead of prompting.
const NO_PASSWORD: &str = "-pswissknife-no-password";

/// Repacks archives by extracting into the work directory and compressing
/// the extracted tree into the target type.
pub struct SevenZipBackend {
    config: BackendConfig,
}

impl SevenZipBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BackendConfig::default())
    }

    fn password_arg(password: Option<&str>) -> OsString {
        match password {
            Some(p) => arg(format!("-p{}", p)),
            None => arg(NO_PASSWORD),
        }
    }

    /// 7z `-t` switch value for a canonical archive extension.
    fn archive_type(ext: &str) -> Option<&'static str> {
        match ext {
            "zip" => Some("zip"),
            "7z" => Some("7z"),
            "tar" => Some("tar"),
            "gz" => Some("gzip"),
            "bz2" => Some("bzip2"),
            _ => None,
        }
    }

    /// gzip and bzip2 hold a single stream; the tree is tarred first.
    fn is_single_stream(ext: &str) -> bool {
        matches!(ext, "gz" | "bz2")
    }

    fn build_list_args(input: &Path) -> Vec<OsString> {
        vec![arg("l"), arg("-slt"), Self::password_arg(None), arg(input)]
    }

    fn build_extract_args(input: &Path, dest: &Path, password: Option<&str>) -> Vec<OsString> {
        let mut out = OsString::from("-o");
        out.push(dest);
        vec![
            arg("x"),
            arg("-y"),
            out,
            Self::password_arg(password),
            arg(input),
        ]
    }

    fn build_add_args(archive_type: &str, output: &Path, contents: &Path) -> Vec<OsString> {
        vec![
            arg("a"),
            arg(format!("-t{}", archive_type)),
            arg("-y"),
            arg(output),
            arg(contents),
        ]
    }

    /// Whether `7z l -slt` output lists an encrypted entry.
    fn listing_shows_encryption(listing: &str) -> bool {
        listing
            .lines()
            .any(|l| l.trim().replace(' ', "") == "Encrypted=+")
    }

    async fn run_7z(&self, args: &[OsString]) -> Result<super::command::ToolOutput, BackendError> {
        run_tool("7z", &self.config.sevenzip_path, args).await
    }
}

#[async_trait]
impl Backend for SevenZipBackend {
    fn id(&self) -> BackendId {
        BackendId::SevenZip
    }

    async fn requires_password(&self, input: &Path) -> Result<bool, BackendError> {
        let output = self.run_7z(&Self::build_list_args(input)).await?;

        // Archives with encrypted headers cannot even be listed.
        if output.reports_bad_password() || output.stderr.contains("encrypted archive") {
            return Ok(true);
        }
        let output = output.require_success("7z")?;
        Ok(Self::listing_shows_encryption(&output.stdout))
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError> {
        let target_ext = extension_of(output)
            .ok_or_else(|| BackendError::unsupported("output has no extension"))?;
        let archive_type = Self::archive_type(&target_ext).ok_or_else(|| {
            BackendError::unsupported(format!("7z cannot create .{} archives", target_ext))
        })?;

        let extracted = options.work_dir.join("extracted");
        tokio::fs::create_dir_all(&extracted).await?;

        let result = self
            .run_7z(&Self::build_extract_args(
                input,
                &extracted,
                options.password.as_deref(),
            ))
            .await?;
        if !result.success() && result.reports_bad_password() {
            return Err(match options.password {
                Some(_) => BackendError::InvalidPassword {
                    path: input.to_path_buf(),
                },
                None => BackendError::PasswordRequired {
                    path: input.to_path_buf(),
                },
            });
        }
        result.require_success("7z")?;

        // 7z expands the wildcard itself, so the archive holds the tree's contents.
        let contents = extracted.join("*");

        if Self::is_single_stream(&target_ext) {
            let bundle = options.work_dir.join("bundle.tar");
            self.run_7z(&Self::build_add_args("tar", &bundle, &contents))
                .await?
                .require_success("7z")?;
            self.run_7z(&Self::build_add_args(archive_type, output, &bundle))
                .await?
                .require_success("7z")?;
        } else {
            self.run_7z(&Self::build_add_args(archive_type, output, &contents))
                .await?
                .require_success("7z")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(args: &[OsString], value: &str) -> bool {
        args.iter().any(|a| a == value)
    }

    #[test]
    fn test_archive_types() {
        assert_eq!(SevenZipBackend::archive_type("gz"), Some("gzip"));
        assert_eq!(SevenZipBackend::archive_type("bz2"), Some("bzip2"));
        assert_eq!(SevenZipBackend::archive_type("7z"), Some("7z"));
        assert_eq!(SevenZipBackend::archive_type("rar"), None);
        assert!(SevenZipBackend::is_single_stream("gz"));
        assert!(!SevenZipBackend::is_single_stream("zip"));
    }

    #[test]
    fn test_extract_args_with_password() {
        let args = SevenZipBackend::build_extract_args(
            Path::new("/in/a.zip"),
            Path::new("/work/extracted"),
            Some("s3cret"),
        );
        assert!(has(&args, "x"));
        assert!(has(&args, "-o/work/extracted"));
        assert!(has(&args, "-ps3cret"));
        assert_eq!(args.last().unwrap(), "/in/a.zip");
    }

    #[test]
    fn test_extract_args_without_password_never_prompts() {
        let args = SevenZipBackend::build_extract_args(
            Path::new("/in/a.7z"),
            Path::new("/work/x"),
            None,
        );
        assert!(has(&args, NO_PASSWORD));
    }

    #[test]
    fn test_add_args() {
        let args = SevenZipBackend::build_add_args(
            "zip",
            Path::new("/out/b.zip"),
            Path::new("/work/extracted/*"),
        );
        assert_eq!(args[0], "a");
        assert!(has(&args, "-tzip"));
        assert!(has(&args, "/work/extracted/*"));
    }

    #[test]
    fn test_listing_encryption_detection() {
        let listing = "\
Path = a.zip
Type = zip

----------
Path = secret.txt
Size = 12
Encrypted = +
Method = ZipCrypto Deflate
";
        assert!(SevenZipBackend::listing_shows_encryption(listing));

        let plain = "Path = readme.txt\nEncrypted = -\n";
        assert!(!SevenZipBackend::listing_shows_encryption(plain));
    }
}
