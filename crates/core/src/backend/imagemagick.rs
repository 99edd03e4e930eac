//! ImageMagick-based image backend.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

use crate::format::{extension_of, BackendId};

use super::command::{arg, run_tool};
use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::{Backend, TransformOptions};

const JPEG_QUALITY: &str = "85";

/// Formats that hold a single frame; animated input is flattened to its first frame.
const SINGLE_FRAME: &[&str] = &["jpg", "png", "bmp"];

/// Re-encodes images with `magick`, and renders images to PDF.
pub struct ImageMagickBackend {
    config: BackendConfig,
}

impl ImageMagickBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BackendConfig::default())
    }

    fn build_args(input: &Path, output: &Path, source_ext: &str, target_ext: &str) -> Vec<OsString> {
        let mut source = input.as_os_str().to_os_string();
        if source_ext == "gif" && SINGLE_FRAME.contains(&target_ext) {
            source.push("[0]");
        }

        let mut args = vec![source, arg("-auto-orient")];

        match target_ext {
            "jpg" => {
                // No alpha channel in JPEG: flatten onto white, force RGB.
                args.extend([
                    arg("-background"),
                    arg("white"),
                    arg("-alpha"),
                    arg("remove"),
                    arg("-colorspace"),
                    arg("sRGB"),
                    arg("-quality"),
                    arg(JPEG_QUALITY),
                ]);
            }
            "pdf" => {
                args.extend([
                    arg("-background"),
                    arg("white"),
                    arg("-alpha"),
                    arg("remove"),
                    arg("-colorspace"),
                    arg("sRGB"),
                    arg("-density"),
                    arg("100"),
                ]);
            }
            _ => args.push(arg("-strip")),
        }

        args.push(arg(output));
        args
    }
}

#[async_trait]
impl Backend for ImageMagickBackend {
    fn id(&self) -> BackendId {
        BackendId::ImageMagick
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        _options: &TransformOptions,
    ) -> Result<(), BackendError> {
        let source_ext = extension_of(input).unwrap_or_default();
        let target_ext = extension_of(output)
            .ok_or_else(|| BackendError::unsupported("output has no extension"))?;
        let target_ext = match target_ext.as_str() {
            "jpeg" => "jpg".to_string(),
            "tif" => "tiff".to_string(),
            _ => target_ext,
        };

        let args = Self::build_args(input, output, &source_ext, &target_ext);
        run_tool("magick", &self.config.magick_path, &args)
            .await?
            .require_success("magick")?;
        Ok(())
    }
}
