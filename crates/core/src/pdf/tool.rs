//! The PDF page tool seam and its qpdf implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::backend::{arg, run_tool, BackendConfig};

use super::error::PdfError;
use super::ranges::PageRange;

/// Page-level PDF operations.
#[async_trait]
pub trait PdfTool: Send + Sync {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError>;

    /// Concatenates `inputs` in order into `output`.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), PdfError>;

    /// Writes the pages in `range` of `input` to `output`.
    async fn extract(&self, input: &Path, range: PageRange, output: &Path)
        -> Result<(), PdfError>;
}

/// [`PdfTool`] backed by the `qpdf` command.
pub struct QpdfTool {
    qpdf_path: PathBuf,
}

impl QpdfTool {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            qpdf_path: config.qpdf_path.clone(),
        }
    }

    fn build_merge_args(inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args = vec![arg("--empty"), arg("--pages")];
        args.extend(inputs.iter().map(arg));
        args.extend([arg("--"), arg(output)]);
        args
    }

    fn build_extract_args(input: &Path, range: PageRange, output: &Path) -> Vec<OsString> {
        vec![
            arg(input),
            arg("--pages"),
            arg("."),
            arg(range.to_string()),
            arg("--"),
            arg(output),
        ]
    }

    /// qpdf exits 3 when it succeeded with warnings.
    fn check(output: crate::backend::ToolOutput) -> Result<(), PdfError> {
        if output.code() == Some(3) {
            return Ok(());
        }
        output.require_success("qpdf")?;
        Ok(())
    }
}

#[async_trait]
impl PdfTool for QpdfTool {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError> {
        let output = run_tool("qpdf", &self.qpdf_path, &[arg("--show-npages"), arg(pdf)])
            .await?
            .require_success("qpdf")?;
        let text = output.stdout.trim();
        text.parse().map_err(|_| PdfError::BadPageCount {
            output: text.to_string(),
        })
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), PdfError> {
        let result = run_tool(
            "qpdf",
            &self.qpdf_path,
            &Self::build_merge_args(inputs, output),
        )
        .await?;
        Self::check(result)
    }

    async fn extract(
        &self,
        input: &Path,
        range: PageRange,
        output: &Path,
    ) -> Result<(), PdfError> {
        let result = run_tool(
            "qpdf",
            &self.qpdf_path,
            &Self::build_extract_args(input, range, output),
        )
        .await?;
        Self::check(result)
    }
}
