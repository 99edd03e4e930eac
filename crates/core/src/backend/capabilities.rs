//! External tool availability detection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::command::{arg, run_tool};
use super::config::BackendConfig;

/// Availability of one external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: PathBuf,
    pub available: bool,
    /// First line of the tool's version banner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Flag that makes each tool print a banner and exit.
fn version_flag(name: &str) -> &'static str {
    match name {
        "pandoc" | "qpdf" | "whisper" | "msoffcrypto-tool" => "--version",
        "7z" => "i",
        "pdftotext" => "-v",
        _ => "-version",
    }
}

/// Probes every configured tool.
///
/// A tool that starts counts as available even if it exits non-zero for the
/// version flag.
pub async fn detect_tools(config: &BackendConfig) -> Vec<ToolStatus> {
    let mut statuses = Vec::new();

    for (name, path) in config.tools() {
        let status = match run_tool(name, path, &[arg(version_flag(name))]).await {
            Ok(output) => ToolStatus {
                name: name.to_string(),
                path: path.clone(),
                available: true,
                version: Some(output.first_line()).filter(|v| !v.is_empty()),
            },
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "Tool unavailable");
                ToolStatus {
                    name: name.to_string(),
                    path: path.clone(),
                    available: false,
                    version: None,
                }
            }
        };
        statuses.push(status);
    }

    statuses
}
