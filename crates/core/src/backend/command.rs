//! Shared process runner for external tools.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

use super::error::BackendError;

static BAD_PASSWORD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(wrong|invalid|incorrect|bad)\s+password|password\s+(is\s+)?(incorrect|invalid)")
        .ok()
});

/// Captured result of one tool run.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// First non-empty line of stdout, falling back to stderr.
    pub fn first_line(&self) -> String {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Whether stderr reports a rejected password.
    pub fn reports_bad_password(&self) -> bool {
        reports_bad_password(&self.stderr)
    }

    /// Turns a non-zero exit into `BackendError::Failed`.
    pub fn require_success(self, tool: &str) -> Result<Self, BackendError> {
        if self.success() {
            return Ok(self);
        }
        Err(BackendError::failed(
            format!("{} exited with code: {:?}", tool, self.code()),
            (!self.stderr.trim().is_empty()).then_some(self.stderr),
        ))
    }
}

pub(crate) fn reports_bad_password(text: &str) -> bool {
    (*BAD_PASSWORD).as_ref().is_some_and(|re| re.is_match(text))
}

pub(crate) fn arg(value: impl AsRef<OsStr>) -> OsString {
    value.as_ref().to_os_string()
}

/// Runs `program` to completion with no stdin.
///
/// The child is killed if the returned future is dropped, so an outer
/// timeout terminates the tool as well.
pub(crate) async fn run_tool(
    tool: &str,
    program: &Path,
    args: &[OsString],
) -> Result<ToolOutput, BackendError> {
    debug!(tool = %tool, program = %program.display(), args = ?args, "Running tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::ToolNotFound {
                    tool: tool.to_string(),
                    path: program.to_path_buf(),
                }
            } else {
                BackendError::Io(e)
            }
        })?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
