// src/error.rs
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// How a failed run is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Source could not be read. Reported to the user, nothing spawned.
    Input,
    /// A converter is missing, failed or hung. Reported to the user naming the tool.
    Tool,
    /// Tools succeeded but the result could not be used. Logged only.
    Output,
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to read {}: {source}", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} not found (configured as `{program}`)")]
    ToolNotFound { tool: &'static str, program: String },

    #[error("failed to run {tool}: {source}")]
    ToolSpawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}{}", stderr_suffix(.stderr))]
    ToolFailed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} did not finish within {}s", .timeout.as_secs())]
    ToolTimedOut { tool: &'static str, timeout: Duration },

    #[error("failed to create temporary files: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("failed to read converted svg {}: {source}", .path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pdf2svg produced an empty svg")]
    EmptyOutput,

    #[error("failed to update preview panel: {0}")]
    Panel(#[source] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl PreviewError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PreviewError::ReadSource { .. } => ErrorCategory::Input,
            PreviewError::ToolNotFound { .. }
            | PreviewError::ToolSpawn { .. }
            | PreviewError::ToolFailed { .. }
            | PreviewError::ToolTimedOut { .. } => ErrorCategory::Tool,
            PreviewError::TempFile(_)
            | PreviewError::ReadOutput { .. }
            | PreviewError::EmptyOutput
            | PreviewError::Panel(_) => ErrorCategory::Output,
        }
    }

    /// The tool this error is attributed to, if any.
    pub fn tool(&self) -> Option<&'static str> {
        match self {
            PreviewError::ToolNotFound { tool, .. }
            | PreviewError::ToolSpawn { tool, .. }
            | PreviewError::ToolFailed { tool, .. }
            | PreviewError::ToolTimedOut { tool, .. } => Some(*tool),
            _ => None,
        }
    }

    /// Text shown to the user. `None` means the failure is only logged.
    pub fn user_message(&self) -> Option<String> {
        match self {
            PreviewError::ReadSource { .. } => Some("Failed to read eps file".to_string()),
            PreviewError::ToolTimedOut { tool, timeout } => Some(format!(
                "{tool} did not finish within {}s",
                timeout.as_secs()
            )),
            PreviewError::ToolNotFound { tool, .. }
            | PreviewError::ToolSpawn { tool, .. }
            | PreviewError::ToolFailed { tool, .. } => {
                Some(format!("Failed to execute {tool}, is that installed?"))
            }
            _ => None,
        }
    }
}
