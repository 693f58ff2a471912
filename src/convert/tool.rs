// src/convert/tool.rs
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::PreviewError;

/// One of the two external converters.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: &'static str,
    program: String,
}

impl ExternalTool {
    pub fn ps2pdf(program: impl Into<String>) -> Self {
        ExternalTool { name: "ps2pdf", program: program.into() }
    }

    pub fn pdf2svg(program: impl Into<String>) -> Self {
        ExternalTool { name: "pdf2svg", program: program.into() }
    }

    /// Locate the configured program, either as a path or on `PATH`.
    pub fn resolve(&self) -> Result<PathBuf, PreviewError> {
        which::which(&self.program).map_err(|e| {
            tracing::debug!("{} lookup for `{}` failed: {}", self.name, self.program, e);
            self.not_found()
        })
    }

    /// Run `exe` to completion, feeding `stdin` if given. Non-zero exit is an error.
    pub async fn run(
        &self,
        exe: &Path,
        args: &[&OsStr],
        stdin: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<(), PreviewError> {
        let mut cmd = Command::new(exe);
        cmd.args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running {} {:?}", exe.display(), args);

        let mut child = cmd.spawn().map_err(|source| match source.kind() {
            ErrorKind::NotFound => self.not_found(),
            _ => PreviewError::ToolSpawn { tool: self.name, source },
        })?;

        let pipe = child.stdin.take();
        let name = self.name;
        let completion = async move {
            let feed = async move {
                if let (Some(mut pipe), Some(input)) = (pipe, stdin) {
                    // The tool may exit before draining stdin; its exit status decides.
                    if let Err(e) = pipe.write_all(input).await {
                        tracing::debug!("Writing stdin of {} failed: {}", name, e);
                    }
                }
            };
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, completion)
                .await
                .map_err(|_| PreviewError::ToolTimedOut { tool: self.name, timeout: limit })?,
            None => completion.await,
        }
        .map_err(|source| PreviewError::ToolSpawn { tool: self.name, source })?;

        if !output.status.success() {
            return Err(PreviewError::ToolFailed {
                tool: self.name,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn not_found(&self) -> PreviewError {
        PreviewError::ToolNotFound { tool: self.name, program: self.program.clone() }
    }
}
