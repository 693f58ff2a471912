// src/commands.rs
//! User-invoked entry points.

use std::path::{Path, PathBuf};

use crate::convert::{Converter, RenderOutcome};
use crate::error::PreviewError;
use crate::preview::PanelTarget;
use crate::session::SessionRegistry;

/// Start previewing the active document.
///
/// Creates a panel, renders once and keeps watching the file. With no active
/// document nothing happens. Returns the session key.
pub async fn open_preview(
    active: Option<&Path>,
    target: &PanelTarget,
    registry: &mut SessionRegistry,
) -> Option<PathBuf> {
    let Some(source) = active else {
        tracing::info!("No active document. Do nothing.");
        return None;
    };

    let panel = target.create(source);
    tracing::debug!("Opening {} for {}", panel.title(), source.display());
    Some(registry.open(source, panel).await)
}

#[derive(Debug)]
pub struct RenderReport {
    pub source: PathBuf,
    pub location: Option<PathBuf>,
    pub result: Result<RenderOutcome, PreviewError>,
}

/// Render each file once, without watching.
///
/// Failures are only logged at debug level here; the caller presents the
/// returned reports.
pub async fn render_files(
    files: &[PathBuf],
    converter: &Converter,
    target: &PanelTarget,
) -> Vec<RenderReport> {
    let mut reports = Vec::with_capacity(files.len());
    for source in files {
        let mut panel = target.create(source);
        let result = converter.render(source, panel.as_mut()).await;
        if let Err(ref err) = result {
            tracing::debug!("Preview of {} failed: {}", source.display(), err);
        }
        reports.push(RenderReport {
            source: source.clone(),
            location: panel.location().map(Path::to_path_buf),
            result,
        });
    }
    reports
}
