// src/convert/mod.rs
//! EPS → PDF → SVG through `ps2pdf` and `pdf2svg`.

pub mod artifacts;
pub mod tool;

pub use artifacts::RunArtifacts;
pub use tool::ExternalTool;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::PreviewError;
use crate::preview::{compose_html, display_name, Panel};

/// ps2pdf flag that crops the page to the EPS bounding box.
pub const EPS_CROP_FLAG: &str = "-dEPSCrop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Size of the svg markup placed in the panel.
    pub bytes: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Converter {
    ps2pdf: ExternalTool,
    pdf2svg: ExternalTool,
    timeout: Option<Duration>,
    temp_dir: Option<PathBuf>,
}

impl Converter {
    pub fn new(ps2pdf: ExternalTool, pdf2svg: ExternalTool) -> Self {
        Converter { ps2pdf, pdf2svg, timeout: None, temp_dir: None }
    }

    pub fn from_config(config: &Config) -> Self {
        Converter {
            ps2pdf: ExternalTool::ps2pdf(config.path.ps2pdf.clone()),
            pdf2svg: ExternalTool::pdf2svg(config.path.pdf2svg.clone()),
            timeout: config.timeout(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Convert raw EPS bytes to SVG markup.
    ///
    /// Both tools are resolved before anything touches the disk, so a missing
    /// tool leaves no temporary files behind. The run's artifacts are released
    /// on every return path.
    pub async fn convert(&self, eps: &[u8]) -> Result<Vec<u8>, PreviewError> {
        let ps2pdf = self.ps2pdf.resolve()?;
        let pdf2svg = self.pdf2svg.resolve()?;

        let mut artifacts = RunArtifacts::create(self.temp_dir.as_deref()).await?;
        let pdf = artifacts.acquire("input.pdf");
        let svg = artifacts.acquire("output.svg");

        self.ps2pdf
            .run(
                &ps2pdf,
                &[OsStr::new(EPS_CROP_FLAG), OsStr::new("-"), pdf.as_os_str()],
                Some(eps),
                self.timeout,
            )
            .await?;

        self.pdf2svg
            .run(&pdf2svg, &[pdf.as_os_str(), svg.as_os_str()], None, self.timeout)
            .await?;

        let markup = tokio::fs::read(&svg)
            .await
            .map_err(|source| PreviewError::ReadOutput { path: svg.clone(), source })?;
        if markup.is_empty() {
            return Err(PreviewError::EmptyOutput);
        }
        Ok(markup)
    }

    /// Read `source`, convert it and show the result in `panel`.
    ///
    /// The panel is only touched once the svg has been read in full; on any
    /// error it keeps whatever it showed before.
    pub async fn render(
        &self,
        source: &Path,
        panel: &mut dyn Panel,
    ) -> Result<RenderOutcome, PreviewError> {
        let started = Instant::now();
        let eps = tokio::fs::read(source)
            .await
            .map_err(|e| PreviewError::ReadSource { path: source.to_path_buf(), source: e })?;

        let markup = self.convert(&eps).await?;
        panel.set_html(&compose_html(&display_name(source), &markup)).await?;

        Ok(RenderOutcome { bytes: markup.len(), elapsed: started.elapsed() })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::preview::MemoryPanel;
    use crate::test_support::{FakeTools, SAMPLE_EPS};

    #[tokio::test]
    async fn test_render_places_heading_and_svg_in_panel() {
        let tools = FakeTools::working();
        let source = tools.write_source("sample.eps", SAMPLE_EPS);
        let mut panel = MemoryPanel::new("Preview sample.eps");

        let outcome = tools.converter().render(&source, &mut panel).await.unwrap();

        let expected_svg = tools.expected_svg(SAMPLE_EPS);
        let html = panel.html().unwrap();
        assert!(html.starts_with("<h1>sample.eps</h1>"));
        assert_eq!(html, format!("<h1>sample.eps</h1>{}", expected_svg));
        assert_eq!(outcome.bytes, expected_svg.len());
        assert_eq!(tools.temp_entries(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_source_spawns_nothing() {
        let tools = FakeTools::working();
        let mut panel = MemoryPanel::new("Preview missing.eps");

        let err = tools
            .converter()
            .render(&tools.root().join("missing.eps"), &mut panel)
            .await
            .unwrap_err();

        assert!(matches!(err, PreviewError::ReadSource { .. }));
        assert_eq!(tools.ps2pdf_calls(), 0);
        assert_eq!(tools.pdf2svg_calls(), 0);
        assert_eq!(panel.set_count(), 0);
    }

    #[tokio::test]
    async fn test_ps2pdf_failure_skips_pdf2svg_and_cleans_up() {
        let tools = FakeTools::failing_ps2pdf();
        let source = tools.write_source("broken.eps", b"not postscript");
        let mut panel = MemoryPanel::new("Preview broken.eps");

        let err = tools.converter().render(&source, &mut panel).await.unwrap_err();

        assert_eq!(err.tool(), Some("ps2pdf"));
        assert_eq!(tools.ps2pdf_calls(), 1);
        assert_eq!(tools.pdf2svg_calls(), 0);
        assert_eq!(tools.temp_entries(), 0);
        assert!(panel.html().is_none());
    }

    #[tokio::test]
    async fn test_pdf2svg_failure_leaves_panel_and_disk_unchanged() {
        let tools = FakeTools::failing_pdf2svg();
        let source = tools.write_source("sample.eps", SAMPLE_EPS);
        let mut panel = MemoryPanel::new("Preview sample.eps");
        panel.set_html("<h1>sample.eps</h1><svg>old</svg>").await.unwrap();

        let err = tools.converter().render(&source, &mut panel).await.unwrap_err();

        assert_eq!(err.tool(), Some("pdf2svg"));
        assert_eq!(panel.html().as_deref(), Some("<h1>sample.eps</h1><svg>old</svg>"));
        assert_eq!(tools.temp_entries(), 0);
    }

    #[tokio::test]
    async fn test_missing_tool_creates_no_temp_files() {
        let tools = FakeTools::working();
        let source = tools.write_source("sample.eps", SAMPLE_EPS);
        let converter = Converter::new(
            ExternalTool::ps2pdf(tools.ps2pdf_path().to_string_lossy()),
            ExternalTool::pdf2svg("/no/such/dir/pdf2svg"),
        )
        .with_temp_dir(tools.temp_dir());
        let mut panel = MemoryPanel::new("Preview sample.eps");

        let err = converter.render(&source, &mut panel).await.unwrap_err();

        assert!(err.user_message().unwrap().contains("pdf2svg"));
        assert_eq!(tools.ps2pdf_calls(), 0);
        assert_eq!(tools.temp_entries(), 0);
    }

    #[tokio::test]
    async fn test_silent_pdf2svg_is_an_output_error() {
        let tools = FakeTools::silent_pdf2svg();
        let source = tools.write_source("sample.eps", SAMPLE_EPS);
        let mut panel = MemoryPanel::new("Preview sample.eps");

        let err = tools.converter().render(&source, &mut panel).await.unwrap_err();

        assert!(matches!(err, PreviewError::ReadOutput { .. }));
        assert!(err.user_message().is_none());
        assert!(panel.html().is_none());
        assert_eq!(tools.temp_entries(), 0);
    }
}
