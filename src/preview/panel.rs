// src/preview/panel.rs
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{display_name, panel_title};
use crate::error::PreviewError;

/// A surface that displays the rendered preview.
#[async_trait]
pub trait Panel: Send {
    fn title(&self) -> &str;

    /// Replace the displayed content.
    async fn set_html(&mut self, html: &str) -> Result<(), PreviewError>;

    /// Currently displayed content, `None` before the first successful render.
    fn html(&self) -> Option<String>;

    /// File backing the panel, if any.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Writes each preview to an html file.
///
/// Next to the source the file is `<name>.html`. In a shared `out_dir` it is
/// `<name>.<tag>.html`, where the tag is derived from the source's directory,
/// so same-named sources from different directories never share a file.
pub struct HtmlFilePanel {
    title: String,
    path: PathBuf,
    current: Option<String>,
}

impl HtmlFilePanel {
    /// `out_dir` defaults to the directory holding `source`.
    pub fn new(source: &Path, out_dir: Option<&Path>) -> Self {
        let name = display_name(source);
        let path = match out_dir {
            Some(dir) => dir.join(format!("{}.{}.html", name, directory_tag(source))),
            None => source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .join(format!("{}.html", name)),
        };
        HtmlFilePanel { title: panel_title(source), path, current: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Short hex tag identifying the directory that holds `source`.
fn directory_tag(source: &Path) -> String {
    let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    let mut hasher = DefaultHasher::new();
    absolute.parent().unwrap_or(&absolute).hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

fn write_atomically(path: &Path, html: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    // Same directory, so the final rename never crosses file systems.
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(html)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl Panel for HtmlFilePanel {
    fn title(&self) -> &str {
        &self.title
    }

    async fn set_html(&mut self, html: &str) -> Result<(), PreviewError> {
        let path = self.path.clone();
        let contents = html.to_string();
        tokio::task::spawn_blocking(move || write_atomically(&path, contents.as_bytes()))
            .await
            .map_err(|e| PreviewError::Panel(std::io::Error::other(e)))?
            .map_err(PreviewError::Panel)?;
        tracing::debug!("Wrote {}", self.path.display());
        self.current = Some(html.to_string());
        Ok(())
    }

    fn html(&self) -> Option<String> {
        self.current.clone()
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    html: Option<String>,
    sets: usize,
}

/// In-memory panel. Clones share the same content.
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    title: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPanel {
    pub fn new(title: impl Into<String>) -> Self {
        MemoryPanel { title: title.into(), state: Arc::new(Mutex::new(MemoryState::default())) }
    }

    /// Number of times the content was replaced.
    pub fn set_count(&self) -> usize {
        self.state.lock().map(|s| s.sets).unwrap_or(0)
    }
}

#[async_trait]
impl Panel for MemoryPanel {
    fn title(&self) -> &str {
        &self.title
    }

    async fn set_html(&mut self, html: &str) -> Result<(), PreviewError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.html = Some(html.to_string());
        state.sets += 1;
        Ok(())
    }

    fn html(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.html.clone())
    }
}

/// Which kind of panel a new session gets.
#[derive(Debug, Clone)]
pub enum PanelTarget {
    /// Html files, next to the source or under `out_dir`.
    File { out_dir: Option<PathBuf> },
    Memory,
}

impl PanelTarget {
    pub fn create(&self, source: &Path) -> Box<dyn Panel> {
        match self {
            PanelTarget::File { out_dir } => Box::new(HtmlFilePanel::new(source, out_dir.as_deref())),
            PanelTarget::Memory => Box::new(MemoryPanel::new(panel_title(source))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_panel_defaults_next_to_source() {
        let panel = HtmlFilePanel::new(Path::new("/work/figs/plot.eps"), None);
        assert_eq!(panel.path(), Path::new("/work/figs/plot.eps.html"));
        assert_eq!(panel.title(), "Preview plot.eps");

        let bare = HtmlFilePanel::new(Path::new("plot.eps"), None);
        assert_eq!(bare.path(), Path::new("./plot.eps.html"));
    }

    #[tokio::test]
    async fn test_file_panel_writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut panel = HtmlFilePanel::new(Path::new("a.eps"), Some(&out));
        assert!(panel.html().is_none());

        panel.set_html("<h1>a.eps</h1><svg>1</svg>").await.unwrap();
        panel.set_html("<h1>a.eps</h1><svg>2</svg>").await.unwrap();

        let written = std::fs::read_to_string(panel.path()).unwrap();
        assert_eq!(written, "<h1>a.eps</h1><svg>2</svg>");
        assert_eq!(panel.html().as_deref(), Some("<h1>a.eps</h1><svg>2</svg>"));
        // No staging files left behind.
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_out_dir_names_differ_per_source_directory() {
        let out = Path::new("/tmp/previews");
        let x = HtmlFilePanel::new(Path::new("/work/x/plot.eps"), Some(out));
        let y = HtmlFilePanel::new(Path::new("/work/y/plot.eps"), Some(out));
        let x_again = HtmlFilePanel::new(Path::new("/work/x/plot.eps"), Some(out));

        assert_ne!(x.path(), y.path());
        assert_eq!(x.path(), x_again.path());
        assert_eq!(x.path().parent(), Some(out));
        let name = x.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("plot.eps."));
        assert!(name.ends_with(".html"));
    }

    #[tokio::test]
    async fn test_memory_panel_clones_share_content() {
        let panel = MemoryPanel::new("Preview a.eps");
        let mut writer: Box<dyn Panel> = Box::new(panel.clone());
        writer.set_html("<h1>a.eps</h1>").await.unwrap();

        assert_eq!(panel.html().as_deref(), Some("<h1>a.eps</h1>"));
        assert_eq!(panel.set_count(), 1);
    }

    #[test]
    fn test_panel_target_titles() {
        let panel = PanelTarget::Memory.create(Path::new("x/y.eps"));
        assert_eq!(panel.title(), "Preview y.eps");
        assert!(panel.location().is_none());

        let file = PanelTarget::File { out_dir: None }.create(Path::new("x/y.eps"));
        assert_eq!(file.location(), Some(Path::new("x/y.eps.html")));
    }
}
