// src/preview/mod.rs
use std::path::Path;

pub mod eps;
pub mod notice;
pub mod panel;

pub use eps::is_eps;
pub use notice::{report_failure, ChannelNotifier, ConsoleNotifier, Notifier};
pub use panel::{HtmlFilePanel, MemoryPanel, Panel, PanelTarget};

/// Base name shown in the preview heading.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn panel_title(path: &Path) -> String {
    format!("Preview {}", display_name(path))
}

/// `<h1>{name}</h1>` followed by the svg markup exactly as the converter wrote it.
pub fn compose_html(name: &str, svg: &[u8]) -> String {
    let markup = String::from_utf8_lossy(svg);
    let mut html = String::with_capacity(name.len() + markup.len() + 9);
    html.push_str("<h1>");
    html.push_str(name);
    html.push_str("</h1>");
    html.push_str(&markup);
    html
}
