// src/session/watcher.rs
//! Change notifications for a single previewed file.
//!
//! The parent directory is watched rather than the file itself: many editors
//! save by writing a new file and renaming it over the old one, which would
//! silently end a watch placed on the original inode.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc::UnboundedSender;

use super::ChangeEvent;

pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    path: PathBuf,
}

impl FileWatcher {
    /// Start watching `path`. Each debounced batch touching it sends one
    /// [`ChangeEvent::Modified`]. Dropping the watcher stops it.
    pub fn new(
        path: &Path,
        debounce: Duration,
        tx: UnboundedSender<ChangeEvent>,
    ) -> Result<Self, notify::Error> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let file_name: OsString = path.file_name().map(OsStr::to_os_string).unwrap_or_default();

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events.iter().any(|event| {
                        !matches!(event.kind, DebouncedEventKind::AnyContinuous)
                            && is_source_event(&event.path, &file_name)
                    });
                    if touched {
                        let _ = tx.send(ChangeEvent::Modified);
                    }
                }
                Err(e) => tracing::warn!("File watcher error: {:?}", e),
            }
        })?;

        debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::debug!("Watching {} for changes to {}", dir.display(), path.display());

        Ok(FileWatcher { _debouncer: debouncer, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Only the directory of the source is watched, so the file name decides.
fn is_source_event(event_path: &Path, file_name: &OsStr) -> bool {
    !file_name.is_empty() && event_path.file_name() == Some(file_name)
}
