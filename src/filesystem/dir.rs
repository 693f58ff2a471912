// src/filesystem/dir.rs
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::preview::is_eps;

/// EPS files under `path`, sorted by name. Hidden entries are skipped.
pub fn collect_eps(path: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let walker = WalkDir::new(path)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_eps(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!("Skipping entry under {}: {}", path.display(), e),
        }
    }

    found.sort_by(|a, b| {
        a.to_string_lossy().to_lowercase().cmp(&b.to_string_lossy().to_lowercase())
    });
    found
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
