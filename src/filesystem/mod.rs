// src/filesystem/mod.rs
pub mod dir;

pub use dir::collect_eps;

use std::collections::HashSet;
use std::path::PathBuf;

/// Turn command-line inputs into the list of files to preview.
///
/// - existing directories contribute the EPS files inside them
/// - anything with glob metacharacters is expanded as a pattern
/// - everything else is taken as a file path, even if it does not exist yet
///
/// Order is preserved and duplicates are dropped.
pub fn expand_inputs(inputs: &[String], recursive: bool) -> Result<Vec<PathBuf>, glob::PatternError> {
    let mut files = Vec::new();

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_dir() {
            files.extend(collect_eps(&path, recursive));
        } else if !path.exists() && is_pattern(input) {
            let mut matched = 0;
            for entry in glob::glob(input)? {
                match entry {
                    Ok(found) if found.is_file() => {
                        files.push(found);
                        matched += 1;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping {}: {}", e.path().display(), e.error()),
                }
            }
            if matched == 0 {
                tracing::warn!("Pattern {} matched no files", input);
            }
        } else {
            files.push(path);
        }
    }

    let mut seen = HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
