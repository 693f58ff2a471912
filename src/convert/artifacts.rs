// src/convert/artifacts.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::PreviewError;

const RUN_PREFIX: &str = "epsview-";

/// Temporary files belonging to a single conversion run.
///
/// Every run gets its own uniquely named directory, so overlapping runs never
/// share or clean up each other's files. Paths handed out by [`acquire`] are
/// not created here; the tools create them. Everything acquired is removed
/// when the value is dropped, whichever step failed.
///
/// [`acquire`]: RunArtifacts::acquire
#[derive(Debug)]
pub struct RunArtifacts {
    dir: TempDir,
    acquired: Vec<PathBuf>,
}

impl RunArtifacts {
    /// Create the run directory under `base`, or the system temp dir.
    pub async fn create(base: Option<&Path>) -> Result<Self, PreviewError> {
        let base = base.map(Path::to_path_buf);
        let dir = tokio::task::spawn_blocking(move || make_run_dir(base.as_deref()))
            .await
            .map_err(|e| PreviewError::TempFile(std::io::Error::other(e)))?
            .map_err(PreviewError::TempFile)?;

        Ok(RunArtifacts { dir, acquired: Vec::new() })
    }

    pub fn acquire(&mut self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        self.acquired.push(path.clone());
        path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.acquired
    }
}

fn make_run_dir(base: Option<&Path>) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(RUN_PREFIX);
    match base {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            builder.tempdir_in(base)
        }
        None => builder.tempdir(),
    }
}

// Removal stays synchronous: a run is only over once its files are gone.
impl Drop for RunArtifacts {
    fn drop(&mut self) {
        for path in &self.acquired {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::trace!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        // `dir` is removed when the TempDir field drops.
    }
}
