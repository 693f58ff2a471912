// src/config/paths.rs
//! Where epsview keeps its files.
//!
//! - Linux: `$XDG_CONFIG_HOME/epsview/` (usually `~/.config/epsview/`)
//! - macOS: `~/Library/Application Support/epsview/`
//! - Windows: `%APPDATA%\epsview\`

use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "epsview";

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// `<config dir>/config.json`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// `<config dir>/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let dir = logs_dir().ok_or_else(|| "No config directory available".to_string())?;
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    Ok(dir)
}
