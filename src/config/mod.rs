// src/config/mod.rs
//! Converter settings.
//!
//! Layered as defaults < `config.json` < environment < command line.
//! Example `config.json`:
//!
//! ```json
//! { "path": { "ps2pdf": "/usr/bin/ps2pdf", "pdf2svg": "pdf2svg" }, "timeout_secs": 30 }
//! ```

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const ENV_PS2PDF: &str = "EPSVIEW_PS2PDF";
pub const ENV_PDF2SVG: &str = "EPSVIEW_PDF2SVG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default = "default_ps2pdf")]
    pub ps2pdf: String,
    #[serde(default = "default_pdf2svg")]
    pub pdf2svg: String,
}

fn default_ps2pdf() -> String {
    "ps2pdf".to_string()
}

fn default_pdf2svg() -> String {
    "pdf2svg".to_string()
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            ps2pdf: default_ps2pdf(),
            pdf2svg: default_pdf2svg(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub path: ToolPaths,
    /// Per-tool limit. 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Where html panels are written. Defaults to the source file's directory.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Base directory for per-run conversion artifacts. Defaults to the system temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: ToolPaths::default(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            out_dir: None,
            temp_dir: None,
        }
    }
}

/// Values given on the command line. `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ps2pdf: Option<String>,
    pub pdf2svg: Option<String>,
    pub timeout_secs: Option<u64>,
    pub out_dir: Option<PathBuf>,
}

impl Config {
    /// Load the user config file, falling back to defaults if it is missing or broken.
    pub fn load() -> Self {
        let Some(path) = paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                Self::default()
            }
        }
    }

    /// Load an explicitly named config file. Unlike [`Config::load`], failures are errors.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(ps2pdf) = non_empty(ENV_PS2PDF) {
            self.path.ps2pdf = ps2pdf;
        }
        if let Some(pdf2svg) = non_empty(ENV_PDF2SVG) {
            self.path.pdf2svg = pdf2svg;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref ps2pdf) = overrides.ps2pdf {
            self.path.ps2pdf = ps2pdf.clone();
        }
        if let Some(ref pdf2svg) = overrides.pdf2svg {
            self.path.pdf2svg = pdf2svg.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(ref out_dir) = overrides.out_dir {
            self.out_dir = Some(out_dir.clone());
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
