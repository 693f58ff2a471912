// src/lib.rs
//! Live EPS previews.
//!
//! EPS sources are converted to SVG by the external `ps2pdf` and `pdf2svg`
//! tools and shown as `<h1>name</h1><svg…>` html, re-rendered whenever the
//! source changes on disk.

pub mod cli;
pub mod commands;
pub mod config;
pub mod convert;
pub mod error;
pub mod filesystem;
pub mod logging;
pub mod preview;
pub mod session;
pub mod tui;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::Config;
pub use convert::Converter;
pub use error::{ErrorCategory, PreviewError};
pub use preview::{Panel, PanelTarget};
pub use session::{SessionContext, SessionRegistry};
