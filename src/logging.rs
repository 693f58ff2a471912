// src/logging.rs
//! Tracing setup.
//!
//! `RUST_LOG` wins when set; otherwise `-v` selects `info` and `-vv` `debug`
//! for this crate. While the dashboard owns the terminal, logs go to
//! `<config dir>/epsview/logs/epsview.log` (rotated daily) instead of stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Console,
    File,
}

pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,epsview=info",
        _ => "info,epsview=debug",
    }
}

pub fn init(verbosity: u8, target: LogTarget) {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
    };

    let console_layer = (target == LogTarget::Console).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter())
    });

    let file_layer = match target {
        LogTarget::File => match crate::config::paths::ensure_logs_dir() {
            Ok(logs_dir) => {
                let file_appender = tracing_appender::rolling::daily(logs_dir, "epsview.log");
                Some(
                    fmt::layer()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true)
                        .with_filter(filter()),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not initialize file logging: {}", e);
                None
            }
        },
        LogTarget::Console => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
