// src/preview/notice.rs
use std::path::Path;

use colored::Colorize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::PreviewError;
use crate::session::SessionEvent;

/// Channel for messages the user should see.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Prints to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{} {}", "epsview:".yellow().bold(), message);
    }
}

/// Forwards messages to the dashboard.
pub struct ChannelNotifier {
    tx: UnboundedSender<SessionEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        ChannelNotifier { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) {
        let _ = self.tx.send(SessionEvent::Notice { message: message.to_string() });
    }
}

/// Log a failed run and tell the user if the error category calls for it.
pub fn report_failure(notifier: &dyn Notifier, source: &Path, err: &PreviewError) {
    match err.user_message() {
        Some(message) => {
            tracing::warn!("Preview of {} failed: {}", source.display(), err);
            notifier.notify(&message);
        }
        None => tracing::error!("Preview of {} failed: {}", source.display(), err),
    }
}
