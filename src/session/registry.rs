// src/session/registry.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc::unbounded_channel;

use super::{FileWatcher, SessionContext, SessionHandle};
use crate::preview::Panel;

/// Live sessions, at most one per source file.
///
/// Opening a file that already has a session replaces it: the old session is
/// closed, and its watcher released, before the new one starts.
pub struct SessionRegistry {
    ctx: SessionContext,
    sessions: BTreeMap<PathBuf, SessionHandle>,
    watch: bool,
}

impl SessionRegistry {
    pub fn new(ctx: SessionContext) -> Self {
        SessionRegistry { ctx, sessions: BTreeMap::new(), watch: true }
    }

    /// Sessions render on open and on explicit refresh only.
    pub fn without_watching(mut self) -> Self {
        self.watch = false;
        self
    }

    /// Start a session for `source`, replacing any existing one. Returns the session key.
    ///
    /// Failing to set up the watcher is not fatal: the session still renders
    /// and can be refreshed by hand.
    pub async fn open(&mut self, source: &Path, panel: Box<dyn Panel>) -> PathBuf {
        let key = session_key(source);

        if let Some(previous) = self.sessions.remove(&key) {
            tracing::info!("Replacing existing preview of {}", key.display());
            previous.close().await;
        }

        let (trigger, changes) = unbounded_channel();
        let watcher = if self.watch {
            match FileWatcher::new(&key, self.ctx.debounce, trigger.clone()) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!("Could not watch {}: {}", key.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let handle =
            SessionHandle::spawn(key.clone(), panel, self.ctx.clone(), watcher, trigger, changes);
        self.sessions.insert(key.clone(), handle);
        key
    }

    pub fn get(&self, source: &Path) -> Option<&SessionHandle> {
        self.sessions.get(&session_key(source))
    }

    pub fn refresh(&self, source: &Path) -> bool {
        self.get(source).map(SessionHandle::refresh).unwrap_or(false)
    }

    /// Close the session for `source`. Returns false if there was none.
    pub async fn close(&mut self, source: &Path) -> bool {
        match self.sessions.remove(&session_key(source)) {
            Some(handle) => {
                handle.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn close_all(&mut self) {
        let sessions = std::mem::take(&mut self.sessions);
        for (_, handle) in sessions {
            handle.close().await;
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = &SessionHandle> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Canonical path when the file exists, absolute path otherwise, so the same
/// file reached through different relative paths shares one session.
pub fn session_key(source: &Path) -> PathBuf {
    source
        .canonicalize()
        .or_else(|_| std::path::absolute(source))
        .unwrap_or_else(|_| source.to_path_buf())
}
