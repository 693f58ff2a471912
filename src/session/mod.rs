// src/session/mod.rs
//! Preview sessions: a source file paired with the panel showing it.
//!
//! Each session runs as its own task. It renders once when opened and again
//! for every change notification, one run at a time, until it is closed.
//! Closing drops the file watcher and cancels a run that is still in flight
//! (killing the converter and removing its temporary files).

pub mod registry;
pub mod watcher;

pub use registry::SessionRegistry;
pub use watcher::FileWatcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::convert::Converter;
use crate::preview::{report_failure, Notifier, Panel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The source changed on disk.
    Modified,
    /// Explicit re-render request.
    Refresh,
}

/// Status updates for whoever displays the sessions.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Rendered {
        source: PathBuf,
        at: DateTime<Local>,
        bytes: usize,
        elapsed: Duration,
    },
    Failed {
        source: PathBuf,
        at: DateTime<Local>,
        message: String,
    },
    Closed {
        source: PathBuf,
    },
    Notice {
        message: String,
    },
}

/// What every session needs besides its own source and panel.
#[derive(Clone)]
pub struct SessionContext {
    pub converter: Arc<Converter>,
    pub notifier: Arc<dyn Notifier>,
    pub events: Option<UnboundedSender<SessionEvent>>,
    pub debounce: Duration,
}

impl SessionContext {
    pub fn new(converter: Converter, notifier: Arc<dyn Notifier>) -> Self {
        SessionContext {
            converter: Arc::new(converter),
            notifier,
            events: None,
            debounce: Duration::from_millis(200),
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }
}

struct PreviewSession {
    source: PathBuf,
    panel: Box<dyn Panel>,
    ctx: SessionContext,
    watcher: Option<FileWatcher>,
}

impl PreviewSession {
    async fn run(
        mut self,
        mut changes: UnboundedReceiver<ChangeEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        if self.watcher.is_some() {
            tracing::info!("Watching {}", self.source.display());
        }

        let mut pending = true;
        loop {
            if pending {
                pending = false;
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = self.render_once() => {}
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                change = changes.recv() => match change {
                    Some(event) => {
                        self.log_change(event);
                        // Anything queued meanwhile is covered by the same run.
                        while let Ok(extra) = changes.try_recv() {
                            tracing::trace!("Coalescing {:?} for {}", extra, self.source.display());
                        }
                        pending = true;
                    }
                    None => break,
                },
            }
        }

        if self.watcher.take().is_some() {
            tracing::info!("Stop watching {}", self.source.display());
        }
        self.ctx.emit(SessionEvent::Closed { source: self.source.clone() });
    }

    async fn render_once(&mut self) {
        match self.ctx.converter.render(&self.source, self.panel.as_mut()).await {
            Ok(outcome) => {
                tracing::debug!(
                    "Rendered {} ({} bytes in {:?})",
                    self.source.display(),
                    outcome.bytes,
                    outcome.elapsed
                );
                self.ctx.emit(SessionEvent::Rendered {
                    source: self.source.clone(),
                    at: Local::now(),
                    bytes: outcome.bytes,
                    elapsed: outcome.elapsed,
                });
            }
            Err(err) => {
                report_failure(self.ctx.notifier.as_ref(), &self.source, &err);
                self.ctx.emit(SessionEvent::Failed {
                    source: self.source.clone(),
                    at: Local::now(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn log_change(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::Modified => tracing::info!("File changed : {}", self.source.display()),
            ChangeEvent::Refresh => tracing::info!("Refreshing {}", self.source.display()),
        }
    }
}

/// Owner's side of a running session.
pub struct SessionHandle {
    source: PathBuf,
    title: String,
    location: Option<PathBuf>,
    trigger: UnboundedSender<ChangeEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Start a session. The first render begins immediately.
    ///
    /// `trigger` and `changes` are the two ends of the session's change channel;
    /// the watcher, if any, should already be feeding `trigger`.
    pub fn spawn(
        source: PathBuf,
        panel: Box<dyn Panel>,
        ctx: SessionContext,
        watcher: Option<FileWatcher>,
        trigger: UnboundedSender<ChangeEvent>,
        changes: UnboundedReceiver<ChangeEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let title = panel.title().to_string();
        let location = panel.location().map(Path::to_path_buf);
        let session = PreviewSession { source: source.clone(), panel, ctx, watcher };
        let task = tokio::spawn(session.run(changes, shutdown_rx));

        SessionHandle { source, title, location, trigger, shutdown: shutdown_tx, task }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Queue a run. Returns false once the session has ended.
    pub fn trigger(&self, event: ChangeEvent) -> bool {
        self.trigger.send(event).is_ok()
    }

    pub fn refresh(&self) -> bool {
        self.trigger(ChangeEvent::Refresh)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the session and wait until its watcher is released.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("Session for {} ended abnormally: {}", self.source.display(), e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::preview::MemoryPanel;
    use crate::test_support::{FakeTools, RecordingNotifier, SAMPLE_EPS};
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::timeout;

    async fn next_event(rx: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
        timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("session event in time")
            .expect("event channel open")
    }

    fn spawn_manual(
        tools: &FakeTools,
        source: PathBuf,
        panel: MemoryPanel,
    ) -> (SessionHandle, UnboundedReceiver<SessionEvent>, Arc<RecordingNotifier>) {
        let (events_tx, events_rx) = unbounded_channel();
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = SessionContext::new(tools.converter(), notifier.clone()).with_events(events_tx);
        let (trigger, changes) = unbounded_channel();
        let handle = SessionHandle::spawn(source, Box::new(panel), ctx, None, trigger, changes);
        (handle, events_rx, notifier)
    }

    #[tokio::test]
    async fn test_change_triggers_exactly_one_run() {
        let tools = FakeTools::working();
        let source = tools.write_source("a.eps", SAMPLE_EPS);
        let panel = MemoryPanel::new("Preview a.eps");
        let (handle, mut events, _) = spawn_manual(&tools, source.clone(), panel.clone());

        assert!(matches!(next_event(&mut events).await, SessionEvent::Rendered { .. }));
        assert_eq!(panel.set_count(), 1);

        std::fs::write(&source, b"%!PS-Adobe-3.0 EPSF-3.0\n%changed\n").unwrap();
        assert!(handle.trigger(ChangeEvent::Modified));
        assert!(matches!(next_event(&mut events).await, SessionEvent::Rendered { .. }));

        assert_eq!(panel.set_count(), 2);
        assert_eq!(tools.ps2pdf_calls(), 2);
        assert!(panel.html().unwrap().contains("%changed"));

        handle.close().await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Closed { .. }));
    }

    #[tokio::test]
    async fn test_no_runs_after_close() {
        let tools = FakeTools::working();
        let source = tools.write_source("a.eps", SAMPLE_EPS);
        let panel = MemoryPanel::new("Preview a.eps");
        let (handle, mut events, _) = spawn_manual(&tools, source.clone(), panel.clone());
        next_event(&mut events).await;

        let trigger = handle.trigger.clone();
        handle.close().await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Closed { .. }));

        assert!(trigger.send(ChangeEvent::Modified).is_err());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(panel.set_count(), 1);
        assert_eq!(tools.ps2pdf_calls(), 1);
    }

    #[tokio::test]
    async fn test_close_during_run_kills_tool_and_removes_artifacts() {
        let tools = FakeTools::slow_ps2pdf();
        let source = tools.write_source("a.eps", SAMPLE_EPS);
        let panel = MemoryPanel::new("Preview a.eps");
        let (handle, mut events, _) = spawn_manual(&tools, source, panel.clone());

        // ps2pdf has been started and its run directory exists.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tools.ps2pdf_calls() == 0 || tools.temp_entries() == 0 {
            assert!(tokio::time::Instant::now() < deadline, "ps2pdf never started");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(tools.temp_entries(), 1);

        let started = std::time::Instant::now();
        handle.close().await;
        assert!(started.elapsed() < Duration::from_secs(2));

        assert!(matches!(next_event(&mut events).await, SessionEvent::Closed { .. }));
        assert_eq!(tools.temp_entries(), 0);
        assert_eq!(panel.set_count(), 0);
        assert_eq!(tools.pdf2svg_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_session_alive() {
        let tools = FakeTools::working();
        let source = tools.root().join("later.eps");
        let panel = MemoryPanel::new("Preview later.eps");
        let (handle, mut events, notifier) = spawn_manual(&tools, source.clone(), panel.clone());

        assert!(matches!(next_event(&mut events).await, SessionEvent::Failed { .. }));
        assert_eq!(
            notifier.messages.lock().unwrap().as_slice(),
            ["Failed to read eps file"]
        );
        assert!(!handle.is_finished());

        std::fs::write(&source, SAMPLE_EPS).unwrap();
        handle.refresh();
        assert!(matches!(next_event(&mut events).await, SessionEvent::Rendered { .. }));
        assert!(panel.html().unwrap().starts_with("<h1>later.eps</h1>"));

        handle.close().await;
    }
}
