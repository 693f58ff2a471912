// src/tui/mod.rs
//! Terminal dashboard for `epsview watch`.

pub mod ui;

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::session::{SessionEvent, SessionHandle, SessionRegistry};
use crate::utils::{format_elapsed, format_size, format_time};

const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum RowStatus {
    Pending,
    Rendered { at: DateTime<Local>, bytes: usize, elapsed: Duration },
    Failed { at: DateTime<Local>, message: String },
    Closed,
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub source: PathBuf,
    pub title: String,
    pub location: Option<PathBuf>,
    pub status: RowStatus,
    pub runs: usize,
}

impl SessionRow {
    fn from_handle(handle: &SessionHandle) -> Self {
        SessionRow {
            source: handle.source().to_path_buf(),
            title: handle.title().to_string(),
            location: handle.location().map(Path::to_path_buf),
            status: RowStatus::Pending,
            runs: 0,
        }
    }

    pub fn status_text(&self) -> String {
        match &self.status {
            RowStatus::Pending => "rendering…".to_string(),
            RowStatus::Rendered { at, bytes, elapsed } => format!(
                "ok {} · {} · {}",
                format_time(at),
                format_size(*bytes),
                format_elapsed(*elapsed)
            ),
            RowStatus::Failed { at, message } => format!("failed {} · {}", format_time(at), message),
            RowStatus::Closed => "closed".to_string(),
        }
    }
}

/// What a key press asks the run loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh(PathBuf),
    Close(PathBuf),
}

pub struct App {
    pub rows: Vec<SessionRow>,
    pub table: TableState,
    pub log: VecDeque<String>,
    pub notice: Option<String>,
}

impl App {
    pub fn new(registry: &SessionRegistry) -> Self {
        let rows: Vec<SessionRow> = registry.handles().map(SessionRow::from_handle).collect();
        let mut table = TableState::default();
        if !rows.is_empty() {
            table.select(Some(0));
        }
        App { rows, table, log: VecDeque::new(), notice: None }
    }

    pub fn selected(&self) -> Option<&SessionRow> {
        self.table.selected().and_then(|i| self.rows.get(i))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                Action::None
            }
            KeyCode::Char('r') => self
                .selected()
                .filter(|row| row.status != RowStatus::Closed)
                .map(|row| Action::Refresh(row.source.clone()))
                .unwrap_or(Action::None),
            KeyCode::Char('x') => self
                .selected()
                .filter(|row| row.status != RowStatus::Closed)
                .map(|row| Action::Close(row.source.clone()))
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.table.selected().unwrap_or(0) as isize;
        let last = self.rows.len() as isize - 1;
        self.table.select(Some((current + delta).clamp(0, last) as usize));
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Rendered { source, at, bytes, elapsed } => {
                self.push_log(format!("{} rendered {}", format_time(&at), source.display()));
                if let Some(row) = self.row_mut(&source) {
                    row.runs += 1;
                    row.status = RowStatus::Rendered { at, bytes, elapsed };
                }
            }
            SessionEvent::Failed { source, at, message } => {
                self.push_log(format!("{} {}: {}", format_time(&at), source.display(), message));
                if let Some(row) = self.row_mut(&source) {
                    row.runs += 1;
                    row.status = RowStatus::Failed { at, message };
                }
            }
            SessionEvent::Closed { source } => {
                self.push_log(format!("Stop watching {}", source.display()));
                if let Some(row) = self.row_mut(&source) {
                    row.status = RowStatus::Closed;
                }
            }
            SessionEvent::Notice { message } => {
                self.push_log(message.clone());
                self.notice = Some(message);
            }
        }
    }

    fn row_mut(&mut self, source: &Path) -> Option<&mut SessionRow> {
        self.rows.iter_mut().find(|row| row.source == source)
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Run the dashboard until the user quits, then close every session.
pub async fn run(
    registry: &mut SessionRegistry,
    mut events: UnboundedReceiver<SessionEvent>,
) -> anyhow::Result<()> {
    let mut app = App::new(registry);
    let mut terminal = setup_terminal()?;

    let result = event_loop(&mut terminal, &mut app, registry, &mut events).await;

    restore_terminal(&mut terminal)?;
    registry.close_all().await;
    result
}

async fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    registry: &mut SessionRegistry,
    events: &mut UnboundedReceiver<SessionEvent>,
) -> anyhow::Result<()> {
    let (key_tx, mut keys) = unbounded_channel();
    spawn_key_reader(key_tx);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match app.handle_key(key) {
                    Action::Quit => break,
                    Action::Refresh(source) => {
                        registry.refresh(&source);
                    }
                    Action::Close(source) => {
                        registry.close(&source).await;
                    }
                    Action::None => {}
                }
            }
            event = events.recv() => match event {
                Some(event) => app.apply(event),
                None => break,
            },
        }
    }
    Ok(())
}

/// crossterm input is blocking, so it gets its own thread.
fn spawn_key_reader(tx: UnboundedSender<KeyEvent>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(200)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
}

fn setup_terminal() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Term) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}
