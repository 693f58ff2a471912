// src/tui/ui.rs
use ratatui::{prelude::*, widgets::*};

use super::{App, RowStatus};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8), Constraint::Length(1)])
        .split(f.size());

    draw_sessions(f, app, chunks[0]);
    draw_log(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
}

fn draw_sessions(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = app.rows.iter().map(|row| {
        let style = match row.status {
            RowStatus::Rendered { .. } => Style::default().fg(Color::Green),
            RowStatus::Failed { .. } => Style::default().fg(Color::Red),
            RowStatus::Closed => Style::default().fg(Color::DarkGray),
            RowStatus::Pending => Style::default(),
        };
        let output = row
            .location
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        Row::new(vec![
            Cell::from(row.title.clone()),
            Cell::from(row.runs.to_string()),
            Cell::from(row.status_text()).style(style),
            Cell::from(output),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Length(5),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ],
    )
    .header(
        Row::new(vec!["Preview", "Runs", "Status", "Output"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("EPS previews"))
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.table);
}

fn draw_log(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(app.log.len().saturating_sub(visible))
        .map(|line| Line::from(line.as_str()))
        .collect();
    let log = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    f.render_widget(log, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help = "q quit  ↑/↓ select  r re-render  x close";
    let line = match app.notice {
        Some(ref notice) => Line::from(vec![
            Span::styled(notice.as_str(), Style::default().fg(Color::Yellow)),
            Span::raw("  │  "),
            Span::raw(help),
        ]),
        None => Line::from(help),
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::SessionRow;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    #[test]
    fn test_draw_shows_sessions_and_notice() {
        let mut table = TableState::default();
        table.select(Some(0));
        let mut app = App {
            rows: vec![SessionRow {
                source: PathBuf::from("/figs/plot.eps"),
                title: "Preview plot.eps".to_string(),
                location: Some(PathBuf::from("/figs/plot.eps.html")),
                status: RowStatus::Pending,
                runs: 0,
            }],
            table,
            log: VecDeque::from(vec!["Watching /figs/plot.eps".to_string()]),
            notice: Some("Failed to execute ps2pdf, is that installed?".to_string()),
        };

        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Preview plot.eps"));
        assert!(text.contains("Watching /figs/plot.eps"));
        assert!(text.contains("Failed to execute ps2pdf"));
    }
}
