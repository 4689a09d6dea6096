//! Terminal report viewer.
//!
//! A TUI bound to one report controller: a search line that filters on
//! every keystroke, the report table with status colors, and a console pane
//! for notices. `Ctrl+E` writes the filtered CSV into the export directory.
//!
//! Launch with `botdash view <source_id>`.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use botdash_client::{ClientConfig, NoticeLevel, ReportController, ReportSource, ViewState};
use botdash_report::{StatusTag, TableView};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};

use crate::artifacts::write_export;

const MAX_CONSOLE_MESSAGES: usize = 200;
const PAGE_ROWS: usize = 10;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    None,
    SearchChanged,
    Export,
    Quit,
}

struct ReportConsole<S> {
    controller: ReportController<S>,
    source_id: String,
    export_dir: PathBuf,
    /// Current search text, as typed.
    input: String,
    /// Cursor position within the search field, in chars.
    cursor_pos: usize,
    /// First visible table row.
    scroll: usize,
    console_messages: Vec<(chrono::DateTime<chrono::Utc>, String, Color)>,
}

impl<S: ReportSource> ReportConsole<S> {
    fn new(controller: ReportController<S>, source_id: &str, export_dir: PathBuf) -> Self {
        let mut console = Self {
            controller,
            source_id: source_id.to_string(),
            export_dir,
            input: String::new(),
            cursor_pos: 0,
            scroll: 0,
            console_messages: Vec::new(),
        };
        console.add_message(
            "Type to filter rows. Ctrl+E exports the visible rows, Esc quits.",
            Color::DarkGray,
        );
        console
    }

    async fn load(&mut self) {
        let id = self.source_id.clone();
        self.controller.initialize(&id).await;
        match self.controller.state() {
            ViewState::Ready => {
                let msg = format!(
                    "Loaded {} rows from {}",
                    self.controller.canonical_rows().len(),
                    self.controller.info().endpoint
                );
                self.add_message(&msg, Color::Green);
            }
            ViewState::NoData(panel) => {
                let msg = panel.title.clone();
                self.add_message(&msg, Color::Yellow);
            }
            ViewState::Failed(e) => {
                let msg = e.to_string();
                self.add_message(&msg, Color::Red);
            }
            ViewState::Idle | ViewState::Loading { .. } => {}
        }
    }

    fn add_message(&mut self, msg: &str, color: Color) {
        self.console_messages
            .push((chrono::Utc::now(), msg.to_string(), color));
        if self.console_messages.len() > MAX_CONSOLE_MESSAGES {
            self.console_messages.remove(0);
        }
    }

    fn apply_search(&mut self) {
        self.controller.on_search_input(&self.input);
        self.scroll = 0;
    }

    fn export(&mut self) {
        match self.controller.on_export_request() {
            Some(export) => match write_export(&self.export_dir, &export) {
                Ok(path) => {
                    let msg = format!(
                        "Exported {} rows to {}",
                        self.controller.displayed_len(),
                        path.display()
                    );
                    self.add_message(&msg, Color::Green);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to write export");
                    let msg = format!("Export failed: {}", e);
                    self.add_message(&msg, Color::Red);
                }
            },
            None => {
                if let Some(notice) = self.controller.take_notice() {
                    let color = match notice.level {
                        NoticeLevel::Warning => Color::Yellow,
                        NoticeLevel::Info => Color::White,
                    };
                    self.add_message(&notice.text, color);
                }
            }
        }
    }

    /// Handle keyboard input. Editing keys only take effect while search is enabled.
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyOutcome {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                return KeyOutcome::Quit
            }
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => return KeyOutcome::Export,
            (KeyCode::Up, _) => self.scroll = self.scroll.saturating_sub(1),
            (KeyCode::Down, _) => self.scroll_down(1),
            (KeyCode::PageUp, _) => self.scroll = self.scroll.saturating_sub(PAGE_ROWS),
            (KeyCode::PageDown, _) => self.scroll_down(PAGE_ROWS),
            _ if !self.controller.search_enabled() => {}
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let byte = self.byte_offset(self.cursor_pos);
                self.input.insert(byte, c);
                self.cursor_pos += 1;
                return KeyOutcome::SearchChanged;
            }
            (KeyCode::Backspace, _) => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let byte = self.byte_offset(self.cursor_pos);
                    self.input.remove(byte);
                    return KeyOutcome::SearchChanged;
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor_pos < self.input.chars().count() {
                    let byte = self.byte_offset(self.cursor_pos);
                    self.input.remove(byte);
                    return KeyOutcome::SearchChanged;
                }
            }
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => {
                if self.cursor_pos < self.input.chars().count() {
                    self.cursor_pos += 1;
                }
            }
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.input.chars().count(),
            _ => {}
        }
        KeyOutcome::None
    }

    /// Scroll towards the end, never past the last displayed row.
    fn scroll_down(&mut self, rows: usize) {
        let last = self.controller.displayed_len().saturating_sub(1);
        self.scroll = (self.scroll + rows).min(last);
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn render(&self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(3), // Search
                Constraint::Min(6),    // Report
                Constraint::Length(6), // Console output
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0]);
        self.render_search(frame, outer[1]);
        self.render_report(frame, outer[2]);
        self.render_console_output(frame, outer[3]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let info = self.controller.info();
        let title = match self.controller.state() {
            ViewState::Failed(_) => format!(" Error Loading Report (ID: {}) ", self.source_id),
            _ if info.display_name.is_empty() => format!(" Report {} ", self.source_id),
            _ => format!(" {} ", info.display_name),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let export_state = if self.controller.export_enabled() {
            Span::styled("enabled", Style::default().fg(Color::Green))
        } else {
            Span::styled("disabled", Style::default().fg(Color::DarkGray))
        };

        let line = Line::from(vec![
            Span::styled("  Endpoint: ", Style::default().fg(Color::Gray)),
            Span::styled(info.endpoint.clone(), Style::default().fg(Color::White)),
            Span::styled("  |  Rows: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{}/{}",
                    self.controller.displayed_len(),
                    self.controller.canonical_rows().len()
                ),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled("  |  Export: ", Style::default().fg(Color::Gray)),
            export_state,
        ]);

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let enabled = self.controller.search_enabled();
        let block = Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if enabled {
                Color::Green
            } else {
                Color::DarkGray
            }));

        let line = if self.input.is_empty() {
            Line::from(vec![
                Span::styled(" > ", Style::default().fg(Color::Green)),
                Span::styled(
                    if enabled { "Type to filter..." } else { "Search unavailable" },
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(" > ", Style::default().fg(Color::Green)),
                Span::styled(self.input.as_str(), Style::default().fg(Color::White)),
            ])
        };
        frame.render_widget(Paragraph::new(line).block(block), area);

        if enabled {
            let cursor_x = area.x + 4 + self.cursor_pos as u16;
            frame.set_cursor_position((cursor_x, area.y + 1));
        }
    }

    fn render_report(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Report ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        match self.controller.state() {
            ViewState::Ready => {}
            ViewState::NoData(panel) => {
                let text = vec![
                    Line::from(Span::styled(
                        panel.title.clone(),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(panel.raw.clone(), Style::default().fg(Color::Gray))),
                ];
                let p = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
                frame.render_widget(p, area);
                return;
            }
            ViewState::Failed(e) => {
                let p = Paragraph::new(Line::from(Span::styled(
                    format!("  {}", e),
                    Style::default().fg(Color::Red),
                )))
                .block(block);
                frame.render_widget(p, area);
                return;
            }
            ViewState::Idle | ViewState::Loading { .. } => {
                let p = Paragraph::new(Line::from(Span::styled(
                    "  Fetching report details...",
                    Style::default().fg(Color::DarkGray),
                )))
                .block(block);
                frame.render_widget(p, area);
                return;
            }
        }

        let view = self.controller.table_view();
        let total = view.row_count();
        let (headers, rows) = match view {
            TableView::Placeholder(text) => {
                let msg = if self.controller.no_results() {
                    "No results found for that search term."
                } else {
                    text
                };
                let p = Paragraph::new(Line::from(Span::styled(
                    format!("  {}", msg),
                    Style::default().fg(Color::DarkGray),
                )))
                .block(block);
                frame.render_widget(p, area);
                return;
            }
            TableView::Table { headers, rows } => (headers, rows),
        };

        let visible_height = area.height.saturating_sub(3) as usize;
        let scroll = self.scroll.min(total.saturating_sub(1));
        let body: Vec<Row> = rows
            .into_iter()
            .skip(scroll)
            .take(visible_height)
            .map(|cells| {
                Row::new(cells.into_iter().map(|cell| {
                    let style = match cell.status {
                        Some(tag) => Style::default()
                            .fg(status_color(tag))
                            .add_modifier(Modifier::BOLD),
                        None => Style::default().fg(Color::White),
                    };
                    Cell::from(Span::styled(cell.text, style))
                }))
            })
            .collect();

        let widths = vec![Constraint::Fill(1); headers.len().max(1)];
        let table = Table::new(body, widths).block(block).header(
            Row::new(headers).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(table, area);
    }

    fn render_console_output(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Console Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner_height = area.height.saturating_sub(2) as usize;
        let start = self.console_messages.len().saturating_sub(inner_height);
        let lines: Vec<Line> = self.console_messages[start..]
            .iter()
            .map(|(ts, msg, color)| {
                Line::from(vec![
                    Span::styled(
                        format!("  [{}] ", ts.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(msg.as_str(), Style::default().fg(*color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn status_color(tag: StatusTag) -> Color {
    match tag {
        StatusTag::Success => Color::Green,
        StatusTag::Error => Color::Red,
        StatusTag::Warning => Color::Yellow,
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the terminal viewer for one report until the user quits.
pub async fn run_report_console(
    config: &ClientConfig,
    source_id: &str,
) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!("Report viewer requires a terminal (TTY)."));
    }

    let controller = ReportController::from_config(config)?;
    let mut console = ReportConsole::new(controller, source_id, config.export_dir.clone());

    // Restore the terminal even if rendering panics.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    // Loading frame while the single fetch is in flight.
    terminal.draw(|frame| console.render(frame))?;
    console.load().await;

    let tick_rate = Duration::from_millis(100);
    loop {
        terminal.draw(|frame| console.render(frame))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    match console.handle_key(key_event.code, key_event.modifiers) {
                        KeyOutcome::Quit => break,
                        KeyOutcome::SearchChanged => console.apply_search(),
                        KeyOutcome::Export => console.export(),
                        KeyOutcome::None => {}
                    }
                }
            }
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}
