//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use super::app::{App, PopupState};
use crate::editor::{Notification, NotificationLevel, Status};
use crate::language::Language;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Editor and output
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[0]);

    render_editor(frame, app, panes[0]);
    render_output(frame, app, panes[1]);
    render_status_bar(frame, app, main_layout[1]);

    if app.show_help {
        render_help_overlay(frame, app);
    }

    match &app.popup_state {
        PopupState::LanguageMenu { selected } => render_language_menu(frame, app, *selected),
        PopupState::Notification(note) => render_notification_popup(frame, note),
        PopupState::None => {}
    }
}

/// Render the source editor with a line-number gutter
fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.session.language();
    let title = format!("Editor - {} ({})", lang.id(), lang.display_version());
    let height = area.height.saturating_sub(2) as usize;

    let gutter = app.gutter_width();
    let digits = gutter - 1;
    let text_width = (area.width as usize).saturating_sub(2 + gutter);

    let lines: Vec<Line> = app
        .session
        .source()
        .split('\n')
        .enumerate()
        .skip(app.editor_scroll)
        .take(height)
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(format!("{:>digits$} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(visible_columns(line, app.editor_hscroll, text_width)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);

    if !app.is_popup_shown() && !app.show_help {
        let (row, col) = app.cursor_row_col();
        let x = (area.x as usize + 1 + gutter).saturating_add(col.saturating_sub(app.editor_hscroll));
        let y = (area.y as usize + 1).saturating_add(row.saturating_sub(app.editor_scroll));
        let inside = x < (area.right() as usize).saturating_sub(1)
            && y < (area.bottom() as usize).saturating_sub(1)
            && col >= app.editor_hscroll
            && row >= app.editor_scroll;
        if let (true, Ok(x), Ok(y)) = (inside, u16::try_from(x), u16::try_from(y)) {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// The part of `line` starting at display column `skip`, at most `width` columns wide.
fn visible_columns(line: &str, skip: usize, width: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if col >= skip {
            if col + w > skip + width {
                break;
            }
            out.push(c);
        }
        col += w;
    }
    out
}

/// Render the output pane
fn render_output(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let mut is_error = false;

    let text = match session.status() {
        Status::Running => Text::from(Line::from(Span::styled(
            "Running...",
            Style::default().fg(Color::Yellow),
        ))),
        Status::Failed => {
            is_error = true;
            let message = session.last_error_message().unwrap_or("Unable to run code");
            Text::from(Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))))
        }
        Status::Succeeded | Status::Idle => match session.last_result() {
            Some(result) => {
                is_error = !result.succeeded;
                let style = if is_error {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::White)
                };
                Text::from(
                    result
                        .output_lines()
                        .into_iter()
                        .map(|line| Line::from(Span::styled(line.to_string(), style)))
                        .collect::<Vec<_>>(),
                )
            }
            None => Text::from(Line::from(Span::styled(
                "Press Ctrl+R to run the code and see the output here",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))),
        },
    };

    let border_style = if is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("Output (Ctrl+K clear)"),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));

    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let state = match app.session.status() {
        Status::Idle => "idle",
        Status::Running => "running",
        Status::Succeeded => "done",
        Status::Failed => "failed",
    };
    let who = app
        .identity
        .as_ref()
        .map(|i| i.display_name.as_str())
        .unwrap_or("not signed in");

    let status_text = format!(
        " {} | {} | {} | {}",
        app.session.language(),
        state,
        who,
        app.status_message
    );

    let status_paragraph =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_paragraph, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Create centered popup area
    let popup_area = centered_rect(70, 70, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("codepad Help"),
        Line::from(""),
        Line::from("Editing:"),
        Line::from("  Arrows/Home/End - Move cursor"),
        Line::from("  Enter/Tab       - New line / indent"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  Ctrl+R or F5    - Run code"),
        Line::from("  Ctrl+L          - Choose language"),
        Line::from("  Ctrl+K          - Clear output"),
        Line::from("  Ctrl+S          - Save buffer to disk"),
        Line::from("  Ctrl+D          - Deploy (requires sign-in)"),
        Line::from("  PgUp/PgDn       - Scroll output"),
        Line::from("  F1              - Toggle this help"),
        Line::from("  Ctrl+C twice    - Quit"),
        Line::from(""),
        Line::from(format!("Execution service: {}", app.endpoint)),
        Line::from("Sign in from a shell with: codepad --login github|google"),
    ];

    let help_paragraph = Paragraph::new(help_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help_paragraph, popup_area);
}

/// Render the language selector
fn render_language_menu(frame: &mut Frame, app: &App, selected: usize) {
    let area = frame.area();
    let popup_area = centered_rect(40, 50, area);
    frame.render_widget(Clear, popup_area);

    let current = app.session.language();
    let lines: Vec<Line> = Language::ALL
        .iter()
        .enumerate()
        .map(|(i, lang)| {
            let marker = if *lang == current { "*" } else { " " };
            let text = format!("{} {:<12} {}", marker, lang.id(), lang.display_version());
            if i == selected {
                Line::from(Span::styled(
                    text,
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Language (Enter select, Esc cancel)")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(paragraph, popup_area);
}

/// Render a warning or error notification
fn render_notification_popup(frame: &mut Frame, note: &Notification) {
    let area = frame.area();
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let color = match note.level {
        NotificationLevel::Error => Color::Red,
        NotificationLevel::Warning => Color::Yellow,
        NotificationLevel::Info => Color::Cyan,
    };

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(popup_area);

    let body = Paragraph::new(note.description.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(note.title.as_str())
                .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(body, popup_layout[0]);

    let instructions = Paragraph::new("Press any key to close").style(Style::default().fg(Color::Yellow));
    frame.render_widget(instructions, popup_layout[1]);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
