//! Async event handler for the TUI editor.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{
    app::{App, PopupState},
    events::TuiEvent,
    ui::render_ui,
};
use crate::{
    config::Config,
    editor::{EditorError, EditorSession},
    execution::{ExecutionClient, Executor},
    language::Language,
    session::FileSessionStore,
};

/// Run the TUI-based editor; the caller checks that stdout is a terminal.
pub async fn run_tui_editor(cfg: &Config, language: Language) -> Result<()> {
    // Initialize application components before touching the terminal
    let client = ExecutionClient::from_config(cfg)?;
    let store = Arc::new(FileSessionStore::from_config(cfg));
    let session = EditorSession::new(language, store);
    let mut app = App::new(session, client.endpoint().to_string(), cfg.download_path());
    info!(language = %language, endpoint = client.endpoint(), "editor started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create event channels
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    // Main event loop
    let result = run_app(&mut terminal, &mut app, client, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: ExecutionClient,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if input_tx.is_closed() {
            break;
        }
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            let sent = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => input_tx.send(TuiEvent::Key(key)),
                Ok(Event::Paste(text)) => input_tx.send(TuiEvent::Paste(text)),
                _ => Ok(()),
            };
            if sent.is_err() {
                break; // Channel closed
            }
        }
    });

    loop {
        // Editor pane: left half of the screen minus status bar, borders and gutter
        let size = terminal.size()?;
        let text_width = (size.width / 2) as usize;
        app.scroll_editor_to_cursor(
            size.height.saturating_sub(3) as usize,
            text_width.saturating_sub(2 + app.gutter_width()),
        );

        // Render UI
        terminal.draw(|frame| render_ui(frame, app))?;

        // Handle events
        while let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, key, &client, &event_tx) {
                        return Ok(()); // Quit requested
                    }
                }
                TuiEvent::Paste(text) => {
                    if !app.is_popup_shown() {
                        app.insert_str(&text);
                    }
                }
                TuiEvent::RunFinished(outcome) => {
                    app.session.finish_run(outcome);
                    app.output_scroll = 0;
                }
            }
            app.drain_notifications();
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    }
}

/// Starts a run and resolves it on a background task.
fn start_run(app: &mut App, client: &ExecutionClient, event_tx: &mpsc::UnboundedSender<TuiEvent>) {
    match app.session.begin_run() {
        Ok(request) => {
            let client = client.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let outcome = client.submit(&request).await;
                let _ = tx.send(TuiEvent::RunFinished(outcome));
            });
        }
        Err(EditorError::EmptySource) | Err(EditorError::AlreadyRunning) => {}
        Err(e) => debug!(error = %e, "run not started"),
    }
}

/// Handle keyboard events; returns true when the user asked to quit.
fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    client: &ExecutionClient,
    event_tx: &mpsc::UnboundedSender<TuiEvent>,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && key.code == KeyCode::Char('c') {
        return app.handle_ctrl_c();
    }

    // Language menu captures navigation keys
    if let PopupState::LanguageMenu { .. } = app.popup_state {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.menu_move(false),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.menu_move(true),
            KeyCode::Enter => {
                app.confirm_language();
            }
            KeyCode::Esc => app.hide_popup(),
            _ => {}
        }
        return false;
    }

    // Any other popup closes on any key
    if app.is_popup_shown() {
        app.hide_popup();
        return false;
    }

    if app.show_help && key.code != KeyCode::F(1) {
        app.show_help = false;
        return false;
    }

    match key.code {
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::F(5) => start_run(app, client, event_tx),
        KeyCode::Char('r') if ctrl => start_run(app, client, event_tx),
        KeyCode::Char('l') if ctrl => {
            if app.session.is_running() {
                app.set_status(EditorError::RunInProgress.to_string());
            } else {
                app.open_language_menu();
            }
        }
        KeyCode::Char('k') if ctrl => app.clear_output(),
        KeyCode::Char('s') if ctrl => {
            let dir = app.download_dir.clone();
            if let Err(e) = app.session.download_source(&dir) {
                app.set_status(format!("Save failed: {e}"));
            }
        }
        KeyCode::Char('d') if ctrl => {
            let _ = app.session.request_deploy();
        }
        KeyCode::PageUp => app.scroll_output_up(),
        KeyCode::PageDown => app.scroll_output_down(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Up => app.move_cursor_up(),
        KeyCode::Down => app.move_cursor_down(),
        KeyCode::Home => app.move_cursor_home(),
        KeyCode::End => app.move_cursor_end(),
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Tab => app.insert_str("  "),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        _ => {}
    }

    false
}
