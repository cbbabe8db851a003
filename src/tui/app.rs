//! TUI application state management.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthStr;

use crate::editor::{EditorSession, Notification, NotificationLevel};
use crate::language::Language;
use crate::session::Identity;

/// Popup display state
#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    /// No popup shown
    None,
    /// Language selector with the highlighted entry
    LanguageMenu { selected: usize },
    /// Error or warning raised by the session
    Notification(Notification),
}

/// Application state for the TUI
pub struct App {
    /// Editor state machine; owns the source buffer
    pub session: EditorSession,
    /// Cursor position in the source (byte index, always on a char boundary)
    pub cursor: usize,
    /// First visible editor line
    pub editor_scroll: usize,
    /// First visible display column of the editor
    pub editor_hscroll: usize,
    /// Scroll offset of the output pane
    pub output_scroll: u16,
    /// Popup display state
    pub popup_state: PopupState,
    /// Whether to show help
    pub show_help: bool,
    /// Status message to display
    pub status_message: String,
    /// Execution service endpoint, shown in the help overlay
    pub endpoint: String,
    /// Directory the buffer is saved to
    pub download_dir: PathBuf,
    /// Timestamp of last Ctrl+C press for double Ctrl+C detection
    pub last_ctrl_c_time: Option<Instant>,
    /// Signed-in identity as of the last refresh
    pub identity: Option<Identity>,
}

impl App {
    pub fn new(session: EditorSession, endpoint: String, download_dir: PathBuf) -> Self {
        let identity = session.identity();
        Self {
            session,
            cursor: 0,
            editor_scroll: 0,
            editor_hscroll: 0,
            output_scroll: 0,
            popup_state: PopupState::None,
            show_help: false,
            status_message: default_status(),
            endpoint,
            download_dir,
            last_ctrl_c_time: None,
            identity,
        }
    }

    /// Re-reads the identity from the session store.
    pub fn refresh_identity(&mut self) {
        self.identity = self.session.identity();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Moves pending session notifications to the screen.
    pub fn drain_notifications(&mut self) {
        let mut drained = false;
        while let Some(note) = self.session.take_notification() {
            drained = true;
            match note.level {
                NotificationLevel::Info => self.status_message = format!("{}: {}", note.title, note.description),
                NotificationLevel::Warning | NotificationLevel::Error => {
                    self.popup_state = PopupState::Notification(note);
                }
            }
        }
        if drained {
            self.refresh_identity();
        }
    }

    // ----- Language menu -----
    pub fn open_language_menu(&mut self) {
        let selected = Language::ALL
            .iter()
            .position(|l| *l == self.session.language())
            .unwrap_or(0);
        self.popup_state = PopupState::LanguageMenu { selected };
    }

    pub fn menu_move(&mut self, down: bool) {
        if let PopupState::LanguageMenu { selected } = &mut self.popup_state {
            let len = Language::ALL.len();
            *selected = if down { (*selected + 1) % len } else { (*selected + len - 1) % len };
        }
    }

    /// Applies the highlighted language; returns false when the session refused.
    pub fn confirm_language(&mut self) -> bool {
        let PopupState::LanguageMenu { selected } = self.popup_state else {
            return false;
        };
        self.popup_state = PopupState::None;
        match self.session.select_language(Language::ALL[selected]) {
            Ok(()) => {
                self.cursor = 0;
                self.editor_scroll = 0;
                self.editor_hscroll = 0;
                self.output_scroll = 0;
                true
            }
            Err(e) => {
                self.set_status(e.to_string());
                false
            }
        }
    }

    pub fn hide_popup(&mut self) {
        self.popup_state = PopupState::None;
    }

    pub fn is_popup_shown(&self) -> bool {
        self.popup_state != PopupState::None
    }

    // ----- Output helpers -----
    pub fn clear_output(&mut self) {
        self.session.clear_output();
        self.output_scroll = 0;
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    // ----- Source editing helpers -----
    fn source(&self) -> &str {
        self.session.source()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.cursor.min(self.source().len());
        self.session.source_mut().insert(at, c);
        self.cursor = at + c.len_utf8();
    }

    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let at = self.cursor.min(self.source().len());
        self.session.source_mut().insert_str(at, &text);
        self.cursor = at + text.len();
    }

    pub fn backspace(&mut self) {
        if let Some((idx, _)) = self.source()[..self.cursor].char_indices().next_back() {
            self.session.source_mut().remove(idx);
            self.cursor = idx;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.source().len() {
            self.session.source_mut().remove(self.cursor);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some((idx, _)) = self.source()[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.source()[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_cursor_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            self.cursor = 0;
            return;
        }
        let col = self.source()[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_in_line(prev_start, col);
    }

    pub fn move_cursor_down(&mut self) {
        let end = self.line_end(self.cursor);
        if end >= self.source().len() {
            self.cursor = end;
            return;
        }
        let col = self.source()[self.line_start(self.cursor)..self.cursor].chars().count();
        self.cursor = self.offset_in_line(end + 1, col);
    }

    fn line_start(&self, at: usize) -> usize {
        self.source()[..at].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, at: usize) -> usize {
        self.source()[at..].find('\n').map(|i| at + i).unwrap_or(self.source().len())
    }

    fn offset_in_line(&self, start: usize, col: usize) -> usize {
        let end = self.line_end(start);
        self.source()[start..end]
            .char_indices()
            .nth(col)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    /// Cursor as (row, display column) for rendering.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before = &self.source()[..self.cursor];
        let row = before.matches('\n').count();
        let col = before[self.line_start(self.cursor)..].width();
        (row, col)
    }

    /// Width of the line-number gutter, including the separating space.
    pub fn gutter_width(&self) -> usize {
        self.source().split('\n').count().to_string().len() + 1
    }

    /// Keeps the cursor within a viewport of `height` lines by `width` columns.
    pub fn scroll_editor_to_cursor(&mut self, height: usize, width: usize) {
        let (row, col) = self.cursor_row_col();
        if row < self.editor_scroll {
            self.editor_scroll = row;
        } else if height > 0 && row >= self.editor_scroll + height {
            self.editor_scroll = row + 1 - height;
        }
        if col < self.editor_hscroll {
            self.editor_hscroll = col;
        } else if width > 0 && col >= self.editor_hscroll + width {
            self.editor_hscroll = col + 1 - width;
        }
    }

    /// Handle Ctrl+C press and detect double press for quit
    /// Returns true if should quit (double Ctrl+C), false otherwise
    pub fn handle_ctrl_c(&mut self) -> bool {
        const DOUBLE_CTRL_C_TIMEOUT: Duration = Duration::from_millis(500);

        let now = Instant::now();

        if let Some(last_time) = self.last_ctrl_c_time {
            if now.duration_since(last_time) <= DOUBLE_CTRL_C_TIMEOUT {
                self.last_ctrl_c_time = None;
                return true;
            }
        }

        self.last_ctrl_c_time = Some(now);
        self.set_status("Press Ctrl+C again to quit");
        false
    }
}

fn default_status() -> String {
    "Ctrl+R run | Ctrl+L language | F1 help".to_string()
}
