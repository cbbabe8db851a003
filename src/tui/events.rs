//! Custom event types for TUI application.

use crossterm::event::KeyEvent;

use crate::execution::{ExecutionError, ExecutionResult};

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Bracketed paste content
    Paste(String),
    /// The in-flight submission resolved
    RunFinished(Result<ExecutionResult, ExecutionError>),
}
