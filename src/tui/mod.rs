//! TUI module for the interactive editor using Ratatui.

pub mod app;
pub mod events;
pub mod handler;
pub mod ui;

pub use handler::run_tui_editor;
