//! Editor handler with TUI interface using Ratatui.

use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use std::io;

use crate::{config::Config, language::Language, tui::run_tui_editor};

/// Open the interactive editor
pub async fn run(cfg: &Config, language: Language) -> Result<()> {
    ensure_terminal(io::stdout().is_terminal())?;
    run_tui_editor(cfg, language).await
}

fn ensure_terminal(stdout_is_terminal: bool) -> Result<()> {
    if !stdout_is_terminal {
        eprintln!("Warning: the editor needs a proper terminal.");
        eprintln!("Use --run FILE to execute code without the editor.");
        bail!("TUI mode requires a proper terminal environment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_requires_terminal() {
        assert!(ensure_terminal(false).is_err());
        assert!(ensure_terminal(true).is_ok());
    }
}
