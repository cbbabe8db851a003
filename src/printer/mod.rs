//! Printers: execution output (owo-colors) and markdown (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::{execution::ExecutionResult, language::Language};

pub struct ResultPrinter {
    pub color: bool,
}

impl ResultPrinter {
    /// Output lines, red when the run wrote to stderr.
    pub fn render(&self, result: &ExecutionResult) -> String {
        let mut out = String::new();
        for line in result.stdout.lines() {
            if self.color && !result.succeeded {
                out.push_str(&format!("{}\n", line.red()));
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn print_error(&self, title: &str, description: &str) {
        if self.color {
            eprintln!("{} {}", title.red().bold(), description);
        } else {
            eprintln!("{} {}", title, description);
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

/// Markdown table of the selectable languages.
pub fn languages_table() -> String {
    let mut md = String::from("|Language|Version|\n|:-|:-|\n");
    for lang in Language::ALL {
        md.push_str(&format!("|{}|{}|\n", lang.id(), lang.display_version()));
    }
    md
}
