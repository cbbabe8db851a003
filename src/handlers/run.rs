//! Headless run: submit a file once and print the output.

use std::sync::Arc;

use anyhow::{bail, Result};
use is_terminal::IsTerminal;

use crate::{
    config::Config,
    editor::{EditorSession, Status},
    execution::ExecutionClient,
    language::Language,
    printer::ResultPrinter,
    session::FileSessionStore,
    utils::{language_for_path, read_source_file},
};

pub async fn run(cfg: &Config, file: &str, language: Option<Language>) -> Result<()> {
    let source = read_source_file(file)?;
    let language = match language.or_else(|| language_for_path(file)) {
        Some(lang) => lang,
        None => bail!("Cannot tell the language of '{}'; pass --language", file),
    };
    if source.is_empty() {
        bail!("'{}' is empty, nothing to run", file);
    }

    let client = ExecutionClient::from_config(cfg)?;
    let store = Arc::new(FileSessionStore::from_config(cfg));
    let mut session = EditorSession::new(language, store);
    session.edit_source(source);

    let printer = ResultPrinter { color: std::io::stdout().is_terminal() };
    session.run(&client).await;
    match report(&session, &printer) {
        Some((text, clean)) => {
            print!("{text}");
            if !clean {
                bail!("program reported errors");
            }
            Ok(())
        }
        None => {
            while let Some(note) = session.take_notification() {
                printer.print_error(&note.title, &note.description);
            }
            bail!("run failed")
        }
    }
}

/// Rendered output and whether the program ran without stderr, once a run succeeded.
///
/// The service's combined output already carries stderr, so it is printed once.
fn report(session: &EditorSession, printer: &ResultPrinter) -> Option<(String, bool)> {
    match (session.status(), session.last_result()) {
        (Status::Succeeded, Some(result)) => Some((printer.render(result), result.succeeded)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        execution::{ExecutionError, ExecutionResult},
        session::MemorySessionStore,
    };

    fn finished(outcome: Result<ExecutionResult, ExecutionError>) -> EditorSession {
        let mut session = EditorSession::new(Language::Python, Arc::new(MemorySessionStore::default()));
        session.begin_run().unwrap();
        session.finish_run(outcome);
        session
    }

    #[test]
    fn test_report_prints_stderr_once() {
        let session = finished(Ok(ExecutionResult::new(
            "Traceback\nNameError: x\n",
            Some("NameError: x\n".into()),
            Some(1),
        )));
        let (text, clean) = report(&session, &ResultPrinter { color: false }).unwrap();
        assert_eq!(text, "Traceback\nNameError: x\n");
        assert_eq!(text.matches("NameError").count(), 1);
        assert!(!clean);
    }

    #[test]
    fn test_report_clean_run() {
        let session = finished(Ok(ExecutionResult::new("Sum: 8\n", Some(String::new()), Some(0))));
        let (text, clean) = report(&session, &ResultPrinter { color: false }).unwrap();
        assert_eq!(text, "Sum: 8\n");
        assert!(clean);
    }

    #[test]
    fn test_report_failed_run() {
        let session = finished(Err(ExecutionError::ServiceUnavailable {
            status: Some(503),
            message: String::new(),
        }));
        assert!(report(&session, &ResultPrinter { color: false }).is_none());
    }
}
