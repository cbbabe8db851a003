//! Editor session state machine.
//!
//! ```text
//!   Idle ──run()──▶ Running ──Ok──▶ Succeeded
//!    ▲                 │            │
//!    │                 └───Err──▶ Failed
//!    └──── clear_output() / select_language() ──┘
//! ```
//!
//! At most one run is in flight. `run()` and `select_language()` are rejected
//! while `Running`; a stale completion arriving outside `Running` is dropped.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    execution::{ExecutionError, ExecutionRequest, ExecutionResult, Executor},
    language::Language,
    session::{Identity, SessionStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user (toast/status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level, title: title.into(), description: description.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("nothing to run")]
    EmptySource,
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("cannot change language while code is running")]
    RunInProgress,
    #[error("sign in to use this action")]
    SignInRequired,
}

pub struct EditorSession {
    language: Language,
    source: String,
    status: Status,
    last_result: Option<ExecutionResult>,
    last_error: Option<String>,
    notifications: VecDeque<Notification>,
    store: Arc<dyn SessionStore>,
}

impl EditorSession {
    pub fn new(language: Language, store: Arc<dyn SessionStore>) -> Self {
        Self {
            language,
            source: language.starter_template().to_string(),
            status: Status::Idle,
            last_result: None,
            last_error: None,
            notifications: VecDeque::new(),
            store,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    pub fn last_error_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn identity(&self) -> Option<Identity> {
        self.store.get_identity()
    }

    /// Switches language, replacing the buffer with the starter template.
    pub fn select_language(&mut self, language: Language) -> Result<(), EditorError> {
        if self.is_running() {
            debug!(requested = %language, "language switch rejected while running");
            return Err(EditorError::RunInProgress);
        }
        self.language = language;
        self.source = language.starter_template().to_string();
        self.last_result = None;
        self.last_error = None;
        self.status = Status::Idle;
        Ok(())
    }

    pub fn edit_source(&mut self, text: impl Into<String>) {
        self.source = text.into();
    }

    /// Mutable access for in-place editing by the front end.
    pub fn source_mut(&mut self) -> &mut String {
        &mut self.source
    }

    /// Enters `Running` and hands back the request to submit.
    pub fn begin_run(&mut self) -> Result<ExecutionRequest, EditorError> {
        if self.is_running() {
            return Err(EditorError::AlreadyRunning);
        }
        if self.source.is_empty() {
            return Err(EditorError::EmptySource);
        }
        self.status = Status::Running;
        info!(language = %self.language, bytes = self.source.len(), "run started");
        Ok(ExecutionRequest::new(self.language, self.source.clone()))
    }

    /// Applies the outcome of the in-flight run.
    pub fn finish_run(&mut self, outcome: Result<ExecutionResult, ExecutionError>) {
        if !self.is_running() {
            warn!("dropping completion that arrived outside of a run");
            return;
        }
        match outcome {
            Ok(result) => {
                info!(succeeded = result.succeeded, exit_code = ?result.exit_code, "run finished");
                self.last_result = Some(result);
                self.last_error = None;
                self.status = Status::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, "run failed");
                let detail = err.to_string();
                let description = if detail.is_empty() { "Unable to run code".to_string() } else { detail };
                self.notifications.push_back(Notification::new(
                    NotificationLevel::Error,
                    "An error occurred.",
                    description.clone(),
                ));
                self.last_error = Some(description);
                self.last_result = None;
                self.status = Status::Failed;
            }
        }
    }

    /// Runs the current buffer to completion on `executor`.
    ///
    /// Empty source and overlapping runs are silent no-ops.
    pub async fn run<E: Executor + ?Sized>(&mut self, executor: &E) -> Status {
        match self.begin_run() {
            Ok(request) => {
                let outcome = executor.submit(&request).await;
                self.finish_run(outcome);
            }
            Err(e) => debug!(reason = %e, "run ignored"),
        }
        self.status
    }

    /// Drops the last result or error, keeping the source.
    pub fn clear_output(&mut self) {
        if matches!(self.status, Status::Succeeded | Status::Failed) {
            self.last_result = None;
            self.last_error = None;
            self.status = Status::Idle;
        }
    }

    /// Deploy is gated on a signed-in identity and not available beyond that.
    pub fn request_deploy(&mut self) -> Result<Identity, EditorError> {
        match self.store.get_identity() {
            Some(identity) => {
                self.notifications.push_back(Notification::new(
                    NotificationLevel::Info,
                    "Deploy",
                    format!("Signed in as {}. Deploy is not available yet.", identity.display_name),
                ));
                Ok(identity)
            }
            None => {
                self.notifications.push_back(Notification::new(
                    NotificationLevel::Warning,
                    "Sign in required",
                    "Sign in with GitHub or Google to deploy.",
                ));
                Err(EditorError::SignInRequired)
            }
        }
    }

    /// Writes the buffer to `dir` under the language's download name.
    pub fn download_source(&mut self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.language.download_file_name());
        fs::write(&path, &self.source)?;
        self.notifications.push_back(Notification::new(
            NotificationLevel::Info,
            "Saved",
            path.display().to_string(),
        ));
        Ok(path)
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notifications.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{sample_identity, MemorySessionStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubExecutor {
        calls: AtomicUsize,
        outcome: Result<ExecutionResult, ExecutionError>,
    }

    impl StubExecutor {
        fn ok(stdout: &str) -> Self {
            Self { calls: AtomicUsize::new(0), outcome: Ok(ExecutionResult::new(stdout, Some(String::new()), Some(0))) }
        }

        fn unavailable() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Err(ExecutionError::ServiceUnavailable { status: Some(503), message: String::new() }),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Executor for StubExecutor {
        async fn submit(&self, _request: &ExecutionRequest) -> Result<ExecutionResult, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(Language::default(), Arc::new(MemorySessionStore::default()))
    }

    #[test]
    fn test_initial_state() {
        let s = session();
        assert_eq!(s.status(), Status::Idle);
        assert_eq!(s.source(), Language::JavaScript.starter_template());
        assert!(s.last_result().is_none());
        assert!(s.last_error_message().is_none());
    }

    #[test]
    fn test_select_language_loads_template() {
        let mut s = session();
        for lang in Language::ALL {
            s.edit_source("scratch");
            s.select_language(lang).unwrap();
            assert_eq!(s.source(), lang.starter_template());
            assert_eq!(s.language(), lang);
            assert_eq!(s.status(), Status::Idle);
        }
    }

    #[tokio::test]
    async fn test_select_language_clears_result() {
        let mut s = session();
        s.run(&StubExecutor::ok("Sum: 8\n")).await;
        s.select_language(Language::Python).unwrap();
        assert_eq!(s.status(), Status::Idle);
        assert!(s.last_result().is_none());
    }

    #[tokio::test]
    async fn test_empty_source_is_ignored() {
        let exec = StubExecutor::ok("");
        let mut s = session();
        s.edit_source("");
        assert_eq!(s.run(&exec).await, Status::Idle);
        assert_eq!(exec.calls(), 0);
        assert!(s.take_notification().is_none());

        let mut failed = session();
        failed.run(&StubExecutor::unavailable()).await;
        failed.edit_source("");
        assert_eq!(failed.run(&exec).await, Status::Failed);
        assert_eq!(exec.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_run() {
        let exec = StubExecutor::ok("5\n");
        let mut s = session();

        let request = s.begin_run().unwrap();
        assert_eq!(s.status(), Status::Running);
        assert_eq!(request.source(), Language::JavaScript.starter_template());
        s.finish_run(exec.submit(&request).await);

        assert_eq!(s.status(), Status::Succeeded);
        assert_eq!(s.last_result().map(|r| r.stdout.as_str()), Some("5\n"));
        assert!(s.last_error_message().is_none());
    }

    #[tokio::test]
    async fn test_failed_run() {
        let exec = StubExecutor::unavailable();
        let mut s = session();
        assert_eq!(s.run(&exec).await, Status::Failed);
        assert!(s.last_error_message().is_some_and(|m| !m.is_empty()));
        assert!(s.last_result().is_none());

        let note = s.take_notification().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.title, "An error occurred.");
        assert_eq!(note.description, "API Error: 503");
    }

    #[tokio::test]
    async fn test_failure_after_success_clears_result() {
        let mut s = session();
        s.run(&StubExecutor::ok("ok\n")).await;
        s.run(&StubExecutor::unavailable()).await;
        assert_eq!(s.status(), Status::Failed);
        assert!(s.last_result().is_none());

        s.run(&StubExecutor::ok("ok\n")).await;
        assert_eq!(s.status(), Status::Succeeded);
        assert!(s.last_error_message().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let exec = StubExecutor::ok("5\n");
        let mut s = session();

        let request = s.begin_run().unwrap();
        let first = exec.submit(&request).await;
        assert_eq!(exec.calls(), 1);

        assert_eq!(s.run(&exec).await, Status::Running);
        assert_eq!(s.begin_run(), Err(EditorError::AlreadyRunning));
        assert_eq!(exec.calls(), 1);

        s.finish_run(first);
        assert_eq!(s.status(), Status::Succeeded);
    }

    #[test]
    fn test_language_switch_rejected_while_running() {
        let mut s = session();
        s.begin_run().unwrap();
        assert_eq!(s.select_language(Language::Python), Err(EditorError::RunInProgress));
        assert_eq!(s.language(), Language::JavaScript);
        assert_eq!(s.source(), Language::JavaScript.starter_template());
        assert_eq!(s.status(), Status::Running);
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut s = session();
        s.finish_run(Ok(ExecutionResult::new("late", None, None)));
        assert_eq!(s.status(), Status::Idle);
        assert!(s.last_result().is_none());
    }

    #[tokio::test]
    async fn test_clear_output_keeps_source() {
        for exec in [StubExecutor::ok("5\n"), StubExecutor::unavailable()] {
            let mut s = session();
            s.edit_source("console.log(5)");
            s.run(&exec).await;
            s.clear_output();
            assert_eq!(s.status(), Status::Idle);
            assert!(s.last_result().is_none());
            assert!(s.last_error_message().is_none());
            assert_eq!(s.source(), "console.log(5)");
        }
    }

    #[test]
    fn test_clear_output_ignored_while_running() {
        let mut s = session();
        s.begin_run().unwrap();
        s.clear_output();
        assert_eq!(s.status(), Status::Running);
    }

    #[test]
    fn test_deploy_requires_identity() {
        let mut s = session();
        assert_eq!(s.request_deploy(), Err(EditorError::SignInRequired));
        let note = s.take_notification().unwrap();
        assert_eq!(note.level, NotificationLevel::Warning);
        assert!(s.take_notification().is_none());
        assert_eq!(s.status(), Status::Idle);
        assert_eq!(s.source(), Language::JavaScript.starter_template());
    }

    #[test]
    fn test_deploy_with_identity() {
        let store = Arc::new(MemorySessionStore::default());
        store.set_identity(sample_identity()).unwrap();
        let mut s = EditorSession::new(Language::Python, store);
        assert_eq!(s.request_deploy(), Ok(sample_identity()));
        assert_eq!(s.take_notification().map(|n| n.level), Some(NotificationLevel::Info));
    }

    #[test]
    fn test_download_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        s.edit_source("console.log(1)");
        let path = s.download_source(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("code.js"));
        assert_eq!(fs::read_to_string(path).unwrap(), "console.log(1)");
    }
}
