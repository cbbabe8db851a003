//! Execution engine: request/result types and the executor seam.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{config::Config, language::Language};

pub mod piston;

pub use piston::ExecutionClient;

/// Version sent for a language the runtime table does not know.
pub const LATEST_VERSION: &str = "latest";

/// A single submission. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    language: Language,
    source: String,
}

impl ExecutionRequest {
    pub fn new(language: Language, source: impl Into<String>) -> Self {
        Self { language, source: source.into() }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: Option<String>,
    pub succeeded: bool,
    pub exit_code: Option<i64>,
}

impl ExecutionResult {
    /// Builds a result, deriving `succeeded` from stderr.
    pub fn new(stdout: impl Into<String>, stderr: Option<String>, exit_code: Option<i64>) -> Self {
        let succeeded = stderr.as_deref().map_or(true, str::is_empty);
        Self { stdout: stdout.into(), stderr, succeeded, exit_code }
    }

    pub fn output_lines(&self) -> Vec<&str> {
        self.stdout.split('\n').collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Network failure or non-success HTTP status.
    #[error("{}", unavailable_message(.status, .message))]
    ServiceUnavailable { status: Option<u16>, message: String },

    /// The service answered with a body lacking `run.output`.
    #[error("Malformed response from execution service: {0}")]
    MalformedResponse(String),
}

fn unavailable_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API Error: {code}"),
        None => format!("Execution service unavailable: {message}"),
    }
}

/// Anything that can run an [`ExecutionRequest`].
#[async_trait]
pub trait Executor: Send + Sync {
    async fn submit(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutionError>;
}

/// Maps languages to the runtime versions requested from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVersions {
    versions: HashMap<Language, String>,
}

impl Default for RuntimeVersions {
    fn default() -> Self {
        let versions = [
            (Language::JavaScript, "18.15.0"),
            (Language::Python, "3.10.0"),
            (Language::Java, "15.0.2"),
            (Language::TypeScript, "5.0.3"),
            (Language::Cpp, "10.2.0"),
            (Language::Kotlin, "1.8.20"),
        ]
        .into_iter()
        .map(|(lang, v)| (lang, v.to_string()))
        .collect();
        Self { versions }
    }
}

impl RuntimeVersions {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self { versions: HashMap::new() }
    }

    /// Defaults overlaid with `RUNTIME_VERSION_<ID>` config entries.
    pub fn from_config(cfg: &Config) -> Self {
        let mut table = Self::default();
        for lang in Language::ALL {
            let key = format!("RUNTIME_VERSION_{}", lang.id().to_ascii_uppercase());
            if let Some(v) = cfg.get(&key).filter(|v| !v.trim().is_empty()) {
                table.versions.insert(lang, v.trim().to_string());
            }
        }
        table
    }

    #[cfg(test)]
    pub fn without(mut self, language: Language) -> Self {
        self.versions.remove(&language);
        self
    }

    pub fn version_for(&self, language: Language) -> &str {
        self.versions
            .get(&language)
            .map(String::as_str)
            .unwrap_or(LATEST_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_follows_stderr() {
        assert!(ExecutionResult::new("5\n", None, Some(0)).succeeded);
        assert!(ExecutionResult::new("5\n", Some(String::new()), Some(0)).succeeded);
        assert!(!ExecutionResult::new("", Some("boom".into()), Some(1)).succeeded);
    }

    #[test]
    fn test_output_lines() {
        let result = ExecutionResult::new("Sum: 8\nbye", None, None);
        assert_eq!(result.output_lines(), vec!["Sum: 8", "bye"]);
    }

    #[test]
    fn test_runtime_versions_defaults_and_fallback() {
        let table = RuntimeVersions::default();
        assert_eq!(table.version_for(Language::JavaScript), "18.15.0");
        assert_eq!(table.version_for(Language::Kotlin), "1.8.20");

        let table = table.without(Language::Python);
        assert_eq!(table.version_for(Language::Python), LATEST_VERSION);
    }

    #[test]
    fn test_runtime_versions_config_override() {
        let mut cfg = Config::from_file(std::path::Path::new("/nonexistent/.codepadrc"));
        cfg.set("RUNTIME_VERSION_JAVA", "21.0.0");
        let table = RuntimeVersions::from_config(&cfg);
        assert_eq!(table.version_for(Language::Java), "21.0.0");
        assert_eq!(table.version_for(Language::Python), "3.10.0");
    }

    #[test]
    fn test_service_unavailable_message() {
        let err = ExecutionError::ServiceUnavailable { status: Some(503), message: String::new() };
        assert_eq!(err.to_string(), "API Error: 503");
        let err = ExecutionError::ServiceUnavailable { status: None, message: "timed out".into() };
        assert_eq!(err.to_string(), "Execution service unavailable: timed out");
    }
}
