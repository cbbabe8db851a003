//! Reqwest-based client for the Piston code execution API.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header::{HeaderValue, CONTENT_TYPE}, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ExecutionError, ExecutionRequest, ExecutionResult, Executor, RuntimeVersions};
use crate::config::Config;

const DEFAULT_EXECUTION_API_URL: &str = "https://emkc.org/api/v2/piston/execute";

#[derive(Debug, Clone)]
pub struct ExecutionClient {
    http: Client,
    endpoint: String,
    versions: RuntimeVersions,
}

#[derive(Debug, Serialize)]
struct ExecutePayload<'a> {
    language: &'a str,
    version: &'a str,
    files: [SourceFile<'a>; 1],
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: Option<RunStage>,
}

#[derive(Debug, Deserialize)]
struct RunStage {
    output: Option<String>,
    stderr: Option<String>,
    code: Option<i64>,
}

impl ExecutionClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(60);
        let endpoint = cfg
            .get("EXECUTION_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXECUTION_API_URL.to_string());

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self { http, endpoint, versions: RuntimeVersions::from_config(cfg) })
    }

    #[cfg(test)]
    pub fn new(http: Client, endpoint: impl Into<String>, versions: RuntimeVersions) -> Self {
        Self { http, endpoint: endpoint.into(), versions }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Executor for ExecutionClient {
    async fn submit(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutionError> {
        let language = request.language();
        let version = self.versions.version_for(language);
        let payload = ExecutePayload {
            language: language.id(),
            version,
            files: [SourceFile { content: request.source() }],
        };
        debug!(language = language.id(), version, endpoint = %self.endpoint, "submitting source");

        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "execution request failed");
                ExecutionError::ServiceUnavailable {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "execution service returned an error status");
            return Err(ExecutionError::ServiceUnavailable {
                status: Some(status.as_u16()),
                message: text,
            });
        }

        let body = resp.text().await.map_err(|e| ExecutionError::ServiceUnavailable {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        parse_response(&body)
    }
}

/// Maps a response body onto an [`ExecutionResult`]; `run.output` is mandatory.
fn parse_response(body: &str) -> Result<ExecutionResult, ExecutionError> {
    let parsed: ExecuteResponse = serde_json::from_str(body)
        .map_err(|e| ExecutionError::MalformedResponse(e.to_string()))?;
    let run = parsed
        .run
        .ok_or_else(|| ExecutionError::MalformedResponse("missing `run`".into()))?;
    let output = run
        .output
        .ok_or_else(|| ExecutionError::MalformedResponse("missing `run.output`".into()))?;
    Ok(ExecutionResult::new(output, run.stderr, run.code))
}
