//! Execution Engine - Client for the External Execution Oracle
//!
//! **Core Responsibility:**
//! Send one (source, language, stdin) triple to the oracle and return its
//! raw result.
//!
//! **Critical Architectural Boundary:**
//! - Engine knows HOW to reach the oracle (HTTP, auth header, timeout)
//! - Engine does NOT evaluate correctness
//! - Engine does NOT retry; one failed call aborts the submission
//!
//! The oracle runs with `wait=true`, so a call blocks until the program has
//! finished. There is no polling.
use crate::metrics;
use async_trait::async_trait;
use codejudge_common::types::{Language, OracleResult};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Longest oracle error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("execution oracle unreachable: {0}")]
    Network(String),

    #[error("execution oracle timed out")]
    Timeout,

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

impl OracleError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else if err.is_decode() {
            OracleError::MalformedResponse(err.to_string())
        } else {
            OracleError::Network(err.to_string())
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OracleError::Network(_) => "network",
            OracleError::Timeout => "timeout",
            OracleError::MalformedResponse(_) => "malformed",
        }
    }
}

/// One program execution
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub source_code: &'a str,
    pub language: Language,
    pub stdin: &'a str,
}

#[async_trait]
pub trait ExecutionOracle: Send + Sync {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<OracleResult, OracleError>;
}

#[derive(Debug, Serialize)]
struct SubmissionBody<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
}

/// Oracle client speaking the Judge0 submissions API
pub struct Judge0Engine {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Judge0Engine {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth_token: Option<String>,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OracleError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn submissions_url(&self) -> String {
        format!("{}/submissions?wait=true&base64_encoded=false", self.base_url)
    }

    async fn send(&self, request: ExecutionRequest<'_>) -> Result<OracleResult, OracleError> {
        let body = SubmissionBody {
            source_code: request.source_code,
            language_id: request.language.oracle_id(),
            stdin: request.stdin,
        };

        let mut http_request = self.client.post(self.submissions_url()).json(&body);
        if let Some(token) = &self.auth_token {
            http_request = http_request.header("X-Auth-Token", token);
        }

        let response = http_request.send().await.map_err(OracleError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(OracleError::MalformedResponse(format!(
                "oracle returned {}: {}",
                status, snippet
            )));
        }

        response
            .json::<OracleResult>()
            .await
            .map_err(OracleError::from_reqwest)
    }
}

#[async_trait]
impl ExecutionOracle for Judge0Engine {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<OracleResult, OracleError> {
        let start = Instant::now();
        let result = self.send(request).await;
        let elapsed = start.elapsed();

        metrics::ORACLE_CALL_SECONDS.observe(elapsed.as_secs_f64());

        match &result {
            Ok(output) => {
                metrics::ORACLE_CALLS.with_label_values(&["ok"]).inc();
                debug!(
                    language = %request.language,
                    elapsed_ms = elapsed.as_millis() as u64,
                    oracle_status = ?output.status.as_ref().map(|s| s.id),
                    time = ?output.time,
                    "Oracle call completed"
                );
            }
            Err(e) => {
                metrics::ORACLE_CALLS.with_label_values(&[e.label()]).inc();
                warn!(
                    language = %request.language,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Oracle call failed"
                );
            }
        }

        result
    }
}

/// Render a stored test case input as program stdin.
///
/// Strings pass through verbatim, arrays become one space-separated line and
/// objects put each value on its own line in stored key order, so
/// `{"nums": [2, 7, 11, 15], "target": 9}` becomes `2 7 11 15\n9`.
pub fn render_stdin(input: &Value) -> String {
    match input {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => input.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_stdin)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(fields) => fields
            .values()
            .map(render_stdin)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
