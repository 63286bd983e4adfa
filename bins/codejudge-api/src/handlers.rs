//! HTTP route handlers for the judge API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use codejudge_common::types::{JudgeMode, Language, OracleResult, Problem, ProblemSummary, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::engine::ExecutionRequest;
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

/// Judge request as received. Every field is optional so that missing ones
/// are reported by name instead of by a generic deserialization error.
#[derive(Debug, Deserialize)]
pub struct JudgeBody {
    #[serde(rename = "problemId")]
    pub problem_id: Option<i64>,
    pub code: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunBody {
    pub code: Option<String>,
    pub language: Option<String>,
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleTestCase {
    pub id: i64,
    pub input: Value,
    pub expected_output: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCasesResponse {
    pub test_cases: Vec<VisibleTestCase>,
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected request body");
            Err(ApiError::BadRequest(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    }
}

/// Empty strings count as missing
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/judge/run - Judge against visible cases, every case evaluated
pub async fn judge_run(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<JudgeBody>, JsonRejection>,
) -> Result<Json<Verdict>, ApiError> {
    judge(state, payload, JudgeMode::Run).await
}

/// POST /api/judge/submit - Judge against all cases, stop at first failure
pub async fn judge_submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<JudgeBody>, JsonRejection>,
) -> Result<Json<Verdict>, ApiError> {
    judge(state, payload, JudgeMode::Submit).await
}

async fn judge(
    state: Arc<AppState>,
    payload: Result<Json<JudgeBody>, JsonRejection>,
    mode: JudgeMode,
) -> Result<Json<Verdict>, ApiError> {
    let body = parse_body(payload)?;
    let code = present(body.code);
    let language = present(body.language);

    let (problem_id, code, language) = match (body.problem_id, code, language) {
        (Some(problem_id), Some(code), Some(language)) => (problem_id, code, language),
        (problem_id, code, language) => {
            let mut missing = Vec::new();
            if problem_id.is_none() {
                missing.push("problemId");
            }
            if code.is_none() {
                missing.push("code");
            }
            if language.is_none() {
                missing.push("language");
            }
            return Err(ApiError::MissingFields(missing));
        }
    };

    let verdict = state.judge.judge(problem_id, &code, &language, mode).await?;
    Ok(Json(verdict))
}

/// POST /api/run - Execute code once against custom input
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunBody>, JsonRejection>,
) -> Result<Json<OracleResult>, ApiError> {
    let body = parse_body(payload)?;

    let (code, language) = match (present(body.code), present(body.language)) {
        (Some(code), Some(language)) => (code, language),
        (code, language) => {
            let mut missing = Vec::new();
            if code.is_none() {
                missing.push("code");
            }
            if language.is_none() {
                missing.push("language");
            }
            return Err(ApiError::MissingFields(missing));
        }
    };

    let language = Language::parse(&language)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported language: {}", language)))?;

    let stdin = body.input.unwrap_or_default();
    let result = state
        .oracle
        .execute(ExecutionRequest {
            source_code: &code,
            language,
            stdin: &stdin,
        })
        .await?;

    info!(language = %language, "Playground run completed");
    Ok(Json(result))
}

/// GET /api/problems - Problem list ordered by id
pub async fn list_problems(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProblemSummary>>, ApiError> {
    Ok(Json(state.store.list_problems().await?))
}

/// GET /api/problems/:id
pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Problem>, ApiError> {
    let id = parse_id(&id)?;
    match state.store.get_problem(id).await? {
        Some(problem) => Ok(Json(problem)),
        None => Err(ApiError::NotFound("Problem not found".to_string())),
    }
}

/// GET /api/problems/:id/testcases - Visible cases only
pub async fn list_visible_test_cases(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TestCasesResponse>, ApiError> {
    let id = parse_id(&id)?;
    let test_cases = state
        .store
        .list_test_cases(id, false)
        .await?
        .into_iter()
        .map(|c| VisibleTestCase {
            id: c.id,
            input: c.input,
            expected_output: c.expected_output,
        })
        .collect();

    Ok(Json(TestCasesResponse { test_cases }))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid problem id: {}", raw)))
}

/// GET /api/health - Liveness plus a database round-trip
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(now) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database": now.to_rfc3339(),
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            ApiError::Internal.into_response()
        }
    }
}

/// GET /metrics - Prometheus text format
pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            ApiError::Internal.into_response()
        }
    }
}
