//! HTTP error mapping.
//!
//! Every failure ends here and becomes a JSON `{"error": ...}` body.
//! Infrastructure failures never leak internal detail to the client.

use crate::engine::OracleError;
use crate::executor::JudgeError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Required request fields absent or empty
    MissingFields(Vec<&'static str>),
    /// Malformed body or unsupported value
    BadRequest(String),
    NotFound(String),
    ExecutionFailed,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExecutionFailed | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::MissingFields(fields) => json!({
                "error": format!("Missing required fields: {}", fields.join(", ")),
                "missing": fields,
            }),
            ApiError::BadRequest(message) | ApiError::NotFound(message) => {
                json!({ "error": message })
            }
            ApiError::ExecutionFailed => json!({ "error": "Execution failed" }),
            ApiError::Internal => json!({ "error": "Internal server error" }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JudgeError> for ApiError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::UnsupportedLanguage(language) => {
                ApiError::BadRequest(format!("Unsupported language: {}", language))
            }
            JudgeError::NoTestCases(problem_id) => {
                ApiError::NotFound(format!("No test cases found for problem {}", problem_id))
            }
            JudgeError::ExecutionFailed(e) => e.into(),
            JudgeError::Storage(e) => e.into(),
        }
    }
}

impl From<OracleError> for ApiError {
    fn from(err: OracleError) -> Self {
        error!(error = %err, "Execution oracle failure");
        ApiError::ExecutionFailed
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Storage failure");
        ApiError::Internal
    }
}
