//! Judge Executor - Pipeline Orchestration
//!
//! **Responsibility:**
//! Coordinate the store, the execution engine and the evaluator to judge one
//! submission.
//!
//! **Architecture:**
//! 1. Validate the language before anything else runs
//! 2. Load test cases for the policy (run: visible only, submit: all)
//! 3. Execute cases strictly one after another, ascending id
//! 4. Stop at the first compile or runtime error (both policies) or at the
//!    first wrong answer (submit only)
//! 5. Aggregate evaluated cases into a verdict
//!
//! Nothing is persisted; the only side effects are oracle calls.
use crate::engine::{render_stdin, ExecutionOracle, ExecutionRequest, OracleError};
use crate::evaluator::{self, CaseStatus};
use crate::metrics;
use crate::store::{ProblemStore, StoreError};
use codejudge_common::types::{JudgeMode, Language, Verdict};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("No test cases found for problem {0}")]
    NoTestCases(i64),

    #[error("Execution failed: {0}")]
    ExecutionFailed(#[from] OracleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub struct Judge {
    store: Arc<dyn ProblemStore>,
    oracle: Arc<dyn ExecutionOracle>,
}

impl Judge {
    pub fn new(store: Arc<dyn ProblemStore>, oracle: Arc<dyn ExecutionOracle>) -> Self {
        Self { store, oracle }
    }

    /// Judge `code` against the stored cases of `problem_id` under `mode`.
    ///
    /// Compile and runtime errors are part of a normal verdict. Oracle and
    /// storage failures abort the whole submission.
    #[instrument(
        skip(self, code),
        fields(judge_id = %Uuid::new_v4(), code_bytes = code.len())
    )]
    pub async fn judge(
        &self,
        problem_id: i64,
        code: &str,
        language: &str,
        mode: JudgeMode,
    ) -> Result<Verdict, JudgeError> {
        let language = Language::parse(language)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.to_string()))?;

        let mode_label = mode.to_string();
        metrics::JUDGE_REQUESTS
            .with_label_values(&[mode_label.as_str()])
            .inc();

        let test_cases = self
            .store
            .list_test_cases(problem_id, mode.include_hidden())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load test cases");
                e
            })?;

        if test_cases.is_empty() {
            info!("No test cases to judge");
            return Err(JudgeError::NoTestCases(problem_id));
        }

        info!(cases = test_cases.len(), "Judging submission");

        let mut evaluated = Vec::with_capacity(test_cases.len());
        for (idx, test_case) in test_cases.iter().enumerate() {
            let stdin = render_stdin(&test_case.input);
            let output = self
                .oracle
                .execute(ExecutionRequest {
                    source_code: code,
                    language,
                    stdin: &stdin,
                })
                .await
                .map_err(|e| {
                    error!(case = idx + 1, test_id = test_case.id, error = %e, "Execution failed");
                    e
                })?;

            let case = evaluator::evaluate_case(test_case, &output);
            debug!(
                case = idx + 1,
                test_id = test_case.id,
                status = ?case.status,
                "Case evaluated"
            );

            let stop = case.status.is_error()
                || (mode.fail_fast() && case.status == CaseStatus::Failed);
            if case.status == CaseStatus::CompileError {
                // A compile failure is reported on its own
                evaluated.clear();
            }
            evaluated.push(case);

            if stop {
                if idx + 1 < test_cases.len() {
                    debug!(skipped = test_cases.len() - idx - 1, "Stopping early");
                }
                break;
            }
        }

        let verdict = evaluator::aggregate(evaluated);

        let status_label = verdict.status.to_string();
        metrics::VERDICTS
            .with_label_values(&[mode_label.as_str(), status_label.as_str()])
            .inc();
        info!(
            status = %verdict.status,
            evaluated = verdict.cases.len(),
            runtime = %verdict.runtime,
            "Judging completed"
        );

        Ok(verdict)
    }
}
